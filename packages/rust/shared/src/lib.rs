//! Shared types, error model, and configuration for assigngen.
//!
//! This crate is the foundation depended on by all other assigngen crates.
//! It provides:
//! - [`AssignGenError`]: the pipeline-fatal error type, plus the stage-local
//!   [`ScrapeFailure`] and [`TranslationFailure`]
//! - Domain types ([`Query`], [`SearchResult`], [`Corpus`], [`Assignment`], [`RenderedDocument`])
//! - Configuration ([`AppConfig`] and config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BROWSER_USER_AGENT, DefaultsConfig, OutputFormat, ScrapeConfig, SearchConfig,
    TranslationConfig, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from,
};
pub use error::{AssignGenError, Result, ScrapeFailure, TranslationFailure};
pub use types::{
    Alignment, Assignment, Block, BlockKind, Corpus, Query, RenderedDocument, RunId,
    SECTION_HEADINGS, ScrapedDocument, SearchResult, Section,
};
