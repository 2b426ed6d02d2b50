//! Core pipeline for assigngen.
//!
//! Turns scraped pages into a composed assignment, renders it, translates
//! it, and writes the results. [`Orchestrator`] runs the whole sequence on a
//! background task and publishes its [`PipelineState`].

pub mod aggregator;
pub mod composer;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod state;
pub mod translate;

pub use aggregator::{MAX_CORPUS_CHARS, aggregate};
pub use composer::compose;
pub use output::{MANIFEST_FILE, PersistedFile, RunManifest, URL_INDEX_FILE};
pub use pipeline::{Orchestrator, PipelineConfig, RunSummary};
pub use render::{DocumentRenderer, HtmlRenderer, MarkdownRenderer, build_document, renderer_for};
pub use state::{InvalidTransition, PipelineState, Stage};
pub use translate::{GoogleTranslator, TranslationReport, Translator, translate_document};
