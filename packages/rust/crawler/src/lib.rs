//! Page fetching and paragraph extraction.
//!
//! This crate provides:
//! - [`Scraper`]: fetches resolved URLs one at a time, isolating failures per URL
//! - [`extract_text`]: paragraph text extraction with the short-fragment filter

pub mod engine;
pub mod extract;

pub use engine::Scraper;
pub use extract::{MIN_FRAGMENT_CHARS, clean_text, extract_text};
