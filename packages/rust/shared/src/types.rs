//! Core domain types for a research-to-document run.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{AssignGenError, Result, ScrapeFailure};

/// Fixed section headings, in document order.
pub const SECTION_HEADINGS: [&str; 5] = [
    "Introduction to the Topic",
    "Core Concepts",
    "Applications",
    "Advantages and Challenges",
    "Future Scope",
];

// ---------------------------------------------------------------------------
// Query / RunId
// ---------------------------------------------------------------------------

/// A non-empty, trimmed topic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Validate and trim a raw topic.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AssignGenError::validation("topic must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SearchResult / ScrapedDocument / Corpus
// ---------------------------------------------------------------------------

/// A resolved candidate URL. Always well-formed http or https.
///
/// The href is kept exactly as discovered; the parsed [`Url`] is only used
/// for validation and fetching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    raw: String,
    url: Url,
}

impl SearchResult {
    /// Parse a raw href, accepting only absolute http(s) URLs.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let url = Url::parse(raw).ok()?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Some(Self {
                raw: raw.to_string(),
                url,
            }),
            _ => None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The href as discovered, minus surrounding whitespace.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Text extracted from one URL. `text` is empty when the fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedDocument {
    pub url: String,
    pub text: String,
    /// Set when the page could not be fetched; the run carries on regardless.
    pub failure: Option<ScrapeFailure>,
}

impl ScrapedDocument {
    pub fn ok(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            failure: None,
        }
    }

    pub fn failed(url: impl Into<String>, failure: ScrapeFailure) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            failure: Some(failure),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The capped, concatenated scraped text of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus(String);

impl Corpus {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Paragraphs on newline boundaries. An empty corpus has one empty paragraph.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.0.split('\n').collect()
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// One heading + body unit of the composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub text: String,
}

/// The five-section composition built once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The topic, verbatim.
    pub title: String,
    pub intro: String,
    pub sections: Vec<Section>,
    pub conclusion: String,
}

// ---------------------------------------------------------------------------
// RenderedDocument
// ---------------------------------------------------------------------------

/// Structural role of a rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Heading,
    Paragraph,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// A single (level, text, alignment) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    pub alignment: Alignment,
}

impl Block {
    pub fn title(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Title,
            text: text.into(),
            alignment: Alignment::Center,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            text: text.into(),
            alignment: Alignment::Left,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            alignment: Alignment::Left,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Ordered block sequence, one per output language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub blocks: Vec<Block>,
}

impl RenderedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Text of every block, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
