//! Block-by-block translation with per-block fallback.
//!
//! A failed call never aborts the document: the block keeps its source text
//! and the failure is recorded in the [`TranslationReport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use assigngen_shared::{
    AssignGenError, Block, RenderedDocument, Result, TranslationConfig, TranslationFailure,
};

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// A translation backend. Each call is independent and may fail on its own.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `target`.
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> std::result::Result<String, TranslationFailure>;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Google translate_a/single
// ---------------------------------------------------------------------------

/// Client for the keyless `translate_a/single` endpoint (`client=gtx`).
pub struct GoogleTranslator {
    endpoint: Url,
    source_language: String,
    client: Client,
}

impl GoogleTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            AssignGenError::config(format!(
                "invalid translation endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssignGenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            source_language: config.source_language.clone(),
            client,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> std::result::Result<String, TranslationFailure> {
        // Text goes in the form body so long paragraphs don't hit URL limits.
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", target),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| TranslationFailure::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationFailure::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslationFailure::Decode(e.to_string()))?;

        decode_segments(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The payload looks like `[[["Hola","Hello",...], ["mundo","world",...]], null, "en", ...]`.
fn decode_segments(body: &serde_json::Value) -> std::result::Result<String, TranslationFailure> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslationFailure::Decode("missing segment list".into()))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslationFailure::Decode("empty translation".into()));
    }

    Ok(translated)
}

// ---------------------------------------------------------------------------
// Document translation
// ---------------------------------------------------------------------------

/// Outcome of translating one document.
#[derive(Debug, Clone)]
pub struct TranslationReport {
    /// The translated document; blank source blocks are omitted.
    pub document: RenderedDocument,
    /// Number of blocks the backend translated.
    pub translated: usize,
    /// Source block index and failure for every block that kept its source text.
    pub fallbacks: Vec<(usize, TranslationFailure)>,
}

/// Translate every non-blank block of `source`, in order.
///
/// Each output block keeps the kind and alignment of its source block.
/// `on_progress` is called with `(current, total)` before each call, where
/// `total` counts non-blank blocks.
#[instrument(skip_all, fields(translator = translator.name(), lang = target, blocks = source.len()))]
pub async fn translate_document<F>(
    source: &RenderedDocument,
    translator: &dyn Translator,
    target: &str,
    mut on_progress: F,
) -> TranslationReport
where
    F: FnMut(usize, usize),
{
    let total = source.blocks.iter().filter(|b| !b.is_blank()).count();
    let mut document = RenderedDocument::new();
    let mut translated = 0;
    let mut fallbacks = Vec::new();

    for (index, block) in source
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_blank())
    {
        on_progress(document.len() + 1, total);

        let text = match translator.translate(&block.text, target).await {
            Ok(text) => {
                debug!(index, "block translated");
                translated += 1;
                text
            }
            Err(failure) => {
                warn!(index, error = %failure, "translation failed, keeping source text");
                fallbacks.push((index, failure));
                block.text.clone()
            }
        };

        document.push(Block {
            kind: block.kind,
            text,
            alignment: block.alignment,
        });
    }

    info!(translated, fallbacks = fallbacks.len(), "document translated");

    TranslationReport {
        document,
        translated,
        fallbacks,
    }
}
