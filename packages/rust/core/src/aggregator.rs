//! Scraped text → single capped corpus.

use tracing::debug;

use assigngen_shared::{Corpus, ScrapedDocument};

/// Upper bound on corpus length, in characters.
pub const MAX_CORPUS_CHARS: usize = 20_000;

/// Join document texts in resolver order and keep the first [`MAX_CORPUS_CHARS`].
///
/// Documents with no text (failed or contentless pages) contribute nothing,
/// not even a separator.
pub fn aggregate(documents: &[ScrapedDocument]) -> Corpus {
    let joined = documents
        .iter()
        .filter(|d| !d.is_empty())
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let capped = truncate_chars(&joined, MAX_CORPUS_CHARS);
    debug!(
        documents = documents.len(),
        joined_chars = joined.chars().count(),
        kept_chars = capped.chars().count(),
        "corpus aggregated"
    );

    Corpus::new(capped)
}

/// Longest prefix of `s` with at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
