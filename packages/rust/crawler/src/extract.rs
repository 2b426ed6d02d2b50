//! Paragraph text extraction.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Fragments must be strictly longer than this many characters to be kept.
/// Shorter ones are almost always navigation, captions or boilerplate.
pub const MIN_FRAGMENT_CHARS: usize = 80;

/// Elements whose text never counts as page content.
const IGNORED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Extract newline-separated paragraph text from an HTML page.
///
/// Script and style content is ignored, whitespace runs collapse to a single
/// space, and only fragments longer than [`MIN_FRAGMENT_CHARS`] are kept.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    doc.select(&PARAGRAPH_SEL)
        .map(|p| clean_text(&visible_text(p)))
        .filter(|text| text.chars().count() > MIN_FRAGMENT_CHARS)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse whitespace runs and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Concatenate the text nodes under `el`, skipping script/style subtrees.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| IGNORED_TAGS.contains(&e.name()))
        });

        if !hidden {
            out.push_str(text);
        }
    }

    out
}
