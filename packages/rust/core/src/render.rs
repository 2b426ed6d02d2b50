//! Assignment → rendered block sequence, and block sequence → file bytes.
//!
//! [`build_document`] fixes the block order once. A [`DocumentRenderer`]
//! only decides how those blocks look on disk, so backends can be swapped
//! without touching the pipeline.

use std::sync::Arc;

use html_escape::encode_text;

use assigngen_shared::{
    Alignment, Assignment, Block, BlockKind, OutputFormat, RenderedDocument, Result,
};

/// Heading placed before the intro paragraph.
pub const INTRODUCTION_HEADING: &str = "Introduction";

/// Heading placed before the conclusion paragraph.
pub const CONCLUSION_HEADING: &str = "Conclusion";

/// Lay out an assignment as title, intro, five sections, conclusion.
pub fn build_document(assignment: &Assignment) -> RenderedDocument {
    let mut doc = RenderedDocument::new();

    doc.push(Block::title(&assignment.title));

    doc.push(Block::heading(INTRODUCTION_HEADING));
    doc.push(Block::paragraph(&assignment.intro));

    for section in &assignment.sections {
        doc.push(Block::heading(&section.heading));
        doc.push(Block::paragraph(&section.text));
    }

    doc.push(Block::heading(CONCLUSION_HEADING));
    doc.push(Block::paragraph(&assignment.conclusion));

    doc
}

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// Serializes a [`RenderedDocument`] into a file format.
pub trait DocumentRenderer: Send + Sync {
    /// File extension without the dot.
    fn extension(&self) -> &str;

    /// Render the blocks, in order, to file contents.
    fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>>;
}

/// Pick the renderer for a configured format.
pub fn renderer_for(format: OutputFormat) -> Arc<dyn DocumentRenderer> {
    match format {
        OutputFormat::Markdown => Arc::new(MarkdownRenderer),
        OutputFormat::Html => Arc::new(HtmlRenderer),
    }
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// CommonMark output. Centered blocks use inline HTML since Markdown has no
/// alignment syntax.
pub struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn extension(&self) -> &str {
        "md"
    }

    fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>> {
        let mut out = String::new();

        for block in &doc.blocks {
            let text = encode_text(&block.text);
            let line = match (block.kind, block.alignment) {
                (BlockKind::Title, Alignment::Center) => {
                    format!("<h1 align=\"center\">{text}</h1>")
                }
                (BlockKind::Title, Alignment::Left) => format!("# {text}"),
                (BlockKind::Heading, _) => format!("## {text}"),
                (BlockKind::Paragraph, Alignment::Center) => {
                    format!("<p align=\"center\">{text}</p>")
                }
                (BlockKind::Paragraph, Alignment::Left) => escape_markdown_start(&text),
            };
            out.push_str(&line);
            out.push_str("\n\n");
        }

        Ok(out.into_bytes())
    }
}

/// Stop scraped text from being read as a heading, quote, list item or
/// table row.
fn escape_markdown_start(text: &str) -> String {
    if matches!(
        text.chars().next(),
        Some('#' | '>' | '-' | '+' | '*' | '=' | '|')
    ) {
        return format!("\\{text}");
    }

    // `1.` or `1)` opens an ordered list; escape the delimiter.
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if (1..=9).contains(&digits) && matches!(text[digits..].chars().next(), Some('.' | ')')) {
        return format!("{}\\{}", &text[..digits], &text[digits..]);
    }

    text.to_string()
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Standalone HTML5 page. `dir="auto"` lets right-to-left translations lay
/// out correctly.
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn extension(&self) -> &str {
        "html"
    }

    fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>> {
        let title = doc
            .blocks
            .iter()
            .find(|b| b.kind == BlockKind::Title)
            .map(|b| encode_text(&b.text))
            .unwrap_or_default();

        let mut out = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{title}</title>\n</head>\n<body dir=\"auto\">\n"));

        for block in &doc.blocks {
            let tag = match block.kind {
                BlockKind::Title => "h1",
                BlockKind::Heading => "h2",
                BlockKind::Paragraph => "p",
            };
            let style = match block.alignment {
                Alignment::Center => " style=\"text-align:center\"",
                Alignment::Left => "",
            };
            out.push_str(&format!("<{tag}{style}>{}</{tag}>\n", encode_text(&block.text)));
        }

        out.push_str("</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assigngen_shared::{Corpus, Query};

    use crate::composer::compose;

    fn sample_document() -> RenderedDocument {
        let query = Query::new("Cloud <Computing>").unwrap();
        let corpus = Corpus::new("first\nsecond\nthird\nfourth\nfifth");
        build_document(&compose(&query, &corpus))
    }

    #[test]
    fn block_order_matches_layout() {
        let doc = sample_document();
        let texts: Vec<&str> = doc.texts().collect();

        assert_eq!(doc.len(), 15);
        assert_eq!(texts[0], "Cloud <Computing>");
        assert_eq!(texts[1], "Introduction");
        assert!(texts[2].starts_with("Cloud <Computing> is an important subject"));
        assert_eq!(texts[3], "Introduction to the Topic");
        assert_eq!(texts[4], "first");
        assert_eq!(texts[11], "Future Scope");
        assert_eq!(texts[12], "fifth");
        assert_eq!(texts[13], "Conclusion");
        assert!(texts[14].starts_with("In conclusion"));
    }

    #[test]
    fn only_title_is_centered() {
        let doc = sample_document();
        assert_eq!(doc.blocks[0].kind, BlockKind::Title);
        assert_eq!(doc.blocks[0].alignment, Alignment::Center);
        assert!(doc.blocks[1..].iter().all(|b| b.alignment == Alignment::Left));
    }

    #[test]
    fn markdown_output() {
        let bytes = MarkdownRenderer.render(&sample_document()).unwrap();
        let md = String::from_utf8(bytes).unwrap();

        assert!(md.starts_with("<h1 align=\"center\">Cloud &lt;Computing&gt;</h1>\n\n## Introduction\n\n"));
        assert!(md.contains("## Core Concepts\n\nsecond\n\n"));
        assert!(md.ends_with("helps in future advancements.\n\n"));
    }

    #[test]
    fn markdown_escapes_block_markers_in_paragraphs() {
        let mut doc = RenderedDocument::new();
        doc.push(Block::paragraph("# not a heading"));
        let md = String::from_utf8(MarkdownRenderer.render(&doc).unwrap()).unwrap();
        assert_eq!(md, "\\# not a heading\n\n");
    }

    #[test]
    fn markdown_escapes_markup_in_headings_and_paragraphs() {
        let mut doc = RenderedDocument::new();
        doc.push(Block::heading("The <b> tag"));
        doc.push(Block::paragraph(
            "Use the <script> element to embed code; a <b> tag makes text bold.",
        ));
        let md = String::from_utf8(MarkdownRenderer.render(&doc).unwrap()).unwrap();

        assert_eq!(
            md,
            "## The &lt;b&gt; tag\n\n\
             Use the &lt;script&gt; element to embed code; a &lt;b&gt; tag makes text bold.\n\n"
        );
        assert!(!md.contains('<'));
    }

    #[test]
    fn markdown_escapes_ordered_lists_and_tables() {
        let mut doc = RenderedDocument::new();
        doc.push(Block::paragraph("1. First step"));
        doc.push(Block::paragraph("42) Answer"));
        doc.push(Block::paragraph("| a | b |"));
        doc.push(Block::paragraph("2024 was a year."));
        let md = String::from_utf8(MarkdownRenderer.render(&doc).unwrap()).unwrap();

        assert_eq!(
            md,
            "1\\. First step\n\n42\\) Answer\n\n\\| a | b |\n\n2024 was a year.\n\n"
        );
    }

    #[test]
    fn html_output_is_escaped_and_centered() {
        let bytes = HtmlRenderer.render(&sample_document()).unwrap();
        let html = String::from_utf8(bytes).unwrap();

        assert!(html.contains("<title>Cloud &lt;Computing&gt;</title>"));
        assert!(html.contains("<h1 style=\"text-align:center\">Cloud &lt;Computing&gt;</h1>"));
        assert!(html.contains("<h2>Applications</h2>\n<p>third</p>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn renderer_for_format() {
        assert_eq!(renderer_for(OutputFormat::Markdown).extension(), "md");
        assert_eq!(renderer_for(OutputFormat::Html).extension(), "html");
    }
}
