//! Corpus → five-section assignment.
//!
//! Sections are positional slices of the corpus paragraphs. With
//! `chunk = max(1, paragraphs / 5)`, section `i` takes paragraphs
//! `[i * chunk, (i + 1) * chunk)`. Paragraphs past `5 * chunk` are not used.

use tracing::debug;

use assigngen_shared::{Assignment, Corpus, Query, SECTION_HEADINGS, Section};

/// Build the assignment for `query` from `corpus`.
pub fn compose(query: &Query, corpus: &Corpus) -> Assignment {
    let paragraphs = corpus.paragraphs();
    let chunk = (paragraphs.len() / SECTION_HEADINGS.len()).max(1);

    let sections = SECTION_HEADINGS
        .iter()
        .enumerate()
        .map(|(i, heading)| Section {
            heading: (*heading).to_string(),
            text: paragraphs
                .iter()
                .skip(i * chunk)
                .take(chunk)
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect();

    debug!(
        paragraphs = paragraphs.len(),
        chunk,
        unused = paragraphs.len().saturating_sub(chunk * SECTION_HEADINGS.len()),
        "assignment composed"
    );

    Assignment {
        title: query.as_str().to_string(),
        intro: intro_text(query.as_str()),
        sections,
        conclusion: conclusion_text(query.as_str()),
    }
}

pub fn intro_text(topic: &str) -> String {
    format!(
        "{topic} is an important subject that plays a vital role in modern society. \
         This assignment explores its major aspects and applications."
    )
}

pub fn conclusion_text(topic: &str) -> String {
    format!(
        "In conclusion, {topic} continues to grow in importance. \
         Understanding its concepts and applications helps in future advancements."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_of(n: usize) -> Corpus {
        Corpus::new(
            (0..n)
                .map(|i| format!("p{i}"))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn query() -> Query {
        Query::new("Renewable Energy").unwrap()
    }

    #[test]
    fn eleven_paragraphs_drop_the_last() {
        let assignment = compose(&query(), &corpus_of(11));
        let texts: Vec<&str> = assignment.sections.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(texts, vec!["p0 p1", "p2 p3", "p4 p5", "p6 p7", "p8 p9"]);
        assert!(!texts.iter().any(|t| t.contains("p10")));
    }

    #[test]
    fn headings_are_fixed_and_ordered() {
        let assignment = compose(&query(), &corpus_of(7));
        let headings: Vec<&str> = assignment
            .sections
            .iter()
            .map(|s| s.heading.as_str())
            .collect();
        assert_eq!(headings, SECTION_HEADINGS.to_vec());
    }

    #[test]
    fn empty_corpus_yields_five_empty_sections() {
        let assignment = compose(&query(), &Corpus::default());
        assert_eq!(assignment.sections.len(), 5);
        assert!(assignment.sections.iter().all(|s| s.text.is_empty()));
    }

    #[test]
    fn fewer_than_five_paragraphs_fill_leading_sections() {
        let assignment = compose(&query(), &corpus_of(3));
        let texts: Vec<&str> = assignment.sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["p0", "p1", "p2", "", ""]);
    }

    #[test]
    fn exact_multiple_uses_every_paragraph() {
        let assignment = compose(&query(), &corpus_of(15));
        assert_eq!(assignment.sections[0].text, "p0 p1 p2");
        assert_eq!(assignment.sections[4].text, "p12 p13 p14");
    }

    #[test]
    fn templates_use_topic_verbatim() {
        let assignment = compose(&query(), &corpus_of(5));
        assert_eq!(assignment.title, "Renewable Energy");
        assert!(assignment.intro.starts_with("Renewable Energy is an important subject"));
        assert!(assignment.conclusion.starts_with("In conclusion, Renewable Energy continues"));
        assert!(!assignment.intro.contains("p0"));
    }
}
