/// AI-response normalization layer
///
/// Turns arbitrary, possibly malformed provider text into `StructuredContent`:
/// 1. `parser::extract_json` strips fences and prose, repairs trailing commas, decodes.
/// 2. `fields::normalize` coerces every field against the schema, never failing.
/// 3. `is_degenerate` lets the caller swap in `fallback::context_fallback`.
///
/// Everything here is pure: no I/O, no clock, no randomness.

pub mod fallback;
pub mod fields;
pub mod keys;
pub mod parser;
pub mod sentences;

pub use fallback::{context_fallback, from_search_context, FallbackReason};
pub use fields::normalize;
pub use parser::{extract_json, ParseFailure};

use crate::content::StructuredContent;
use sentences::lacks_substance;

/// Parse and normalize raw provider output in one step.
pub fn structure_response(raw_text: &str) -> StructuredContent {
    normalize(extract_json(raw_text), raw_text)
}

/// Caller-level emptiness check.
///
/// Content is degenerate when the brief answer lacks substance and nothing else
/// adds to it: no key points, no flashcards, and no overview section beyond a
/// restatement of the brief answer.
pub fn is_degenerate(content: &StructuredContent) -> bool {
    let brief = content.brief_answer.trim();

    lacks_substance(brief)
        && content.key_points.is_empty()
        && content.flashcards.is_empty()
        && content.overview.iter().all(|section| {
            let body = section.content.trim();
            body.is_empty() || body == brief
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::OverviewSection;

    #[test]
    fn test_unusable_outputs_are_degenerate() {
        for raw in ["", "{}", "OK.", r#"{"briefAnswer": "Yes"}"#] {
            assert!(is_degenerate(&structure_response(raw)), "input: {raw:?}");
        }
    }

    #[test]
    fn test_short_but_structured_output_is_not_degenerate() {
        let content = structure_response(r#"{"briefAnswer": "Yes", "keyPoints": ["Because of gravity"]}"#);
        assert!(!is_degenerate(&content));
    }

    #[test]
    fn test_substantive_prose_is_not_degenerate() {
        let content = structure_response("Saturn has the most extensive ring system of any planet.");
        assert!(!is_degenerate(&content));
        assert_eq!(content.key_points.len(), 1);
    }

    #[test]
    fn test_distinct_overview_content_counts() {
        let content = StructuredContent {
            brief_answer: "Short".to_string(),
            key_points: vec![],
            overview: vec![OverviewSection::new("Details", "Something else entirely")],
            flashcards: vec![],
            timeline: None,
            did_you_know: None,
            mind_map: None,
        };
        assert!(!is_degenerate(&content));
    }

    #[test]
    fn test_context_fallback_is_never_degenerate() {
        assert!(!is_degenerate(&from_search_context("Nebulae", "")));
    }

    #[test]
    fn test_derived_fields_are_populated_when_text_has_substance() {
        let content = structure_response(
            r#"{"briefAnswer": "Honey never spoils when sealed. Archaeologists found edible honey in tombs.", "keyPoints": [], "overview": [], "flashcards": []}"#,
        );
        assert!(!content.key_points.is_empty());
        assert!(!content.overview.is_empty());
        assert!(!content.flashcards.is_empty());
    }
}
