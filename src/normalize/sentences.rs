/// Sentence-splitting rule shared by every fallback tier.
///
/// One threshold governs both content derivation and the degenerate-content check:
/// a sentence counts only when it is strictly longer than `MIN_SENTENCE_CHARS`.

use crate::content::{Flashcard, OverviewSection, StructuredContent};

pub const MIN_SENTENCE_CHARS: usize = 15;

/// Key points derived from free text are capped to this many sentences.
pub const MAX_DERIVED_POINTS: usize = 5;

/// Flashcards derived from free text are capped to this many sentences.
pub const MAX_DERIVED_CARDS: usize = 4;

/// Raw-text prefix used as a brief answer when no usable answer exists.
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Brief answer used when the provider produced no usable text at all.
pub const PLACEHOLDER_ANSWER: &str = "Information retrieved.";

/// Brief answer used when the provider output was empty and could not be decoded.
pub const UNPARSEABLE_ANSWER: &str = "Could not parse AI response.";

/// Overview label for sections synthesized from the brief answer.
pub const SUMMARY_LABEL: &str = "Summary";

/// Split on sentence-terminating punctuation and keep sentences above the threshold.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(|c| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

/// True for placeholder answers and text too short to hold a single sentence.
pub fn lacks_substance(text: &str) -> bool {
    let text = text.trim();
    text.chars().count() <= MIN_SENTENCE_CHARS
        || text == PLACEHOLDER_ANSWER
        || text == UNPARSEABLE_ANSWER
}

/// Up to `MAX_DERIVED_POINTS` sentences from `text`.
///
/// Substantive text without any qualifying sentence yields itself as the only point.
pub fn derive_points(text: &str) -> Vec<String> {
    if lacks_substance(text) {
        return Vec::new();
    }

    let mut points = split_sentences(text);
    points.truncate(MAX_DERIVED_POINTS);
    if points.is_empty() {
        points.push(text.trim().to_string());
    }
    points
}

/// Ordinal question stem for synthesized flashcards (1-based).
pub fn ordinal_stem(index: usize) -> String {
    format!("Key point {}", index + 1)
}

/// First `max_chars` characters of `text`, trimmed.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect::<String>().trim().to_string()
}

/// Build a complete result purely from sentence-splitting `text`.
pub fn derived_content(text: &str) -> StructuredContent {
    let text = text.trim();
    let brief_answer = if text.is_empty() {
        PLACEHOLDER_ANSWER.to_string()
    } else {
        text.to_string()
    };

    let key_points = derive_points(&brief_answer);
    let flashcards = key_points
        .iter()
        .take(MAX_DERIVED_CARDS)
        .enumerate()
        .map(|(i, point)| Flashcard::new(ordinal_stem(i), point.clone()))
        .collect();

    StructuredContent {
        overview: vec![OverviewSection::new(SUMMARY_LABEL, brief_answer.clone())],
        brief_answer,
        key_points,
        flashcards,
        timeline: None,
        did_you_know: None,
        mind_map: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_applies_threshold() {
        let text = "Short one. This sentence is long enough to keep! Tiny? Another qualifying sentence here.";
        assert_eq!(
            split_sentences(text),
            vec![
                "This sentence is long enough to keep".to_string(),
                "Another qualifying sentence here".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_sentences_threshold_is_strict() {
        // exactly 15 characters is not enough
        assert!(split_sentences("abcdefghijklmno.").is_empty());
        assert_eq!(split_sentences("abcdefghijklmnop."), vec!["abcdefghijklmnop".to_string()]);
    }

    #[test]
    fn test_lacks_substance() {
        assert!(lacks_substance(""));
        assert!(lacks_substance("   OK.   "));
        assert!(lacks_substance(PLACEHOLDER_ANSWER));
        assert!(lacks_substance(UNPARSEABLE_ANSWER));
        assert!(!lacks_substance("Nebulae are interstellar clouds."));
    }

    #[test]
    fn test_derive_points_caps_and_falls_back_to_whole_text() {
        let many = "First sentence is long enough. Second sentence is long enough. \
                    Third sentence is long enough. Fourth sentence is long enough. \
                    Fifth sentence is long enough. Sixth sentence is long enough.";
        assert_eq!(derive_points(many).len(), MAX_DERIVED_POINTS);

        let choppy = "Yes. No. Maybe so. Sure thing.";
        assert_eq!(derive_points(choppy), vec![choppy.to_string()]);

        assert!(derive_points("Too short.").is_empty());
    }

    #[test]
    fn test_excerpt_is_char_safe() {
        let text = "é".repeat(600);
        let cut = excerpt(&text, RAW_EXCERPT_CHARS);
        assert_eq!(cut.chars().count(), RAW_EXCERPT_CHARS);
    }

    #[test]
    fn test_derived_content_shape() {
        let content = derived_content("Stars are born inside nebulae. Gravity pulls the gas together.");
        assert_eq!(content.key_points.len(), 2);
        assert_eq!(content.flashcards.len(), 2);
        assert_eq!(content.flashcards[0].front, "Key point 1");
        assert_eq!(content.flashcards[0].back, "Stars are born inside nebulae");
        assert_eq!(content.overview, vec![OverviewSection::new(SUMMARY_LABEL, content.brief_answer.clone())]);
        assert!(content.timeline.is_none());
    }

    #[test]
    fn test_derived_content_empty_text_uses_placeholder() {
        let content = derived_content("   ");
        assert_eq!(content.brief_answer, PLACEHOLDER_ANSWER);
        assert!(content.key_points.is_empty());
        assert!(content.flashcards.is_empty());
    }
}
