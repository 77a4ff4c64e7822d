/// Context-only fallback: study content built straight from search results.
///
/// Used when no provider is configured, every provider failed, or the AI result
/// was degenerate. Populates no optional sections.

use std::sync::OnceLock;

use regex::Regex;

use crate::content::{Flashcard, OverviewSection, StructuredContent};
use super::sentences::{ordinal_stem, MAX_DERIVED_CARDS, MAX_DERIVED_POINTS};

pub const SEARCH_RESULTS_LABEL: &str = "Search Results";
pub const NO_RESULTS_MESSAGE: &str = "No results found. Try a different search query.";

const MAX_SNIPPETS: usize = 6;

fn ordinal_prefix_regex() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| Regex::new(r"^\d+[.)]\s*").expect("ordinal pattern is valid"))
}

/// Why the search context stood in for AI output. Only changes the brief answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackReason {
    #[default]
    NoProviderConfigured,
    ProvidersFailed,
    DegenerateOutput,
}

impl FallbackReason {
    fn hint(self) -> &'static str {
        match self {
            FallbackReason::NoProviderConfigured => {
                "For richer AI-generated responses, configure a Groq or Hugging Face API key."
            }
            FallbackReason::ProvidersFailed => {
                "AI generation is unavailable right now; try again shortly for a fuller answer."
            }
            FallbackReason::DegenerateOutput => {
                "The AI response for this topic was too thin to use, so these notes come from the sources below."
            }
        }
    }
}

/// Build deterministic study content from the formatted search context.
///
/// Worded for the no-provider case; see [`context_fallback`] for the others.
pub fn from_search_context(topic: &str, context: &str) -> StructuredContent {
    context_fallback(topic, context, FallbackReason::default())
}

pub fn context_fallback(topic: &str, context: &str, reason: FallbackReason) -> StructuredContent {
    let snippets = context_snippets(context);

    let brief_answer = format!(
        "Here's what we found about \"{}\" from web search. {}",
        topic.trim(),
        reason.hint()
    );

    let overview_content = if snippets.is_empty() {
        NO_RESULTS_MESSAGE.to_string()
    } else {
        snippets.join("\n\n")
    };

    StructuredContent {
        brief_answer,
        key_points: snippets.iter().take(MAX_DERIVED_POINTS).cloned().collect(),
        overview: vec![OverviewSection::new(SEARCH_RESULTS_LABEL, overview_content)],
        flashcards: snippets
            .iter()
            .take(MAX_DERIVED_CARDS)
            .enumerate()
            .map(|(i, snippet)| Flashcard::new(ordinal_stem(i), snippet.clone()))
            .collect(),
        timeline: None,
        did_you_know: None,
        mind_map: None,
    }
}

/// First non-empty line of each blank-line-separated entry, ordinal prefix stripped.
fn context_snippets(context: &str) -> Vec<String> {
    let mut snippets = Vec::new();
    let mut in_entry = false;

    for line in context.lines() {
        let line = line.trim();
        if line.is_empty() {
            in_entry = false;
            continue;
        }
        if in_entry {
            continue;
        }
        in_entry = true;

        let snippet = ordinal_prefix_regex().replace(line, "").trim().to_string();
        if !snippet.is_empty() {
            snippets.push(snippet);
        }
        if snippets.len() == MAX_SNIPPETS {
            break;
        }
    }

    snippets
}
