/// Field normalizer: coerces a decoded candidate object into `StructuredContent`.
///
/// Every field is defaulted independently; a malformed field never aborts the rest.
/// `normalize` has no error path.

use serde_json::{Map, Value};

use super::keys;
use super::parser::ParseFailure;
use super::sentences::{
    derived_content, excerpt, PLACEHOLDER_ANSWER, RAW_EXCERPT_CHARS, UNPARSEABLE_ANSWER,
};
use crate::content::{
    Flashcard, MindMap, MindMapConnection, MindMapNode, OverviewSection, StructuredContent,
    TimelineEntry,
};

/// Subtopic used for overview entries that carry content but no heading.
pub const DEFAULT_SUBTOPIC: &str = "Section";

/// Label for the overview entry synthesized from the brief answer.
pub const DEFAULT_OVERVIEW_LABEL: &str = "Overview";

/// Normalize a parse result into study content.
///
/// `raw_text` is the original provider output, used when the brief answer is
/// missing and as the whole source when decoding failed.
pub fn normalize(parsed: Result<Map<String, Value>, ParseFailure>, raw_text: &str) -> StructuredContent {
    match parsed {
        Ok(object) => normalize_object(&object, raw_text),
        Err(failure) => {
            tracing::debug!(reason = %failure.reason, "Deriving content from unparseable AI output");
            let text = excerpt(&failure.raw, RAW_EXCERPT_CHARS);
            if text.is_empty() {
                derived_content(UNPARSEABLE_ANSWER)
            } else {
                derived_content(&text)
            }
        }
    }
}

fn normalize_object(object: &Map<String, Value>, raw_text: &str) -> StructuredContent {
    let brief_answer = text_field(object, keys::BRIEF_ANSWER)
        .or_else(|| Some(excerpt(raw_text, RAW_EXCERPT_CHARS)).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| PLACEHOLDER_ANSWER.to_string());

    let key_points = string_list(object, keys::KEY_POINTS);
    let overview = overview_sections(object);
    let flashcards = flashcards(object);

    if key_points.is_empty() && overview.is_empty() && flashcards.is_empty() {
        tracing::debug!("AI output had no key points, overview or flashcards; deriving from brief answer");
        return derived_content(&brief_answer);
    }

    let overview = if overview.is_empty() {
        vec![OverviewSection::new(DEFAULT_OVERVIEW_LABEL, brief_answer.clone())]
    } else {
        overview
    };

    let did_you_know = Some(string_list(object, keys::DID_YOU_KNOW)).filter(|facts| !facts.is_empty());

    StructuredContent {
        brief_answer,
        key_points,
        overview,
        flashcards,
        timeline: timeline(object),
        did_you_know,
        mind_map: mind_map(object),
    }
}

fn overview_sections(object: &Map<String, Value>) -> Vec<OverviewSection> {
    object_entries(object, keys::OVERVIEW)
        .filter_map(|entry| {
            let subtopic = text_field(entry, keys::SUBTOPIC);
            let content = text_field(entry, keys::CONTENT);
            if subtopic.is_none() && content.is_none() {
                return None;
            }

            let subtopic = subtopic.unwrap_or_else(|| DEFAULT_SUBTOPIC.to_string());
            let content = content.unwrap_or_else(|| subtopic.clone());
            Some(OverviewSection { subtopic, content })
        })
        .collect()
}

fn flashcards(object: &Map<String, Value>) -> Vec<Flashcard> {
    object_entries(object, keys::FLASHCARDS)
        .filter_map(|entry| {
            let front = text_field(entry, keys::FRONT);
            let back = text_field(entry, keys::BACK);
            let front = front.or_else(|| back.clone())?;
            let back = back.unwrap_or_else(|| front.clone());
            Some(Flashcard { front, back })
        })
        .collect()
}

fn timeline(object: &Map<String, Value>) -> Option<Vec<TimelineEntry>> {
    let entries: Vec<TimelineEntry> = object_entries(object, keys::TIMELINE)
        .map(|entry| TimelineEntry {
            date: text_field(entry, keys::DATE).unwrap_or_default(),
            title: text_field(entry, keys::TITLE).unwrap_or_default(),
            description: text_field(entry, keys::DESCRIPTION).unwrap_or_default(),
        })
        .filter(|t| !t.date.is_empty() || !t.title.is_empty())
        .collect();

    Some(entries).filter(|e| !e.is_empty())
}

fn mind_map(object: &Map<String, Value>) -> Option<MindMap> {
    let map = keys::MIND_MAP
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object))?;

    let nodes: Vec<MindMapNode> = object_entries(map, keys::NODES)
        .map(|n| MindMapNode {
            id: text_field(n, keys::NODE_ID).unwrap_or_default(),
            label: text_field(n, keys::NODE_LABEL).unwrap_or_default(),
        })
        .filter(|n| !n.id.is_empty() || !n.label.is_empty())
        .collect();

    if nodes.is_empty() {
        return None;
    }

    let connections = object_entries(map, keys::CONNECTIONS)
        .filter_map(|c| {
            Some(MindMapConnection {
                from: text_field(c, keys::EDGE_FROM)?,
                to: text_field(c, keys::EDGE_TO)?,
            })
        })
        .collect();

    Some(MindMap { nodes, connections })
}

/// First candidate key holding a non-empty scalar, rendered as text.
///
/// Numbers and booleans are accepted so `"date": 1969` survives.
fn text_field(object: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| object.get(*key).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// First candidate key holding an array.
fn array_field<'a>(object: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Vec<Value>> {
    candidates
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
}

/// String entries of the first matching array, trimmed, empties dropped.
fn string_list(object: &Map<String, Value>, candidates: &[&str]) -> Vec<String> {
    array_field(object, candidates)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Mapping-like entries of the first matching array; other entry types are skipped.
fn object_entries<'a>(
    object: &'a Map<String, Value>,
    candidates: &[&str],
) -> impl Iterator<Item = &'a Map<String, Value>> {
    array_field(object, candidates)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
