/// Schema mapping table: candidate keys per field, checked in priority order.
///
/// The first entry of each list is the canonical key. Models drift between
/// camelCase, snake_case and plain-English names, so every field accepts a short
/// list of observed synonyms.

pub const BRIEF_ANSWER: &[&str] = &["briefAnswer", "brief_answer", "summary", "answer"];
pub const KEY_POINTS: &[&str] = &["keyPoints", "key_points", "keypoints"];
pub const OVERVIEW: &[&str] = &["overview", "sections"];
pub const FLASHCARDS: &[&str] = &["flashcards", "flash_cards", "cards"];
pub const TIMELINE: &[&str] = &["timeline"];
pub const DID_YOU_KNOW: &[&str] = &["didYouKnow", "did_you_know", "funFacts", "fun_facts"];
pub const MIND_MAP: &[&str] = &["mindMap", "mind_map"];

pub const SUBTOPIC: &[&str] = &["subtopic", "title", "section", "name"];
pub const CONTENT: &[&str] = &["content", "description", "text", "body"];

pub const FRONT: &[&str] = &["front", "question", "term"];
pub const BACK: &[&str] = &["back", "answer", "definition"];

pub const DATE: &[&str] = &["date", "year"];
pub const TITLE: &[&str] = &["title", "event"];
pub const DESCRIPTION: &[&str] = &["description", "details", "detail"];

pub const NODES: &[&str] = &["nodes"];
pub const CONNECTIONS: &[&str] = &["connections", "edges", "links"];
pub const NODE_ID: &[&str] = &["id"];
pub const NODE_LABEL: &[&str] = &["label", "name", "text"];
pub const EDGE_FROM: &[&str] = &["from", "source"];
pub const EDGE_TO: &[&str] = &["to", "target"];
