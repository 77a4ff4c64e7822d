/// Study-content data model
///
/// `StructuredContent` is the normalized output of the generation pipeline and the
/// contract that rendering and PDF export depend on. Field names are serialized
/// exactly as `briefAnswer`, `keyPoints`, `overview`, `flashcards`, `timeline`,
/// `didYouKnow` and `mindMap`. Optional sections are omitted entirely when absent.

use serde::{Deserialize, Serialize};

/// Normalized study content for one topic query.
///
/// Built once by the normalization pipeline (or the search-context fallback) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredContent {
    /// 2-3 sentence summary, never empty
    pub brief_answer: String,
    /// Key points in relevance order
    pub key_points: Vec<String>,
    pub overview: Vec<OverviewSection>,
    pub flashcards: Vec<Flashcard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_you_know: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mind_map: Option<MindMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewSection {
    pub subtopic: String,
    pub content: String,
}

impl OverviewSection {
    pub fn new(subtopic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subtopic: subtopic.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: String,
    pub title: String,
    pub description: String,
}

/// Concept graph. Connections are not checked against node ids; consumers skip
/// edges whose endpoints do not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    pub nodes: Vec<MindMapNode>,
    pub connections: Vec<MindMapConnection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapConnection {
    pub from: String,
    pub to: String,
}

impl MindMap {
    /// Connections whose endpoints both resolve to a node, paired with the node labels.
    pub fn resolved_connections(&self) -> Vec<(&str, &str)> {
        let label_of = |id: &str| {
            self.nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.label.as_str())
        };

        self.connections
            .iter()
            .filter_map(|c| Some((label_of(&c.from)?, label_of(&c.to)?)))
            .collect()
    }
}
