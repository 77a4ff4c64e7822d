/// Local persistence for the client role
///
/// One JSON document holds the theme, query history, bookmarks, collections and
/// study-planner data. The mutation rules live on `StoreDocument` so they can be
/// exercised without touching disk; `LocalStore` loads, applies and saves.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod local;

pub use local::LocalStore;

pub const MAX_HISTORY: usize = 50;
pub const MAX_BOOKMARKS: usize = 100;

pub const WEEK_BADGE: &str = "week";
pub const MONTH_BADGE: &str = "month";
const WEEK_STREAK: u32 = 7;
const MONTH_STREAK: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// A past query or a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub queries: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyGoal {
    pub topic: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyData {
    #[serde(default)]
    pub streak: u32,
    /// Serialized as YYYY-MM-DD
    #[serde(default)]
    pub last_study_date: Option<NaiveDate>,
    #[serde(default)]
    pub goals: Vec<StudyGoal>,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub history: Vec<SavedQuery>,
    #[serde(default)]
    pub bookmarks: Vec<SavedQuery>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub study: StudyData,
}

fn same_query(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl StoreDocument {
    /// Record a query at the front of history, replacing any case-insensitive duplicate.
    pub fn add_to_history(&mut self, query: &str, now: DateTime<Utc>) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.history.retain(|h| !same_query(&h.query, query));
        self.history.insert(
            0,
            SavedQuery {
                query: query.to_string(),
                timestamp: now,
            },
        );
        self.history.truncate(MAX_HISTORY);
    }

    pub fn is_bookmarked(&self, query: &str) -> bool {
        let query = query.trim();
        self.bookmarks.iter().any(|b| same_query(&b.query, query))
    }

    /// Add or remove a bookmark. Returns whether the query is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, query: &str, now: DateTime<Utc>) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        if let Some(idx) = self.bookmarks.iter().position(|b| same_query(&b.query, query)) {
            self.bookmarks.remove(idx);
            return false;
        }
        self.bookmarks.insert(
            0,
            SavedQuery {
                query: query.to_string(),
                timestamp: now,
            },
        );
        self.bookmarks.truncate(MAX_BOOKMARKS);
        true
    }

    pub fn create_collection(&mut self, name: &str, now: DateTime<Utc>) -> Collection {
        let collection = Collection {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            queries: Vec::new(),
            created_at: now,
        };
        self.collections.push(collection.clone());
        collection
    }

    /// Add a query to a collection. Returns false for unknown ids, blank queries and duplicates.
    pub fn add_to_collection(&mut self, collection_id: &str, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        match self.collections.iter_mut().find(|c| c.id == collection_id) {
            Some(collection) if !collection.queries.iter().any(|q| q == query) => {
                collection.queries.push(query.to_string());
                true
            }
            _ => false,
        }
    }

    /// Remove a query from a collection. Returns whether anything was removed.
    pub fn remove_from_collection(&mut self, collection_id: &str, query: &str) -> bool {
        let Some(collection) = self.collections.iter_mut().find(|c| c.id == collection_id) else {
            return false;
        };
        let before = collection.queries.len();
        collection.queries.retain(|q| q != query);
        collection.queries.len() != before
    }

    /// Count today's study session toward the streak and award badges.
    ///
    /// A second session on the same day changes nothing. A session the day after
    /// the last one extends the streak; any longer gap restarts it at 1.
    pub fn record_study_session(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        let study = &mut self.study;

        if study.last_study_date == Some(today) {
            return;
        }

        let yesterday = today.checked_sub_days(Days::new(1));
        study.streak = if study.last_study_date.is_some() && study.last_study_date == yesterday {
            study.streak + 1
        } else {
            1
        };
        study.last_study_date = Some(today);

        for (threshold, badge) in [(WEEK_STREAK, WEEK_BADGE), (MONTH_STREAK, MONTH_BADGE)] {
            if study.streak >= threshold && !study.badges.iter().any(|b| b == badge) {
                study.badges.push(badge.to_string());
            }
        }
    }

    /// Add an uncompleted goal unless one with the same topic exists.
    pub fn add_study_goal(&mut self, topic: &str) -> bool {
        let topic = topic.trim();
        if topic.is_empty() || self.study.goals.iter().any(|g| g.topic == topic) {
            return false;
        }
        self.study.goals.push(StudyGoal {
            topic: topic.to_string(),
            completed: false,
        });
        true
    }

    /// Flip a goal's completion flag. Returns the new state, or None for unknown topics.
    pub fn toggle_goal(&mut self, topic: &str) -> Option<bool> {
        let goal = self.study.goals.iter_mut().find(|g| g.topic == topic.trim())?;
        goal.completed = !goal.completed;
        Some(goal.completed)
    }
}
