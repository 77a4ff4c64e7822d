/// JSON-file backed store
///
/// Every operation loads the document, applies one mutation and writes it back
/// through a temporary file and rename. A missing, unreadable or corrupt file
/// reads as an empty document.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{Collection, SavedQuery, StoreDocument, StudyData, Theme};
use crate::errors::AppError;

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        LocalStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StoreDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreDocument::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Store unreadable; using defaults");
                return StoreDocument::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Store corrupt; using defaults");
            StoreDocument::default()
        })
    }

    pub fn save(&self, doc: &StoreDocument) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load, mutate, save.
    fn update<T>(&self, f: impl FnOnce(&mut StoreDocument) -> T) -> Result<T, AppError> {
        let mut doc = self.load();
        let out = f(&mut doc);
        self.save(&doc)?;
        Ok(out)
    }

    pub fn theme(&self) -> Theme {
        self.load().theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        self.update(|doc| doc.theme = theme)
    }

    pub fn history(&self) -> Vec<SavedQuery> {
        let mut history = self.load().history;
        history.truncate(super::MAX_HISTORY);
        history
    }

    pub fn add_to_history(&self, query: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        self.update(|doc| doc.add_to_history(query, now))
    }

    pub fn clear_history(&self) -> Result<(), AppError> {
        self.update(|doc| doc.history.clear())
    }

    pub fn bookmarks(&self) -> Vec<SavedQuery> {
        self.load().bookmarks
    }

    pub fn is_bookmarked(&self, query: &str) -> bool {
        self.load().is_bookmarked(query)
    }

    pub fn toggle_bookmark(&self, query: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        self.update(|doc| doc.toggle_bookmark(query, now))
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.load().collections
    }

    pub fn create_collection(&self, name: &str, now: DateTime<Utc>) -> Result<Collection, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Collection name cannot be empty"));
        }
        self.update(|doc| doc.create_collection(name, now))
    }

    pub fn add_to_collection(&self, collection_id: &str, query: &str) -> Result<bool, AppError> {
        self.update(|doc| doc.add_to_collection(collection_id, query))
    }

    pub fn remove_from_collection(&self, collection_id: &str, query: &str) -> Result<bool, AppError> {
        self.update(|doc| doc.remove_from_collection(collection_id, query))
    }

    pub fn study_data(&self) -> StudyData {
        self.load().study
    }

    pub fn record_study_session(&self, now: DateTime<Utc>) -> Result<StudyData, AppError> {
        self.update(|doc| {
            doc.record_study_session(now);
            doc.study.clone()
        })
    }

    pub fn add_study_goal(&self, topic: &str) -> Result<bool, AppError> {
        self.update(|doc| doc.add_study_goal(topic))
    }

    pub fn toggle_goal(&self, topic: &str) -> Result<Option<bool>, AppError> {
        self.update(|doc| doc.toggle_goal(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn store(dir: &TempDir) -> LocalStore {
        LocalStore::open(dir.path().join("nested").join("store.json"))
    }

    #[test]
    fn test_missing_file_reads_as_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.load(), StoreDocument::default());
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn test_corrupt_file_reads_as_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(&path);
        assert!(store.history().is_empty());

        store.add_to_history("Tides", now()).unwrap();
        assert_eq!(store.history()[0].query, "Tides");
    }

    #[test]
    fn test_changes_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let s = store(&dir);
            s.set_theme(Theme::Light).unwrap();
            s.add_to_history("Nebulae", now()).unwrap();
            assert!(s.toggle_bookmark("Nebulae", now()).unwrap());
            let c = s.create_collection("Space", now()).unwrap();
            assert!(s.add_to_collection(&c.id, "Nebulae").unwrap());
            s.record_study_session(now()).unwrap();
            assert!(s.add_study_goal("Comets").unwrap());
        }

        let reopened = store(&dir);
        assert_eq!(reopened.theme(), Theme::Light);
        assert_eq!(reopened.history().len(), 1);
        assert!(reopened.is_bookmarked("nebulae"));
        assert_eq!(reopened.collections()[0].queries, vec!["Nebulae"]);
        assert_eq!(reopened.study_data().streak, 1);
        assert_eq!(reopened.toggle_goal("Comets").unwrap(), Some(true));
    }

    #[test]
    fn test_clear_history() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.add_to_history("Tides", now()).unwrap();
        s.clear_history().unwrap();
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_blank_collection_name_rejected() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).create_collection("  ", now()).unwrap_err();
        assert!(err.is_validation());
    }
}
