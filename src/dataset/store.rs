//! Session-scoped dataset storage

use super::Dataset;
use crate::error::{PipelineError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key under which a client's dataset is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds at most one dataset per session.
///
/// Readers get an `Arc` snapshot; a later upload swaps the slot and never
/// touches a dataset a running request already holds.
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: RwLock<HashMap<SessionId, Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a dataset, replacing the session's previous one
    pub fn put(&self, session: SessionId, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.datasets.write().insert(session, Arc::clone(&dataset));
        dataset
    }

    pub fn get(&self, session: &SessionId) -> Result<Arc<Dataset>> {
        self.datasets
            .read()
            .get(session)
            .cloned()
            .ok_or(PipelineError::NoDataset)
    }

    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(rows: usize) -> Dataset {
        let values: Vec<i64> = (0..rows as i64).collect();
        Dataset::new(df!("x" => values).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_session() {
        let store = DatasetStore::new();
        let err = store.get(&SessionId::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NoDataset));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = DatasetStore::new();
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        store.put(a.clone(), dataset(3));
        store.put(b.clone(), dataset(5));

        assert_eq!(store.get(&a).unwrap().n_rows(), 3);
        assert_eq!(store.get(&b).unwrap().n_rows(), 5);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upload_does_not_affect_held_snapshot() {
        let store = DatasetStore::new();
        let session = SessionId::default();
        store.put(session.clone(), dataset(3));

        let snapshot = store.get(&session).unwrap();
        store.put(session.clone(), dataset(7));

        assert_eq!(snapshot.n_rows(), 3);
        assert_eq!(store.get(&session).unwrap().n_rows(), 7);
    }

    #[test]
    fn test_default_session() {
        assert_eq!(SessionId::default().as_str(), "default");
        assert_eq!(SessionId::new("abc").to_string(), "abc");
    }
}
