//! Durable storage for per-match undo history.

use std::{fmt, io::ErrorKind, path::PathBuf, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::fs;
use uuid::Uuid;

use crate::{
    dao::storage::{StorageError, StorageResult},
    scoring::ScoreSnapshot,
    state::tournament::GameFamily,
};

/// Key of a persisted history: the match id scoped by sport family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    /// Family of the match.
    pub family: GameFamily,
    /// Match the history belongs to.
    pub match_id: Uuid,
}

impl HistoryKey {
    /// Build the key for `match_id` scored as `family`.
    pub fn new(family: GameFamily, match_id: Uuid) -> Self {
        Self { family, match_id }
    }

    fn file_name(&self) -> String {
        format!("{}-{}.json", self.family.key(), self.match_id)
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family.key(), self.match_id)
    }
}

/// Keyed storage for undo history, oldest snapshot first.
pub trait HistoryStore: Send + Sync {
    /// Load a history; missing keys yield an empty history.
    fn load(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<Vec<ScoreSnapshot>>>;
    /// Replace the history stored under `key`.
    fn save(
        &self,
        key: HistoryKey,
        history: Vec<ScoreSnapshot>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the history stored under `key`, if any.
    fn delete(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<()>>;
}

/// History kept in process memory; lost on restart.
#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    entries: Arc<DashMap<String, Vec<ScoreSnapshot>>>,
}

impl MemoryHistoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is stored under `key`.
    pub fn contains(&self, key: HistoryKey) -> bool {
        self.entries.contains_key(&key.to_string())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<Vec<ScoreSnapshot>>> {
        let history = self
            .entries
            .get(&key.to_string())
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(history) })
    }

    fn save(
        &self,
        key: HistoryKey,
        history: Vec<ScoreSnapshot>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.insert(key.to_string(), history);
        Box::pin(async { Ok(()) })
    }

    fn delete(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.remove(&key.to_string());
        Box::pin(async { Ok(()) })
    }
}

/// History stored as one JSON document per key inside a directory.
#[derive(Clone)]
pub struct FileHistoryStore {
    directory: Arc<PathBuf>,
}

impl FileHistoryStore {
    /// Open (and create when missing) the history directory.
    pub async fn open(directory: impl Into<PathBuf>) -> StorageResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await.map_err(|source| {
            StorageError::unavailable(
                format!("failed to create history directory `{}`", directory.display()),
                source,
            )
        })?;
        Ok(Self {
            directory: Arc::new(directory),
        })
    }

    fn path(&self, key: HistoryKey) -> PathBuf {
        self.directory.join(key.file_name())
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<Vec<ScoreSnapshot>>> {
        let path = self.path(key);
        Box::pin(async move {
            let contents = match fs::read(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("failed to read history `{key}`"),
                        err,
                    ));
                }
            };
            serde_json::from_slice(&contents).map_err(|source| {
                StorageError::unavailable(format!("failed to decode history `{key}`"), source)
            })
        })
    }

    fn save(
        &self,
        key: HistoryKey,
        history: Vec<ScoreSnapshot>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path(key);
        Box::pin(async move {
            let payload = serde_json::to_vec(&history).map_err(|source| {
                StorageError::unavailable(format!("failed to encode history `{key}`"), source)
            })?;
            // Write then rename so a crash never leaves a truncated document.
            let staging = path.with_extension("json.tmp");
            fs::write(&staging, payload).await.map_err(|source| {
                StorageError::unavailable(format!("failed to write history `{key}`"), source)
            })?;
            fs::rename(&staging, &path).await.map_err(|source| {
                StorageError::unavailable(format!("failed to store history `{key}`"), source)
            })
        })
    }

    fn delete(&self, key: HistoryKey) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path(key);
        Box::pin(async move {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::unavailable(
                    format!("failed to delete history `{key}`"),
                    err,
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> HistoryKey {
        HistoryKey::new(GameFamily::PointAccumulation, Uuid::new_v4())
    }

    #[test]
    fn key_is_scoped_by_family() {
        let match_id = Uuid::new_v4();
        let key = HistoryKey::new(GameFamily::SetBased, match_id);
        assert_eq!(key.to_string(), format!("sets:{match_id}"));
        assert_ne!(
            key,
            HistoryKey::new(GameFamily::PointAccumulation, match_id)
        );
    }

    #[tokio::test]
    async fn memory_store_round_trip_and_delete() {
        let store = MemoryHistoryStore::new();
        let key = key();
        let history = vec![ScoreSnapshot::empty(GameFamily::PointAccumulation)];

        assert!(store.load(key).await.unwrap().is_empty());
        store.save(key, history.clone()).await.unwrap();
        assert_eq!(store.load(key).await.unwrap(), history);
        store.delete(key).await.unwrap();
        assert!(!store.contains(key));
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let directory = std::env::temp_dir().join(format!("score-desk-history-{}", Uuid::new_v4()));
        let key = key();
        let history = vec![
            ScoreSnapshot::empty(GameFamily::PointAccumulation),
            ScoreSnapshot::empty(GameFamily::PointAccumulation),
        ];

        let store = FileHistoryStore::open(&directory).await.unwrap();
        store.save(key, history.clone()).await.unwrap();

        let reopened = FileHistoryStore::open(&directory).await.unwrap();
        assert_eq!(reopened.load(key).await.unwrap(), history);

        reopened.delete(key).await.unwrap();
        assert!(reopened.load(key).await.unwrap().is_empty());
        // Deleting twice is fine.
        reopened.delete(key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&directory).await;
    }
}
