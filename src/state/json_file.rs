use async_trait::async_trait;
use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::StateStore;
use crate::{
    errors::{WatchError, WatchResult},
    models::watermark::WatermarkState,
};

/// Watermarks kept in one pretty-printed JSON file.
///
/// Saves go through a temp file in the same directory followed by a
/// rename, so a crash mid-write leaves the previous record intact.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> WatchResult<WatermarkState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No state record at {}, starting empty", self.path.display());
                return Ok(WatermarkState::new());
            }
            Err(e) => return Err(WatchError::state_unavailable(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(WatermarkState::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| WatchError::state_unavailable(&self.path, e))
    }

    async fn write(&self, state: &WatermarkState) -> WatchResult<()> {
        let body = serde_json::to_vec_pretty(state)
            .map_err(|e| WatchError::state_persist(&self.path, e))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .map_err(|e| WatchError::state_persist(&self.path, e))?
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> WatchResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| WatchError::state_persist(path, e))?;
    file.write_all(body)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| WatchError::state_persist(path, e))?;
    file.persist(path)
        .map_err(|e| WatchError::state_persist(path, e.error))?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> WatchResult<WatermarkState> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn advance(&self, feed_key: &str, id: &str) -> WatchResult<WatermarkState> {
        let _guard = self.lock.lock().await;
        let mut state = self.read().await?;
        if state.advance(feed_key, id) {
            self.write(&state).await?;
            log::debug!("Stored watermark {feed_key}={id} in {}", self.path.display());
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonFileStore) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let (_temp_dir, store) = store();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_unavailable() {
        let (_temp_dir, store) = store();
        std::fs::write(store.path(), "{not json").unwrap();
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, WatchError::StateUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_advance_creates_file_and_keeps_other_keys() {
        let (_temp_dir, store) = store();
        std::fs::write(store.path(), r#"{"paid": "p4", "note": "kept"}"#).unwrap();

        store.advance("free", "c3").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({"free": "c3", "paid": "p4", "note": "kept"})
        );
    }

    #[tokio::test]
    async fn test_foreign_non_string_keys_load_and_survive_advance() {
        let (_temp_dir, store) = store();
        std::fs::write(
            store.path(),
            r#"{"free": "c1", "paid": "p1", "updated": 1700000000, "owner": {"name": "ops"}}"#,
        )
        .unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.get("free"), Some("c1"));
        assert_eq!(state.get("updated"), None);

        store.advance("paid", "p2").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "free": "c1",
                "paid": "p2",
                "updated": 1700000000,
                "owner": {"name": "ops"}
            })
        );
    }

    #[tokio::test]
    async fn test_advance_ignores_older_ids() {
        let (_temp_dir, store) = store();
        store.advance("free", "c5").await.unwrap();
        let state = store.advance("free", "c2").await.unwrap();
        assert_eq!(state.get("free"), Some("c5"));
        assert_eq!(store.load().await.unwrap().get("free"), Some("c5"));
    }

    #[tokio::test]
    async fn test_concurrent_advances_do_not_clobber() {
        let (_temp_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let free = {
            let store = store.clone();
            tokio::spawn(async move { store.advance("free", "c1").await })
        };
        let paid = {
            let store = store.clone();
            tokio::spawn(async move { store.advance("paid", "p1").await })
        };
        free.await.unwrap().unwrap();
        paid.await.unwrap().unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.get("free"), Some("c1"));
        assert_eq!(state.get("paid"), Some("p1"));
    }
}
