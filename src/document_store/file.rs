//! # File-Backed Document Store
//!
//! Each collection lives in `{dir}/{collection}.json` as a JSON array. The
//! whole collection is rewritten on every mutation through a temp file and a
//! rename, so a crash mid-write leaves the previous contents intact.
//!
//! Mutations are cancellation-safe: the new contents are staged in a copy
//! and a temp file, and the rename and the in-memory swap happen together
//! with no await in between. A caller that drops the future (for example
//! on timeout) leaves both disk and memory unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::filter::Filter;
use super::memory::{validate_collection, Collections};
use super::DocumentStore;

const EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Document store persisted as one JSON file per collection
#[derive(Debug)]
pub struct FileDocumentStore {
    dir: PathBuf,
    collections: RwLock<Collections>,
}

impl FileDocumentStore {
    /// Open (or create) a store rooted at `dir`, loading every collection file
    pub async fn open(dir: impl Into<PathBuf>) -> DocumentResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let mut data = HashMap::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some(EXTENSION) => {}
                Some(TEMP_EXTENSION) => {
                    debug!(path = %path.display(), "removing stale temp file");
                    if let Err(e) = fs::remove_file(&path).await {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            return Err(e.into());
                        }
                    }
                    continue;
                }
                _ => continue,
            }
            let Some(collection) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let bytes = fs::read(&path).await?;
            let records: Vec<Value> = serde_json::from_slice(&bytes)?;
            debug!(collection, records = records.len(), "loaded collection");
            data.insert(collection.to_string(), records);
        }

        Ok(Self {
            dir,
            collections: RwLock::new(Collections::from_map(data)),
        })
    }

    /// Directory holding the collection files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", collection, EXTENSION))
    }

    /// Write the next contents of `collection` to a temp file
    async fn stage(&self, collection: &str, records: &[Value]) -> DocumentResult<PendingWrite> {
        let pending = PendingWrite {
            tmp: self.dir.join(format!(
                "{}.{}.{}",
                collection,
                Uuid::new_v4(),
                TEMP_EXTENSION
            )),
            target: self.collection_path(collection),
            committed: false,
        };

        let bytes = serde_json::to_vec_pretty(records)?;
        fs::write(&pending.tmp, bytes).await?;
        Ok(pending)
    }
}

/// Staged collection file; removed on drop unless committed
struct PendingWrite {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PendingWrite {
    /// Synchronous so the caller can swap memory right after, uncancelled
    fn commit(mut self) -> DocumentResult<()> {
        std::fs::rename(&self.tmp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.tmp);
        }
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> DocumentResult<Vec<Value>> {
        Ok(self.collections.read().await.find(collection, filter))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> DocumentResult<Option<Value>> {
        Ok(self.collections.read().await.find_one(collection, filter))
    }

    async fn insert_one(&self, collection: &str, record: Value) -> DocumentResult<()> {
        validate_collection(collection)?;
        let mut collections = self.collections.write().await;

        let mut staged = collections.staged(collection);
        staged.insert(collection, record)?;
        let pending = self.stage(collection, staged.records(collection)).await?;

        pending.commit()?;
        collections.adopt(collection, staged);
        Ok(())
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        let mut collections = self.collections.write().await;

        let mut staged = collections.staged(collection);
        if staged.remove_one(collection, filter).is_none() {
            return Ok(0);
        }
        let pending = self.stage(collection, staged.records(collection)).await?;

        pending.commit()?;
        collections.adopt(collection, staged);
        Ok(1)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        Ok(self.collections.read().await.count(collection, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp = TempDir::new().unwrap();

        {
            let store = FileDocumentStore::open(temp.path()).await.unwrap();
            store
                .insert_one("namespace", json!({"id": "acme", "name": "acme", "owner": "alice"}))
                .await
                .unwrap();
            store
                .insert_one("namespace", json!({"id": "globex", "name": "globex", "owner": "bob"}))
                .await
                .unwrap();
            store
                .delete_one("namespace", &Filter::new().eq("id", "globex"))
                .await
                .unwrap();
        }

        let reopened = FileDocumentStore::open(temp.path()).await.unwrap();
        let all = reopened.find("namespace", &Filter::new()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["owner"], "alice");
        assert!(temp.path().join("namespace.json").exists());
    }

    #[tokio::test]
    async fn test_unique_index_persists() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileDocumentStore::open(temp.path()).await.unwrap();
            store.insert_one("module", json!({"id": "acme/net"})).await.unwrap();
        }

        let store = FileDocumentStore::open(temp.path()).await.unwrap();
        let result = store.insert_one("module", json!({"id": "acme/net"})).await;
        assert!(matches!(result, Err(DocumentError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp.path()).await.unwrap();
        store.insert_one("versions", json!({"id": "a/b/c/1.0.0"})).await.unwrap();

        let leftovers = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_corrupt_collection_fails_open() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("systems.json"), b"{not json").unwrap();

        let result = FileDocumentStore::open(temp.path()).await;
        assert!(matches!(result, Err(DocumentError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_timed_out_mutations_leave_no_trace() {
        let temp = TempDir::new().unwrap();
        let store = crate::document_store::Bounded::new(
            FileDocumentStore::open(temp.path()).await.unwrap(),
            std::time::Duration::ZERO,
        );

        let mut accepted = Vec::new();
        for i in 0..50 {
            let id = format!("acme/net/aws/1.0.{}", i);
            let result = store.insert_one("versions", json!({"id": id})).await;
            let visible = store
                .inner()
                .count("versions", &Filter::new().eq("id", id.as_str()))
                .await
                .unwrap();

            match result {
                Ok(()) => {
                    assert_eq!(visible, 1);
                    accepted.push(id);
                }
                Err(e) => {
                    assert!(matches!(e, DocumentError::Timeout(_)));
                    assert_eq!(visible, 0, "failed insert of {} is visible", id);
                }
            }
        }

        // A failed insert must not block a retry with the same key
        let retry = store
            .inner()
            .insert_one("versions", json!({"id": "acme/net/aws/1.0.0"}))
            .await;
        assert_eq!(retry.is_ok(), !accepted.iter().any(|id| id == "acme/net/aws/1.0.0"));

        let reopened = FileDocumentStore::open(temp.path()).await.unwrap();
        let in_memory = store.inner().count("versions", &Filter::new()).await.unwrap();
        let on_disk = reopened.count("versions", &Filter::new()).await.unwrap();
        assert_eq!(on_disk, in_memory);
    }

    #[tokio::test]
    async fn test_stale_temp_files_removed_on_open() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("versions.abc.tmp"), b"[").unwrap();

        let store = FileDocumentStore::open(temp.path()).await.unwrap();
        assert_eq!(store.count("versions", &Filter::new()).await.unwrap(), 0);
        assert!(!temp.path().join("versions.abc.tmp").exists());
    }
}
