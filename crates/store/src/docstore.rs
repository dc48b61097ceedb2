//! Document store abstraction.
//!
//! Documents are JSON objects addressed by slash-separated paths whose last
//! segment is the document id, e.g. `users/alice/notes/abc123`. Everything
//! before the last segment names the collection.
//!
//! Two backends are provided: [`MemoryDocumentStore`] for tests and
//! throwaway deployments, and [`JsonFileDocumentStore`], which keeps the
//! same in-memory map and rewrites a JSON file after every mutation.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;

use wv_domain::error::{Error, Result};

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when it does not exist.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Write a document. With `merge`, top-level fields are merged into the
    /// existing document instead of replacing it.
    async fn set(&self, path: &str, doc: Value, merge: bool) -> Result<()>;

    /// Insert a document under a freshly generated id and return the id.
    async fn add(&self, collection: &str, doc: Value) -> Result<String>;

    /// All documents of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Remove a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}

type Collections = HashMap<String, BTreeMap<String, Value>>;

fn split_path(path: &str) -> Result<(&str, &str)> {
    match path.rsplit_once('/') {
        Some((collection, id)) if !collection.is_empty() && !id.is_empty() => Ok((collection, id)),
        _ => Err(Error::Storage(format!("invalid document path '{path}'"))),
    }
}

fn merge_into(existing: &mut Value, doc: Value) {
    match (existing, doc) {
        (Value::Object(target), Value::Object(fields)) => {
            for (k, v) in fields {
                target.insert(k, v);
            }
        }
        (slot, doc) => *slot = doc,
    }
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_collections(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
        }
    }

    fn get_sync(&self, path: &str) -> Result<Option<Value>> {
        let (collection, id) = split_path(path)?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn set_sync(&self, path: &str, doc: Value, merge: bool) -> Result<()> {
        let (collection, id) = split_path(path)?;
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.get_mut(id) {
            Some(existing) if merge => merge_into(existing, doc),
            _ => {
                docs.insert(id.to_string(), doc);
            }
        }
        Ok(())
    }

    fn add_sync(&self, collection: &str, doc: Value) -> Result<String> {
        if collection.is_empty() {
            return Err(Error::Storage("empty collection name".into()));
        }
        let id = new_document_id();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc);
        Ok(id)
    }

    fn list_sync(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn delete_sync(&self, path: &str) -> Result<()> {
        let (collection, id) = split_path(path)?;
        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.collections.read())?)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.get_sync(path)
    }

    async fn set(&self, path: &str, doc: Value, merge: bool) -> Result<()> {
        self.set_sync(path, doc, merge)
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String> {
        self.add_sync(collection, doc)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self.list_sync(collection))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.delete_sync(path)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Document store backed by a single JSON file.
///
/// Reads are served from memory. Each mutation rewrites the file through a
/// temp file in the same directory followed by a rename, so a crash never
/// leaves a half-written file behind.
pub struct JsonFileDocumentStore {
    path: PathBuf,
    inner: MemoryDocumentStore,
    /// Serializes mutate-then-persist so file writes land in order.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileDocumentStore {
    /// Load the store from `path`, creating parent directories as needed.
    /// A missing file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let collections: Collections = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Collections::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Collections::new()
        };

        tracing::info!(
            collections = collections.len(),
            documents = collections.values().map(BTreeMap::len).sum::<usize>(),
            path = %path.display(),
            "document store loaded"
        );

        Ok(Self {
            path,
            inner: MemoryDocumentStore::from_collections(collections),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> Result<()> {
        let json = self.inner.snapshot()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|e| Error::Storage(format!("persist task failed: {e}")))?
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[async_trait::async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.inner.get_sync(path)
    }

    async fn set(&self, path: &str, doc: Value, merge: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.set_sync(path, doc, merge)?;
        self.persist().await
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String> {
        let _guard = self.write_lock.lock().await;
        let id = self.inner.add_sync(collection, doc)?;
        self.persist().await?;
        Ok(id)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self.inner.list_sync(collection))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.delete_sync(path)?;
        self.persist().await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
