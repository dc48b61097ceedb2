//! Per-user note/task storage under `users/{userId}/notes`.

use std::sync::Arc;

use serde_json::Value;

use wv_domain::error::{Error, Result};
use wv_domain::message::now_millis;
use wv_domain::task::Task;

use crate::docstore::{Document, DocumentStore};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const RECENT_CONTEXT_LIMIT: usize = 20;

pub fn notes_collection(user_id: &str) -> String {
    format!("users/{user_id}/notes")
}

pub fn note_path(user_id: &str, note_id: &str) -> String {
    format!("users/{user_id}/notes/{note_id}")
}

fn to_task(doc: Document) -> Option<Task> {
    match serde_json::from_value::<Task>(doc.data) {
        Ok(mut task) => {
            task.id = Some(doc.id);
            Some(task)
        }
        Err(e) => {
            tracing::warn!(note_id = %doc.id, error = %e, "skipping unreadable note");
            None
        }
    }
}

pub struct NoteStore {
    docs: Arc<dyn DocumentStore>,
}

impl NoteStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    async fn all(&self, user_id: &str) -> Result<Vec<Task>> {
        let docs = self.docs.list(&notes_collection(user_id)).await?;
        Ok(docs.into_iter().filter_map(to_task).collect())
    }

    /// Newest first. `start_after` is a timestamp cursor: only notes strictly
    /// older than it are returned.
    pub async fn list(&self, user_id: &str, limit: usize, start_after: Option<i64>) -> Result<Vec<Task>> {
        let mut notes = self.all(user_id).await?;
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notes
            .into_iter()
            .filter(|n| match (start_after, n.timestamp) {
                (Some(cursor), Some(ts)) => ts < cursor,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .take(limit)
            .collect())
    }

    /// The most recent notes, used as agent context when the client sends none.
    pub async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<Task>> {
        self.list(user_id, limit, None).await
    }

    /// Store a new note and return it with its generated id.
    pub async fn create(&self, user_id: &str, mut note: Task) -> Result<Task> {
        note.id = None;
        if note.timestamp.is_none() {
            note.timestamp = Some(now_millis());
        }
        let id = self
            .docs
            .add(&notes_collection(user_id), serde_json::to_value(&note)?)
            .await?;
        note.id = Some(id);
        Ok(note)
    }

    /// Merge `updates` into an existing note and return the stored result.
    ///
    /// The merged document is normalized through [`Task`] before it is
    /// written, so a value of the wrong shape (an unknown priority, a `null`
    /// flag) is stored as the field's default and the note stays readable.
    pub async fn update(&self, user_id: &str, note_id: &str, updates: Value) -> Result<Task> {
        let Value::Object(mut fields) = updates else {
            return Err(Error::Other("updates must be a JSON object".into()));
        };
        fields.remove("id");

        let path = note_path(user_id, note_id);
        let Some(Value::Object(mut merged)) = self.docs.get(&path).await? else {
            return Err(Error::NotFound(format!("note {note_id}")));
        };
        merged.extend(fields);

        let mut note: Task = serde_json::from_value(Value::Object(merged))?;
        note.id = None;
        self.docs.set(&path, serde_json::to_value(&note)?, false).await?;
        note.id = Some(note_id.to_string());
        Ok(note)
    }

    /// Case-sensitive prefix match on content, ordered by content.
    pub async fn search_prefix(&self, user_id: &str, prefix: &str, limit: usize) -> Result<Vec<Task>> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<Task> = self
            .all(user_id)
            .await?
            .into_iter()
            .filter(|n| n.content.starts_with(prefix))
            .collect();
        hits.sort_by(|a, b| a.content.cmp(&b.content));
        hits.truncate(limit);
        Ok(hits)
    }

    /// Move every note in `old_name` to `new_name`; returns how many moved.
    pub async fn rename_category(&self, user_id: &str, old_name: &str, new_name: &str) -> Result<usize> {
        let mut moved = 0;
        for note in self.all(user_id).await? {
            if note.category != old_name {
                continue;
            }
            let Some(id) = note.id else { continue };
            self.docs
                .set(
                    &note_path(user_id, &id),
                    serde_json::json!({ "category": new_name }),
                    true,
                )
                .await?;
            moved += 1;
        }
        tracing::info!(user_id = %user_id, from = %old_name, to = %new_name, moved, "renamed category");
        Ok(moved)
    }
}
