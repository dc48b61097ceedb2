//! Conversation persistence.
//!
//! A conversation lives at `users/{userId}/conversations/{id}` as
//! `{userId, messages, lastUpdated}`. Loading never fails: when storage is
//! unavailable the caller gets a transient conversation whose id starts with
//! `temp-`, and saving such a conversation is a no-op. Saving trims the log
//! to a window of recent messages and drops half-answered tool-call chains.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{json, Value};

use wv_domain::error::Result;
use wv_domain::message::{now_millis, Message};
use wv_domain::trace::TraceEvent;

use crate::docstore::DocumentStore;
use crate::stored::{decode_messages, StoredMessage};

/// Id prefix of conversations that exist only in memory.
pub const TRANSIENT_PREFIX: &str = "temp-";

/// Content given to an assistant message whose tool calls were stripped.
pub const PENDING_ACTIONS_CONTENT: &str = "I need to perform some actions for you.";

/// Default number of non-system messages kept on save.
pub const DEFAULT_WINDOW: usize = 20;

pub fn conversations_collection(user_id: &str) -> String {
    format!("users/{user_id}/conversations")
}

pub fn conversation_path(user_id: &str, conversation_id: &str) -> String {
    format!("users/{user_id}/conversations/{conversation_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub last_updated: i64,
}

impl Conversation {
    /// An in-memory conversation used when storage is unreachable.
    pub fn transient(user_id: &str) -> Self {
        let now = now_millis();
        Self {
            id: format!("{TRANSIENT_PREFIX}{now}"),
            user_id: user_id.to_string(),
            messages: Vec::new(),
            last_updated: now,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.id.starts_with(TRANSIENT_PREFIX)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ConversationStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ConversationStore {
    docs: Arc<dyn DocumentStore>,
    window: usize,
}

impl ConversationStore {
    pub fn new(docs: Arc<dyn DocumentStore>, window: usize) -> Self {
        Self {
            docs,
            window: window.max(1),
        }
    }

    /// Fetch an existing conversation or start a new one.
    ///
    /// A missing, empty or `temp-` id starts a new conversation. Storage
    /// errors degrade to [`Conversation::transient`].
    pub async fn load(&self, user_id: &str, conversation_id: Option<&str>) -> Conversation {
        match self.try_load(user_id, conversation_id).await {
            Ok(conv) => conv,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "conversation storage unavailable, using transient conversation"
                );
                Conversation::transient(user_id)
            }
        }
    }

    async fn try_load(&self, user_id: &str, conversation_id: Option<&str>) -> Result<Conversation> {
        let existing = conversation_id.filter(|id| !id.is_empty() && !id.starts_with(TRANSIENT_PREFIX));

        if let Some(id) = existing {
            if let Some(doc) = self.docs.get(&conversation_path(user_id, id)).await? {
                let raw = doc
                    .get("messages")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let conv = Conversation {
                    id: id.to_string(),
                    user_id: user_id.to_string(),
                    messages: decode_messages(raw),
                    last_updated: doc.get("lastUpdated").and_then(Value::as_i64).unwrap_or(0),
                };
                TraceEvent::ConversationLoaded {
                    conversation_id: conv.id.clone(),
                    messages: conv.messages.len(),
                    is_new: false,
                }
                .emit();
                return Ok(conv);
            }
            tracing::debug!(conversation_id = %id, "conversation not found, starting a new one");
        }

        let now = now_millis();
        let id = self
            .docs
            .add(
                &conversations_collection(user_id),
                json!({ "userId": user_id, "messages": [], "lastUpdated": now }),
            )
            .await?;

        TraceEvent::ConversationLoaded {
            conversation_id: id.clone(),
            messages: 0,
            is_new: true,
        }
        .emit();

        Ok(Conversation {
            id,
            user_id: user_id.to_string(),
            messages: Vec::new(),
            last_updated: now,
        })
    }

    /// Persist a conversation. Best-effort: failures are logged, not returned.
    pub async fn save(&self, conversation: &Conversation) {
        if conversation.is_transient() {
            tracing::debug!(conversation_id = %conversation.id, "not persisting transient conversation");
            return;
        }

        let prepared = prepare_for_save(&conversation.messages, self.window);
        let stored: Vec<StoredMessage> = prepared.iter().map(StoredMessage::from).collect();
        let doc = json!({ "messages": stored, "lastUpdated": now_millis() });

        let path = conversation_path(&conversation.user_id, &conversation.id);
        match self.docs.set(&path, doc, true).await {
            Ok(()) => TraceEvent::ConversationSaved {
                conversation_id: conversation.id.clone(),
                messages: prepared.len(),
                trimmed: conversation.messages.len().saturating_sub(prepared.len()),
            }
            .emit(),
            Err(e) => tracing::warn!(
                conversation_id = %conversation.id,
                error = %e,
                "failed to save conversation"
            ),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Save-time shaping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trim, then reorganize tool-call chains.
pub fn prepare_for_save(messages: &[Message], window: usize) -> Vec<Message> {
    reorganize(&trim(messages, window))
}

/// Keep the first system message plus the `window` most recent messages.
///
/// Later system messages are dropped. Lists of at most `window + 1`
/// messages are otherwise untouched.
pub fn trim(messages: &[Message], window: usize) -> Vec<Message> {
    let system = messages.iter().find(|m| m.is_system()).cloned();

    let mut seen_system = false;
    let mut kept: Vec<Message> = messages
        .iter()
        .filter(|m| {
            if !m.is_system() {
                return true;
            }
            !std::mem::replace(&mut seen_system, true)
        })
        .cloned()
        .collect();

    if kept.len() <= window + 1 {
        return kept;
    }

    let mut tail = kept.split_off(kept.len() - window);
    if let Some(system) = system {
        if !tail.iter().any(Message::is_system) {
            tail.insert(0, system);
        }
    }
    tail
}

/// Place every answered call's results right after its assistant message.
///
/// An assistant message with any unanswered call loses all of its calls
/// (and their results); empty content becomes [`PENDING_ACTIONS_CONTENT`].
/// Results with no surviving call are dropped.
pub fn reorganize(messages: &[Message]) -> Vec<Message> {
    // call id -> indices of every result answering it, in order. Ids may be
    // reused across assistant messages, so each result is used at most once.
    let mut results: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, msg) in messages.iter().enumerate() {
        if let Some(id) = msg.tool_call_id() {
            results.entry(id).or_default().push(idx);
        }
    }
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut out = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg {
            Message::Assistant {
                content,
                tool_calls,
                timestamp,
            } if !tool_calls.is_empty() => {
                let mut picked: Vec<usize> = Vec::with_capacity(tool_calls.len());
                for call in tool_calls {
                    let next = results.get(call.call_id.as_str()).and_then(|idxs| {
                        idxs.iter()
                            .copied()
                            .find(|i| !consumed.contains(i) && !picked.contains(i))
                    });
                    match next {
                        Some(i) => picked.push(i),
                        None => break,
                    }
                }
                let responses = (picked.len() == tool_calls.len()).then_some(picked);

                match responses {
                    Some(indices) => {
                        consumed.extend(indices.iter().copied());
                        out.push(msg.clone());
                        out.extend(indices.into_iter().map(|i| messages[i].clone()));
                    }
                    None => out.push(Message::Assistant {
                        content: if content.trim().is_empty() {
                            PENDING_ACTIONS_CONTENT.to_string()
                        } else {
                            content.clone()
                        },
                        tool_calls: Vec::new(),
                        timestamp: *timestamp,
                    }),
                }
            }
            Message::ToolResult { .. } => {}
            other => out.push(other.clone()),
        }
    }

    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::{Document, MemoryDocumentStore};
    use wv_domain::error::Error;
    use wv_domain::repair::is_well_formed;
    use wv_domain::tool::ToolCall;

    struct Unavailable;

    #[async_trait::async_trait]
    impl DocumentStore for Unavailable {
        async fn get(&self, _path: &str) -> Result<Option<Value>> {
            Err(Error::Storage("offline".into()))
        }
        async fn set(&self, _path: &str, _doc: Value, _merge: bool) -> Result<()> {
            Err(Error::Storage("offline".into()))
        }
        async fn add(&self, _collection: &str, _doc: Value) -> Result<String> {
            Err(Error::Storage("offline".into()))
        }
        async fn list(&self, _collection: &str) -> Result<Vec<Document>> {
            Err(Error::Storage("offline".into()))
        }
        async fn delete(&self, _path: &str) -> Result<()> {
            Err(Error::Storage("offline".into()))
        }
    }

    fn store() -> (Arc<MemoryDocumentStore>, ConversationStore) {
        let docs = Arc::new(MemoryDocumentStore::new());
        let store = ConversationStore::new(docs.clone(), DEFAULT_WINDOW);
        (docs, store)
    }

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "deleteTask", "{}")
    }

    #[tokio::test]
    async fn load_without_id_creates_a_record() {
        let (docs, store) = store();
        let conv = store.load("alice", None).await;

        assert!(!conv.is_transient());
        assert!(conv.messages.is_empty());
        let doc = docs
            .get(&conversation_path("alice", &conv.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["userId"], "alice");
    }

    #[tokio::test]
    async fn load_with_unknown_or_temp_id_starts_fresh() {
        let (_docs, store) = store();
        let unknown = store.load("alice", Some("nope")).await;
        assert_ne!(unknown.id, "nope");

        let temp = store.load("alice", Some("temp-123")).await;
        assert_ne!(temp.id, "temp-123");
        assert!(!temp.is_transient());
    }

    #[tokio::test]
    async fn saved_conversation_loads_back() {
        let (_docs, store) = store();
        let mut conv = store.load("alice", None).await;
        conv.messages.push(Message::system("rules"));
        conv.messages.push(Message::user("add milk"));
        conv.messages.push(Message::assistant("Added.", vec![]));
        store.save(&conv).await;

        let loaded = store.load("alice", Some(&conv.id)).await;
        assert_eq!(loaded.id, conv.id);
        assert_eq!(loaded.user_id, "alice");
        assert_eq!(loaded.messages, conv.messages);
    }

    #[tokio::test]
    async fn storage_failure_yields_transient_conversation() {
        let store = ConversationStore::new(Arc::new(Unavailable), DEFAULT_WINDOW);
        let conv = store.load("alice", Some("abc")).await;
        assert!(conv.id.starts_with("temp-"));
        assert!(conv.is_transient());

        // Saving a transient conversation never touches storage.
        store.save(&conv).await;
    }

    #[tokio::test]
    async fn save_failure_is_swallowed() {
        let store = ConversationStore::new(Arc::new(Unavailable), DEFAULT_WINDOW);
        let conv = Conversation {
            id: "real".into(),
            user_id: "alice".into(),
            messages: vec![Message::user("hi")],
            last_updated: 0,
        };
        store.save(&conv).await;
    }

    #[test]
    fn trim_keeps_system_and_last_window() {
        let mut messages = vec![Message::system("rules")];
        for i in 0..30 {
            messages.push(Message::user(format!("m{i}")));
        }

        let trimmed = trim(&messages, 20);
        assert_eq!(trimmed.len(), 21);
        assert!(trimmed[0].is_system());
        assert_eq!(trimmed[1].content(), "m10");
        assert_eq!(trimmed[20].content(), "m29");
    }

    #[test]
    fn trim_leaves_short_lists_alone() {
        let messages: Vec<Message> = (0..21).map(|i| Message::user(format!("m{i}"))).collect();
        assert_eq!(trim(&messages, 20), messages);
    }

    #[test]
    fn trim_drops_duplicate_system_messages() {
        let mut messages = vec![Message::system("first")];
        for i in 0..25 {
            messages.push(Message::user(format!("m{i}")));
        }
        messages.push(Message::system("second"));

        let trimmed = trim(&messages, 20);
        assert!(trimmed.len() <= 21);
        assert_eq!(trimmed.iter().filter(|m| m.is_system()).count(), 1);
        assert_eq!(trimmed[0].content(), "first");
    }

    #[test]
    fn half_answered_chain_is_flattened() {
        let messages = vec![
            Message::user("delete both"),
            Message::assistant("", vec![call("t1"), call("t2")]),
            Message::tool_result("t1", "ok"),
        ];

        let out = reorganize(&messages);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].content(), PENDING_ACTIONS_CONTENT);
        assert!(out[1].tool_calls().is_empty());
    }

    #[test]
    fn flattening_keeps_existing_content() {
        let messages = vec![Message::assistant("Working on it", vec![call("t1")])];
        let out = reorganize(&messages);
        assert_eq!(out[0].content(), "Working on it");
    }

    #[test]
    fn answered_chain_is_regrouped() {
        let messages = vec![
            Message::assistant("", vec![call("t1"), call("t2")]),
            Message::user("meanwhile"),
            Message::tool_result("t2", "two"),
            Message::tool_result("t1", "one"),
            Message::tool_result("zz", "stray"),
        ];

        let out = reorganize(&messages);
        assert!(is_well_formed(&out));
        assert_eq!(out[1].tool_call_id(), Some("t1"));
        assert_eq!(out[2].tool_call_id(), Some("t2"));
        assert_eq!(out[3].content(), "meanwhile");
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn reused_call_ids_keep_their_own_results() {
        let messages = vec![
            Message::assistant("", vec![call("call_0")]),
            Message::tool_result("call_0", "first"),
            Message::assistant("", vec![call("call_0")]),
            Message::tool_result("call_0", "second"),
        ];

        let out = reorganize(&messages);
        let contents: Vec<&str> = out.iter().map(Message::content).collect();
        assert_eq!(contents, ["", "first", "", "second"]);
        assert!(is_well_formed(&out));
    }

    #[test]
    fn reused_id_without_a_second_result_is_flattened() {
        let messages = vec![
            Message::assistant("", vec![call("call_0")]),
            Message::tool_result("call_0", "first"),
            Message::assistant("", vec![call("call_0")]),
        ];

        let out = reorganize(&messages);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].content(), "first");
        assert_eq!(out[2].content(), PENDING_ACTIONS_CONTENT);
        assert!(out[2].tool_calls().is_empty());
    }

    #[test]
    fn trimming_that_cuts_a_chain_stays_valid() {
        let mut messages = vec![
            Message::system("rules"),
            Message::assistant("", vec![call("old")]),
        ];
        for i in 0..19 {
            messages.push(Message::user(format!("m{i}")));
        }
        messages.push(Message::tool_result("old", "late"));

        let prepared = prepare_for_save(&messages, 20);
        assert!(is_well_formed(&prepared));
        assert!(prepared.iter().all(|m| m.tool_call_id().is_none()));
    }
}
