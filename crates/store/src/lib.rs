//! Persistence for Weave.
//!
//! A small document-store abstraction with in-memory and JSON-file
//! backends, plus the conversation and note stores built on top of it.

pub mod conversation;
pub mod docstore;
pub mod notes;
pub mod stored;

pub use conversation::{Conversation, ConversationStore};
pub use docstore::{Document, DocumentStore, JsonFileDocumentStore, MemoryDocumentStore};
pub use notes::NoteStore;
pub use stored::StoredMessage;
