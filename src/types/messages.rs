//! Conversation threads and message history
//!
//! A thread holds the ordered message history for one session. One run
//! processes a thread at a time; exclusivity is enforced by the mutable
//! borrow the orchestrator takes for the duration of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Single conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Per-session conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    messages: Vec<Message>,
}

impl Thread {
    /// Create a new empty thread with a fresh id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    /// Append a message to the history
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Ordered message history
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent user message, if any
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory store of conversation threads keyed by id
///
/// Cross-restart persistence is a host concern; nothing here touches disk.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: HashMap<Uuid, Thread>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new thread and return its id
    pub fn create(&mut self) -> Uuid {
        let thread = Thread::new();
        let id = thread.id;
        self.threads.insert(id, thread);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&Thread> {
        self.threads.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Thread> {
        self.threads.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_history_order() {
        let mut thread = Thread::new();
        thread.push_user("first");
        thread.push_assistant("second");
        thread.push_user("third");

        let history = thread.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[2].content, "third");
    }

    #[test]
    fn test_last_user_message() {
        let mut thread = Thread::new();
        thread.push_user("question");
        thread.push_assistant("answer");

        let last = thread.last_user_message().unwrap();
        assert_eq!(last.content, "question");
    }

    #[test]
    fn test_thread_store_create_and_get() {
        let mut store = ThreadStore::new();
        let id = store.create();

        assert!(store.get(&id).is_some());
        store.get_mut(&id).unwrap().push_user("hello");
        assert_eq!(store.get(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_thread_ids_unique() {
        let mut store = ThreadStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
