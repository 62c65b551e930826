// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Part of the bootstrap pair rather than a real turn.
    pub seed: bool,
    pub timestamp: Instant,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            seed: false,
            timestamp: Instant::now(),
        }
    }

    fn seed(role: MessageRole, content: &str) -> Self {
        Self {
            seed: true,
            ..Self::new(role, content)
        }
    }
}

/// The instruction/acknowledgement pair every session starts with.
#[derive(Clone, Debug)]
pub struct SeedPair {
    pub instruction: String,
    pub acknowledgement: String,
}

impl SeedPair {
    pub fn new(instruction: impl Into<String>, acknowledgement: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            acknowledgement: acknowledgement.into(),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::seed(MessageRole::User, &self.instruction),
            Message::seed(MessageRole::Model, &self.acknowledgement),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    /// Everything shown to the user. Append-only.
    pub transcript: Vec<Message>,
    /// History sent to the model; only grows by completed exchanges.
    pub context: Vec<Message>,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>, seed: &SeedPair) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            transcript: seed.messages(),
            context: seed.messages(),
            last_active: now,
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    seed: Arc<SeedPair>,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration, seed: SeedPair) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            seed: Arc::new(seed),
        }
    }

    // Create a fresh seeded session and return its id. Idle sessions are dropped first.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), &self.seed);

        let mut guard = self.inner.write().await;
        self.drop_idle(&mut guard);
        guard.insert(id.clone(), session);
        id
    }

    // Ensure there's a session with this id. Idle sessions are dropped before a new id is admitted.
    pub async fn ensure_session(&self, id: &str) -> String {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return id.to_string();
            }
        }
        let mut guard = self.inner.write().await;
        self.drop_idle(&mut guard);
        guard
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id, &self.seed));
        id.to_string()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.contains_key(id)
    }

    /// Append a message to an existing session's transcript and touch last_active.
    /// Returns the transcript length, or `None` if the session is gone.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Option<usize> {
        let mut guard = self.inner.write().await;
        let entry = guard.get_mut(session_id)?;
        entry.transcript.push(Message::new(role, content));
        entry.last_active = Instant::now();
        Some(entry.transcript.len())
    }

    /// Record a completed exchange in the model context. Returns the context
    /// length, or `None` if the session is gone.
    pub async fn commit_exchange(&self, session_id: &str, prompt: &str, reply: &str) -> Option<usize> {
        let mut guard = self.inner.write().await;
        let entry = guard.get_mut(session_id)?;
        entry.context.push(Message::new(MessageRole::User, prompt));
        entry.context.push(Message::new(MessageRole::Model, reply));
        entry.last_active = Instant::now();
        Some(entry.context.len())
    }

    /// Get a copy of the session transcript
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<Message>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.transcript.clone())
    }

    /// Get a copy of the history the model sees
    pub async fn get_context(&self, session_id: &str) -> Option<Vec<Message>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.context.clone())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        self.drop_idle(&mut guard)
    }

    fn drop_idle(&self, sessions: &mut HashMap<String, Session>) -> usize {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "dropped idle sessions");
        }
        purged
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// List session ids
    pub async fn list_session_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}
