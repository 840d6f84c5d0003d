//! In-memory store of chat sessions.
//!
//! The store keeps every session created during this run together with its
//! transcript, and tracks which one is current. Nothing is persisted.

use chrono::Utc;

use crate::state::{ChatMessage, ChatSession, SessionId};

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current: Option<SessionId>,
    // Sessions created so far in this run, including cleared ones.
    created: usize,
    last_id: i64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new session titled `Chat N`, appends it and makes it current.
    pub fn create_session(&mut self) -> SessionId {
        let now = Utc::now();
        // Ids come from the clock but must stay unique when two sessions are
        // created within the same millisecond.
        let millis = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = millis;
        self.created += 1;

        let id = SessionId::from_millis(millis);
        let title = format!("Chat {}", self.created);
        log::debug!("Created session {} ({})", id, title);

        self.sessions.push(ChatSession::new(id, title, now));
        self.current = Some(id);
        id
    }

    /// Makes `id` the current session. Unknown ids are ignored.
    pub fn select_session(&mut self, id: SessionId) {
        if self.get(id).is_some() {
            self.current = Some(id);
        } else {
            log::debug!("Ignoring selection of unknown session {}", id);
        }
    }

    /// Removes every session and the current-session pointer.
    pub fn clear_all(&mut self) {
        log::debug!("Clearing {} sessions", self.sessions.len());
        self.sessions.clear();
        self.current = None;
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current
    }

    pub fn current(&self) -> Option<&ChatSession> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// The transcript of the current session, empty when none is current.
    pub fn transcript(&self) -> &[ChatMessage] {
        self.current().map(|s| s.transcript()).unwrap_or(&[])
    }

    pub(crate) fn get_mut(&mut self, id: SessionId) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }
}
