//! Submission flow for the active chat session.
//!
//! `SubmissionController` owns the session store and is the only way client
//! chat state changes. A submission is split in two halves so a UI can keep
//! its event loop running while the request is in flight:
//!
//! 1. [`SubmissionController::begin_submit`] appends the user message, marks
//!    the session pending and hands back a [`PendingSubmission`] ticket.
//! 2. [`SubmissionController::finish_submit`] appends the reply (or the
//!    error bubble) and returns the session to idle.
//!
//! [`SubmissionController::submit`] runs both halves around a backend call.

use crate::backend::CompletionBackend;
use crate::error::Result;
use crate::session::SessionStore;
use crate::state::{ChatMessage, SessionId, SubmissionId, ERROR_REPLY};

/// A submission that has been accepted and is waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub id: SubmissionId,
    pub session: SessionId,
    /// The full transcript to send, ending with the new user message.
    pub transcript: Vec<ChatMessage>,
}

/// What happened to a reply handed to `finish_submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The assistant reply was appended.
    Replied,
    /// The error bubble was appended.
    Failed,
    /// The session no longer exists or the ticket is not the pending one.
    Dropped,
}

/// Result of the all-in-one `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input or a submission already pending; nothing changed.
    Skipped,
    Replied,
    Failed,
}

#[derive(Debug, Default)]
pub struct SubmissionController {
    store: SessionStore,
    next_submission: u64,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn create_session(&mut self) -> SessionId {
        self.store.create_session()
    }

    pub fn select_session(&mut self, id: SessionId) {
        self.store.select_session(id);
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    /// Whether the current session is waiting for a reply.
    pub fn is_pending(&self) -> bool {
        self.store.current().is_some_and(|s| s.is_pending())
    }

    /// Accepts `text` as the next user message of the current session.
    ///
    /// Returns `None` without touching any state when `text` is blank or the
    /// current session already has a submission in flight. When no session is
    /// current, one is created first.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingSubmission> {
        if text.trim().is_empty() {
            return None;
        }
        if self.is_pending() {
            log::debug!("Submission ignored: a reply is already pending");
            return None;
        }

        let session_id = match self.store.current_id() {
            Some(id) => id,
            None => self.store.create_session(),
        };

        self.next_submission += 1;
        let id = SubmissionId::new(self.next_submission);

        let session = self.store.get_mut(session_id)?;
        session.transcript.push(ChatMessage::user(text));
        session.pending = Some(id);
        log::debug!("Submission {} started in session {}", id, session_id);

        Some(PendingSubmission {
            id,
            session: session_id,
            transcript: session.transcript.clone(),
        })
    }

    /// Records the outcome of submission `id` in `session`.
    ///
    /// Failures never propagate: they become the error bubble in the
    /// transcript. The session is idle again afterwards.
    pub fn finish_submit(
        &mut self,
        id: SubmissionId,
        session: SessionId,
        outcome: Result<String>,
    ) -> FinishOutcome {
        let Some(target) = self.store.get_mut(session) else {
            log::info!("Dropping reply for {}: session {} is gone", id, session);
            return FinishOutcome::Dropped;
        };
        if target.pending != Some(id) {
            log::warn!("Dropping reply for {}: not the pending submission", id);
            return FinishOutcome::Dropped;
        }

        target.pending = None;
        match outcome {
            Ok(reply) => {
                target.transcript.push(ChatMessage::assistant(reply));
                FinishOutcome::Replied
            }
            Err(e) => {
                log::error!("Submission {} failed: {}", id, e);
                target.transcript.push(ChatMessage::assistant(ERROR_REPLY));
                FinishOutcome::Failed
            }
        }
    }

    /// Submits `text` and waits for `backend` to answer.
    pub async fn submit(&mut self, text: &str, backend: &dyn CompletionBackend) -> SubmitOutcome {
        let Some(pending) = self.begin_submit(text) else {
            return SubmitOutcome::Skipped;
        };

        let outcome = backend.complete(&pending.transcript).await;
        match self.finish_submit(pending.id, pending.session, outcome) {
            FinishOutcome::Replied => SubmitOutcome::Replied,
            FinishOutcome::Failed | FinishOutcome::Dropped => SubmitOutcome::Failed,
        }
    }
}
