pub mod ai;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod state;
pub mod wire;

// Re-export main types for convenience
pub use ai::OllamaClient;
pub use backend::CompletionBackend;
pub use config::Config;
pub use controller::{FinishOutcome, PendingSubmission, SubmissionController, SubmitOutcome};
pub use error::{ChatError, Result};
pub use session::SessionStore;
pub use state::{ChatMessage, ChatRole, ChatSession, SessionId, SubmissionId, ERROR_REPLY};
pub use wire::{ChatReply, ChatRequest, ErrorBody, ModelList};
