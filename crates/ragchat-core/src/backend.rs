use async_trait::async_trait;

use crate::error::Result;
use crate::state::ChatMessage;

/// Something that turns a transcript into the next assistant reply.
///
/// The gateway implements this with the Ollama client; the terminal client
/// implements it with an HTTP client that calls the gateway.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Requests a single, non-streamed completion for `transcript`.
    async fn complete(&self, transcript: &[ChatMessage]) -> Result<String>;

    /// Names of the models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>>;
}
