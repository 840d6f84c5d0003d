use std::time::Duration;

use async_trait::async_trait;
use ragchat_core::{
    ChatError, ChatMessage, ChatReply, ChatRequest, CompletionBackend, ErrorBody, ModelList,
};
use reqwest::Client;

/// HTTP client for the completion gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> ragchat_core::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionBackend for GatewayClient {
    async fn complete(&self, transcript: &[ChatMessage]) -> ragchat_core::Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            messages: transcript.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            // The gateway explains failures in an `{ error }` body
            return Err(match response.json::<ErrorBody>().await {
                Ok(body) => ChatError::Upstream(body.error),
                Err(_) => ChatError::Status {
                    url,
                    status: status.as_u16(),
                },
            });
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;
        Ok(reply.message)
    }

    async fn list_models(&self) -> ragchat_core::Result<Vec<String>> {
        let url = format!("{}/api/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;
        Ok(list.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use ragchat_core::SubmissionController;
    use serde_json::{json, Value};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> GatewayClient {
        GatewayClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_complete_reads_message_field() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["messages"][0]["content"], "hello");
                Json(json!({"message": "hi there"}))
            }),
        );
        let base = spawn(router).await;

        let reply = client(&base).complete(&[ChatMessage::user("hello")]).await.unwrap();
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn test_complete_surfaces_gateway_error() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to get response from Ollama"})),
                )
            }),
        );
        let base = spawn(router).await;

        let err = client(&base).complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(
            matches!(err, ChatError::Upstream(msg) if msg == "Failed to get response from Ollama")
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_unexpected_shape() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { Json(json!({"model": "llama2", "done": true})) }),
        );
        let base = spawn(router).await;

        let err = client(&base).complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_list_models() {
        let router = Router::new().route(
            "/api/models",
            get(|| async { Json(json!({"models": ["llama2"]})) }),
        );
        let base = spawn(router).await;

        assert_eq!(client(&base).list_models().await.unwrap(), vec!["llama2"]);
    }

    #[tokio::test]
    async fn test_end_to_end_through_stub_gateway() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { Json(json!({"message": "hi there"})) }),
        );
        let base = spawn(router).await;
        let gateway = client(&base);

        let mut controller = SubmissionController::new();
        controller.create_session();
        controller.submit("hello", &gateway).await;

        assert_eq!(
            controller.store().transcript(),
            &[ChatMessage::user("hello"), ChatMessage::assistant("hi there")]
        );
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_becomes_error_bubble() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let gateway = client(&format!("http://{}", addr));

        let mut controller = SubmissionController::new();
        controller.create_session();
        controller.submit("hello", &gateway).await;

        let transcript = controller.store().transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1], ChatMessage::assistant(ragchat_core::ERROR_REPLY));
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out_into_error_bubble() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"message": "too late"}))
            }),
        );
        let base = spawn(router).await;
        let gateway = GatewayClient::new(&base, Duration::from_secs(1)).unwrap();

        let err = gateway.complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout { .. }), "got {:?}", err);

        let mut controller = SubmissionController::new();
        controller.create_session();
        controller.submit("hello", &gateway).await;

        let transcript = controller.store().transcript();
        assert_eq!(transcript.last(), Some(&ChatMessage::assistant(ragchat_core::ERROR_REPLY)));
        assert!(!controller.is_pending());
    }
}
