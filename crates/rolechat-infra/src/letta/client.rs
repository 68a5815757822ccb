//! LettaAgentClient -- concrete [`AgentClient`] implementation for Letta.
//!
//! Talks to the Letta REST API: `POST /v1/agents` to create an agent,
//! `GET /v1/agents` to list them, and
//! `POST /v1/agents/{id}/messages/stream` for token-streamed chat.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use rolechat_core::upstream::{AgentClient, ByteStream};
use rolechat_types::agent::{HUMAN_LABEL, MemoryBlock, NewAgent, PERSONA_LABEL, RemoteAgent};
use rolechat_types::config::UpstreamConfig;
use rolechat_types::error::UpstreamError;

use super::types::{
    AgentList, AgentState, CreateAgentRequest, LettaMessageCreate, StreamMessagesRequest,
};

/// Letta agent provider client.
///
/// Not `Debug`: holds the API key.
pub struct LettaAgentClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    embedding: String,
}

impl LettaAgentClient {
    /// Build a client from configuration.
    ///
    /// Without an API key requests go out unauthenticated, which only works
    /// against self-hosted servers.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))?;

        if config.api_key.is_none() {
            tracing::warn!("no upstream API key configured, requests will be unauthenticated");
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone().map(SecretString::from),
            base_url: normalize_base_url(&config.base_url),
            model: config.model.clone(),
            embedding: config.embedding.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Strip trailing slashes so paths can be appended verbatim.
fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

impl AgentClient for LettaAgentClient {
    async fn create_agent(&self, agent: &NewAgent) -> Result<String, UpstreamError> {
        let body = CreateAgentRequest {
            name: agent.name.clone(),
            memory_blocks: vec![
                MemoryBlock::new(PERSONA_LABEL, agent.persona.clone()),
                MemoryBlock::new(HUMAN_LABEL, agent.human.clone()),
            ],
            model: self.model.clone(),
            embedding: self.embedding.clone(),
        };

        let response = self
            .send(self.client.post(self.url("/v1/agents")).json(&body))
            .await?;

        let state: AgentState = response
            .json()
            .await
            .map_err(|e| UpstreamError::Deserialization(format!("failed to parse agent: {e}")))?;

        tracing::debug!(agent_id = %state.id, "upstream agent created");
        Ok(state.id)
    }

    async fn list_agents(&self) -> Result<Vec<RemoteAgent>, UpstreamError> {
        let response = self.send(self.client.get(self.url("/v1/agents"))).await?;

        let list: AgentList = response
            .json()
            .await
            .map_err(|e| {
                UpstreamError::Deserialization(format!("failed to parse agent list: {e}"))
            })?;

        Ok(list.into_agents().into_iter().map(RemoteAgent::from).collect())
    }

    async fn open_chat_stream(
        &self,
        agent_id: &str,
        text: &str,
    ) -> Result<ByteStream, UpstreamError> {
        let body = StreamMessagesRequest {
            messages: vec![LettaMessageCreate {
                role: "user".to_string(),
                content: text.to_string(),
            }],
            stream_tokens: true,
        };

        let request = self
            .client
            .post(self.url(&format!("/v1/agents/{agent_id}/messages/stream")))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);
        let response = self.send(request).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| UpstreamError::Stream(format!("response body read: {e}")))
            });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Json;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use serde_json::{Value, json};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        // Trailing slash on purpose: the client must normalize it.
        format!("http://{addr}/")
    }

    fn config(base_url: String, api_key: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            base_url,
            api_key: api_key.map(str::to_owned),
            ..UpstreamConfig::default()
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer sk-test")
    }

    async fn create_handler(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "missing key").into_response();
        }
        let blocks_ok = body["memory_blocks"][0] == json!({"label": "persona", "value": "p"})
            && body["memory_blocks"][1] == json!({"label": "human", "value": "h"})
            && body["model"] == "openai/gpt-4o-mini";
        if !blocks_ok {
            return (StatusCode::BAD_REQUEST, body.to_string()).into_response();
        }
        Json(json!({ "id": "agent-123", "name": body["name"] })).into_response()
    }

    async fn list_handler() -> Json<Value> {
        Json(json!([
            { "id": "agent-1", "name": "Luna",
              "memory": { "blocks": [ { "label": "persona", "value": "curious" } ] } },
            { "id": "agent-2", "name": "Sol" }
        ]))
    }

    async fn stream_handler(
        Path(agent_id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        if agent_id == "agent-missing" {
            return (StatusCode::NOT_FOUND, "agent not found").into_response();
        }
        if !authorized(&headers) || body["stream_tokens"] != true {
            return StatusCode::BAD_REQUEST.into_response();
        }
        let echo = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
        let chunks: Vec<Result<String, std::io::Error>> = vec![
            Ok(format!("data: {{\"content\":\"{echo}\"}}\n\n")),
            Ok("data: [DONE]\n\n".to_string()),
        ];
        Response::builder()
            .header("content-type", "text/event-stream")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap()
    }

    fn router() -> Router {
        Router::new()
            .route("/v1/agents", post(create_handler).get(list_handler))
            .route("/v1/agents/{agent_id}/messages/stream", post(stream_handler))
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.letta.com///"), "https://api.letta.com");
        assert_eq!(normalize_base_url(" http://localhost:8283 "), "http://localhost:8283");
    }

    #[tokio::test]
    async fn test_create_agent_sends_blocks_and_bearer() {
        let base = serve(router()).await;
        let client = LettaAgentClient::new(&config(base, Some("sk-test"))).unwrap();

        let id = client
            .create_agent(&NewAgent {
                name: "Bot".into(),
                persona: "p".into(),
                human: "h".into(),
            })
            .await
            .unwrap();
        assert_eq!(id, "agent-123");
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_status_and_body() {
        let base = serve(router()).await;
        let client = LettaAgentClient::new(&config(base, None)).unwrap();

        let err = client
            .create_agent(&NewAgent {
                name: "Bot".into(),
                persona: "p".into(),
                human: "h".into(),
            })
            .await
            .unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "missing key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_agents_normalizes_blocks() {
        let base = serve(router()).await;
        let client = LettaAgentClient::new(&config(base, Some("sk-test"))).unwrap();

        let agents = client.list_agents().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].persona(), "curious");
        assert_eq!(agents[1].name, "Sol");
        assert!(agents[1].blocks.is_empty());
    }

    #[tokio::test]
    async fn test_open_chat_stream_yields_raw_bytes() {
        let base = serve(router()).await;
        let client = LettaAgentClient::new(&config(base, Some("sk-test"))).unwrap();

        let mut stream = client.open_chat_stream("agent-1", "hi").await.unwrap();
        let mut raw = Vec::new();
        while let Some(chunk) = stream.next().await {
            raw.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(raw, b"data: {\"content\":\"hi\"}\n\ndata: [DONE]\n\n".to_vec());
    }

    #[tokio::test]
    async fn test_open_chat_stream_non_success() {
        let base = serve(router()).await;
        let client = LettaAgentClient::new(&config(base, Some("sk-test"))).unwrap();

        let err = client.open_chat_stream("agent-missing", "hi").await.err().unwrap();
        assert!(matches!(
            err,
            UpstreamError::Status { status: 404, ref body } if body == "agent not found"
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LettaAgentClient::new(&config(format!("http://{addr}"), None)).unwrap();
        let err = client.list_agents().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
