//! reqwest implementation of [`ChatBackend`]

use super::error::{TransportError, TransportResult};
use super::traits::{ChatBackend, ChunkStream};
use crate::models::{
    Message, PingResponse, SendMessageRequest, Session, SessionId, SessionTitle,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// FastAPI-style error body: `{"detail": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    /// Create a backend with a default reqwest client (no timeouts)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create a backend honouring an optional connect timeout.
    ///
    /// Only connection setup is bounded: a streamed reply may legitimately
    /// stay open for as long as the model keeps generating.
    pub fn with_connect_timeout(
        base_url: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> TransportResult<Self> {
        let base_url = base_url.into();
        let mut builder = Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|source| TransportError::Http {
            url: base_url.clone(),
            source,
        })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn item_url(&self, collection: &str, id: &SessionId) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(id.as_str())
        )
    }

    /// Turn transport failures and non-2xx statuses into `TransportError`
    async fn check(
        url: &str,
        result: Result<Response, reqwest::Error>,
    ) -> TransportResult<Response> {
        let resp = result.map_err(|source| TransportError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body,
        };
        Err(TransportError::Status { status, detail })
    }

    async fn json<T: DeserializeOwned>(url: &str, resp: Response) -> TransportResult<T> {
        let bytes = resp.bytes().await.map_err(|source| TransportError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_sessions(&self) -> TransportResult<Vec<Session>> {
        let url = self.url("/sessions/");
        debug!(%url, "GET sessions");
        let resp = Self::check(&url, self.client.get(&url).send().await).await?;
        Self::json(&url, resp).await
    }

    async fn create_session(&self, title: &str) -> TransportResult<Session> {
        let url = self.url("/sessions/");
        debug!(%url, title, "POST session");
        let body = SessionTitle {
            title: title.to_string(),
        };
        let resp = Self::check(&url, self.client.post(&url).json(&body).send().await).await?;
        Self::json(&url, resp).await
    }

    async fn rename_session(&self, id: &SessionId, title: &str) -> TransportResult<Session> {
        let url = self.item_url("sessions", id);
        debug!(%url, title, "PUT session");
        let body = SessionTitle {
            title: title.to_string(),
        };
        let resp = Self::check(&url, self.client.put(&url).json(&body).send().await).await?;
        Self::json(&url, resp).await
    }

    async fn delete_session(&self, id: &SessionId) -> TransportResult<()> {
        let url = self.item_url("sessions", id);
        debug!(%url, "DELETE session");
        Self::check(&url, self.client.delete(&url).send().await).await?;
        Ok(())
    }

    async fn history(&self, id: &SessionId) -> TransportResult<Vec<Message>> {
        let url = self.item_url("msgs", id);
        debug!(%url, "GET history");
        let resp = Self::check(&url, self.client.get(&url).send().await).await?;
        Self::json(&url, resp).await
    }

    async fn send_message(
        &self,
        id: &SessionId,
        text: &str,
        model: &str,
    ) -> TransportResult<ChunkStream> {
        let url = self.item_url("msgs", id);
        debug!(%url, model, "POST message (streamed reply)");
        let body = SendMessageRequest {
            user_msg: text.to_string(),
            model: model.to_string(),
        };
        let resp = Self::check(&url, self.client.post(&url).json(&body).send().await).await?;

        let chunks = resp
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Stream(e.to_string()))
            })
            .boxed();
        Ok(chunks)
    }

    async fn ping(&self) -> TransportResult<String> {
        let url = self.url("/");
        let resp = Self::check(&url, self.client.get(&url).send().await).await?;
        let ping: PingResponse = Self::json(&url, resp).await?;
        Ok(ping.message)
    }
}
