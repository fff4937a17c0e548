use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::api::{ChatBackend, ChatDetail, ChatId, ChatRequest, ChatResponse, ChatSummary, StoredMessage};
use crate::error::BackendError;

/// [`ChatBackend`] over HTTP. Keeps cookies so the server can tie requests
/// to one session.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let parsed = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `path` must be a fixed route; ids go through [`Self::chat_url`].
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// `/api/chat/{id}[/{action}]`, with the id percent-encoded as a single
    /// path segment.
    fn chat_url(&self, id: &ChatId, action: Option<&str>) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BackendError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(["api", "chat", id.as_str()]);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    async fn post_empty(&self, url: Url) -> Result<Response, BackendError> {
        let response = self.client.post(url).send().await?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, BackendError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
        status => Err(BackendError::Status(status)),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, message: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&ChatRequest { message })
            .send()
            .await?;

        // Any non-2xx is a model error, whatever the body says.
        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let chat: ChatResponse = decode(response).await?;
        Ok(chat.response)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError> {
        let response = self.client.get(self.url("/api/chats")).send().await?;
        decode(check_status(response)?).await
    }

    async fn load_chat(&self, id: &ChatId) -> Result<(), BackendError> {
        self.post_empty(self.chat_url(id, Some("load"))?).await?;
        Ok(())
    }

    async fn delete_chat(&self, id: &ChatId) -> Result<(), BackendError> {
        self.post_empty(self.chat_url(id, Some("delete"))?).await?;
        Ok(())
    }

    async fn new_chat(&self) -> Result<(), BackendError> {
        let response = self.client.post(self.url("/api/chat/new")).send().await?;
        check_status(response)?;
        Ok(())
    }

    async fn chat_messages(&self, id: &ChatId) -> Result<Vec<StoredMessage>, BackendError> {
        let response = self.client.get(self.chat_url(id, None)?).send().await?;
        let detail: ChatDetail = decode(check_status(response)?).await?;
        Ok(detail.messages)
    }
}
