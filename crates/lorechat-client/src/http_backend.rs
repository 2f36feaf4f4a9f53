//! `reqwest` implementation of the backend ports.

use std::time::Duration;

use async_trait::async_trait;
use lorechat_core::backend::{
    DialogueBackend, DialogueTurn, Lore, NewCharacter, NewLocation, TurnReply, TurnRequest,
    WorldAdmin, WorldSource,
};
use lorechat_core::error::ChatError;
use lorechat_core::model::{Character, CharacterId, Location, LocationId};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Client for the dialogue backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url` whose requests give up after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// The base URL requests are issued against, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// FastAPI error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ChatError> {
    let body = send(request).await?;
    serde_json::from_str(&body).map_err(|err| ChatError::MalformedResponse(err.to_string()))
}

async fn send(request: RequestBuilder) -> Result<String, ChatError> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(backend_error(status, &body))
    }
}

fn transport(err: reqwest::Error) -> ChatError {
    debug!(error = %err, timeout = err.is_timeout(), "request failed");
    ChatError::NetworkFailure(err.to_string())
}

fn backend_error(status: StatusCode, body: &str) -> ChatError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_owned(),
        Err(_) => body.trim().to_owned(),
    };
    ChatError::Backend {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl WorldSource for HttpBackend {
    #[instrument(skip(self))]
    async fn list_locations(&self) -> Result<Vec<Location>, ChatError> {
        fetch(self.client.get(self.url("/locations"))).await
    }

    #[instrument(skip(self))]
    async fn list_characters(&self) -> Result<Vec<Character>, ChatError> {
        fetch(self.client.get(self.url("/characters"))).await
    }
}

#[async_trait]
impl DialogueBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn dialogue_history(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<DialogueTurn>, ChatError> {
        let url = self.url(&format!("/dialogue/{character_id}"));
        fetch(self.client.get(url)).await
    }

    #[instrument(
        skip_all,
        fields(character_id = request.character_id, location_id = request.location_id)
    )]
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, ChatError> {
        fetch(self.client.post(self.url("/dialogue")).query(request)).await
    }
}

#[async_trait]
impl WorldAdmin for HttpBackend {
    #[instrument(skip(self))]
    async fn lore(&self) -> Result<Lore, ChatError> {
        fetch(self.client.get(self.url("/lore"))).await
    }

    #[instrument(skip_all)]
    async fn replace_lore(&self, content: &str) -> Result<Lore, ChatError> {
        let body = Lore {
            content: content.to_owned(),
        };
        fetch(self.client.put(self.url("/lore")).json(&body)).await
    }

    #[instrument(skip_all, fields(name = %location.name))]
    async fn create_location(&self, location: &NewLocation) -> Result<Location, ChatError> {
        fetch(self.client.post(self.url("/locations")).json(location)).await
    }

    #[instrument(skip(self))]
    async fn delete_location(&self, id: LocationId) -> Result<(), ChatError> {
        send(self.client.delete(self.url(&format!("/locations/{id}"))))
            .await
            .map(drop)
    }

    #[instrument(skip_all, fields(name = %character.name))]
    async fn create_character(&self, character: &NewCharacter) -> Result<Character, ChatError> {
        fetch(self.client.post(self.url("/characters")).json(character)).await
    }

    #[instrument(skip(self))]
    async fn delete_character(&self, id: CharacterId) -> Result<(), ChatError> {
        send(self.client.delete(self.url(&format!("/characters/{id}"))))
            .await
            .map(drop)
    }
}
