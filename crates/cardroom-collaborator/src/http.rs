//! `reqwest`-backed collaborator client.

use cardroom_protocol::SessionId;
use serde::{Deserialize, Serialize};

use crate::{Collaborator, CollaboratorConfig, CollaboratorError};

const TEXT_PATH: &str = "/text";
const DISCONNECT_PATH: &str = "/disconnect";
const EXIT_PATH: &str = "/exit";

#[derive(Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct SessionBody<'a> {
    session_id: &'a SessionId,
}

/// Talks to the collaborator over HTTP with JSON bodies.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    config: CollaboratorConfig,
    client: reqwest::Client,
}

impl HttpCollaborator {
    /// Builds a client whose every request is bounded by `config.timeout`.
    pub fn new(config: CollaboratorConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CollaboratorError::ClientBuild)?;
        tracing::debug!(
            base_url = %config.base_url,
            timeout = ?config.timeout,
            "collaborator client ready"
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CollaboratorConfig {
        &self.config
    }

    async fn post_session(
        &self,
        path: &'static str,
        session_id: &SessionId,
    ) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(self.config.url(path))
            .json(&SessionBody { session_id })
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                path,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl Collaborator for HttpCollaborator {
    async fn fetch_prompt_text(&self) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .get(self.config.url(TEXT_PATH))
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(TEXT_PATH, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                path: TEXT_PATH,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(TEXT_PATH, e))?;
        if body.is_empty() {
            return Err(CollaboratorError::EmptyBody { path: TEXT_PATH });
        }

        let parsed: TextResponse = serde_json::from_slice(&body).map_err(|source| {
            CollaboratorError::InvalidBody {
                path: TEXT_PATH,
                source,
            }
        })?;
        if parsed.text.trim().is_empty() {
            return Err(CollaboratorError::EmptyBody { path: TEXT_PATH });
        }
        Ok(parsed.text)
    }

    async fn notify_disconnect(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CollaboratorError> {
        self.post_session(DISCONNECT_PATH, session_id).await
    }

    async fn delete_user(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CollaboratorError> {
        self.post_session(EXIT_PATH, session_id).await
    }
}
