//! Client for the external persistence and prompt service.
//!
//! The sync engine never owns user records or prompt content. It reaches
//! out for three things: the prompt text for a new round, and the
//! disconnect and exit notifications that keep the persistence side in
//! step with the live registry.
//!
//! The engine depends on the [`Collaborator`] trait, not on HTTP, so tests
//! can swap in an in-memory implementation. [`HttpCollaborator`] is the
//! production one.

mod config;
mod error;
mod http;

pub use config::{CollaboratorConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::CollaboratorError;
pub use http::HttpCollaborator;

use std::future::Future;

use cardroom_protocol::SessionId;

/// The calls the sync engine makes to the outside world.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the engine shares one collaborator
/// across every connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use cardroom_collaborator::{Collaborator, CollaboratorError};
/// use cardroom_protocol::SessionId;
///
/// /// Always hands out the same prompt and ignores notifications.
/// struct FixedPrompt(&'static str);
///
/// impl Collaborator for FixedPrompt {
///     async fn fetch_prompt_text(&self) -> Result<String, CollaboratorError> {
///         Ok(self.0.to_string())
///     }
///
///     async fn notify_disconnect(
///         &self,
///         _: &SessionId,
///     ) -> Result<(), CollaboratorError> {
///         Ok(())
///     }
///
///     async fn delete_user(&self, _: &SessionId) -> Result<(), CollaboratorError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Collaborator: Send + Sync + 'static {
    /// Fetches the prompt for a new round.
    ///
    /// # Errors
    /// Network failure, timeout, non-2xx status, or a response without
    /// text. An empty prompt is never returned as `Ok`.
    fn fetch_prompt_text(
        &self,
    ) -> impl Future<Output = Result<String, CollaboratorError>> + Send;

    /// Tells the persistence side that a session disconnected.
    fn notify_disconnect(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), CollaboratorError>> + Send;

    /// Asks the persistence side to delete the session's user record.
    fn delete_user(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), CollaboratorError>> + Send;
}
