//! Error types for collaborator calls.

/// Errors from calls to the external collaborator service.
///
/// For the prompt fetch these abort the round start for that trigger. For
/// disconnect and exit notifications they are logged and otherwise ignored.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The request never got a response (refused, reset, DNS, ...).
    #[error("request to {path} failed: {source}")]
    Network {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// No response within the configured timeout.
    #[error("request to {path} timed out")]
    Timeout { path: &'static str },

    /// The service answered with a non-2xx status.
    #[error("{path} returned status {status}")]
    Status { path: &'static str, status: u16 },

    /// The prompt response carried no text.
    #[error("{path} returned an empty body")]
    EmptyBody { path: &'static str },

    /// The response body wasn't the expected JSON shape.
    #[error("{path} returned an invalid body: {source}")]
    InvalidBody {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client itself couldn't be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CollaboratorError {
    /// Classifies a `reqwest` failure for `path`.
    pub(crate) fn from_reqwest(path: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { path }
        } else {
            Self::Network { path, source }
        }
    }
}
