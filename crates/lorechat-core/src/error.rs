//! Error taxonomy shared by the conversation core and the HTTP client.

use thiserror::Error;

/// Top-level error type for every lorechat operation.
///
/// No variant is fatal to the process; each one is scoped to the interaction
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The backend could not be reached (connection refused, timeout, ...).
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// A selection state-machine precondition was violated.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// The backend answered without a usable reply.
    #[error("the NPC did not reply")]
    EmptyReply,

    /// The result belongs to a selection that has since been superseded.
    #[error("stale response for selection token {token} (current token is {current})")]
    StaleResponse {
        /// Token the response was issued under.
        token: u64,
        /// Token of the live selection.
        current: u64,
    },

    /// Another backend operation is still in flight for this session.
    #[error("session busy: waiting for the previous request to finish")]
    SessionBusy,

    /// There is no unanswered player message to resend.
    #[error("nothing to retry: the last message has already been answered")]
    NothingToRetry,

    /// The backend responded with a non-success HTTP status.
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, or the raw body.
        message: String,
    },

    /// The backend responded with a body that could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A required field was missing from an admin request.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ChatError {
    /// Whether the error should be shown to the user.
    ///
    /// Stale responses are dropped silently.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleResponse { .. })
    }
}
