//! Error types for aptible-control.

use thiserror::Error;

/// Result type using DeployError.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors surfaced by the transport, the link resolver, the poller and the
/// resource assemblers.
///
/// A platform-side operation ending in `failed` is not an error at the
/// poller level; see [`crate::OperationPoller::wait_for_operation`].
#[derive(Debug, Error)]
pub enum DeployError {
    /// The platform answered 404 for a resource that is not soft-deletable.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// The platform answered 401.
    #[error("authentication failed, make sure you have the correct auth token")]
    Authentication,

    /// A mandatory field or link was absent from an otherwise successful payload.
    #[error("incomplete {resource} payload: missing {field}")]
    IncompleteResource {
        resource: &'static str,
        field: &'static str,
    },

    /// A relationship href without a trailing numeric segment.
    #[error("malformed link: {0}")]
    MalformedLink(String),

    /// The target of a relationship href could not be fetched.
    #[error("failed to resolve link {href}: {source}")]
    LinkResolution {
        href: String,
        #[source]
        source: Box<DeployError>,
    },

    /// The operation never reached a terminal status within the poll bound.
    #[error("operation {operation_id} did not finish after {attempts} status checks")]
    PollTimeout { operation_id: i64, attempts: u32 },

    /// The platform reported the operation as failed in a flow that must
    /// return a resource.
    #[error("operation {operation_id} failed")]
    OperationFailed { operation_id: i64 },

    /// Any other non-success HTTP status.
    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent or the response could not be read.
    #[error("request error: {0}")]
    Request(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),
}

impl DeployError {
    /// True for a 404 classified by the transport.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeployError::NotFound { .. })
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DeployError::Serialization(err.to_string())
        } else {
            DeployError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Serialization(err.to_string())
    }
}
