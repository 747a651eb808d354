//! Error types for the transport crate.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use ringkv_core::NodeDescriptor;
use ringkv_storage::StorageError;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while encoding, decoding or delivering messages.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// No message kind is bound to this method and path.
    #[error("Do not know how to parse request {method} {path}")]
    UnrecognizedRequest { method: String, path: String },

    /// The route is known but the body does not decode.
    #[error("Malformed body: {0}")]
    Malformed(String),

    /// A peer answered with a non-success status.
    #[error("{destination} answered {status}: {body}")]
    Status {
        destination: NodeDescriptor,
        status: u16,
        body: String,
    },

    #[error("Outbound queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Core(#[from] ringkv_core::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A storage request visited too many nodes without finding its owner.
    #[error("Request forwarded {0} times without reaching the owner")]
    ForwardLimit(u32),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Status a node answers with when handling a request fails this way.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnrecognizedRequest { .. } => StatusCode::NOT_FOUND,
            Self::Malformed(_) | Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::EmptyValue) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ForwardLimit(_) => StatusCode::LOOP_DETECTED,
            Self::Status { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let unknown = TransportError::UnrecognizedRequest {
            method: "DELETE".into(),
            path: "/join".into(),
        };
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            unknown.to_string(),
            "Do not know how to parse request DELETE /join"
        );

        assert_eq!(
            TransportError::Malformed("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TransportError::from(StorageError::EmptyValue).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TransportError::from(StorageError::ValueTooLarge { size: 2, limit: 1 }).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            TransportError::ForwardLimit(32).status_code(),
            StatusCode::LOOP_DETECTED
        );
    }
}
