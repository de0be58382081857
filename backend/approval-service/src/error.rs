/// Error types for Approval Service
///
/// Every failure maps to one of these variants. Full detail goes to the
/// server log; callers only see `public_message()`.
use crate::store::StoreError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Result type for approval-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or incomplete request
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No row carries the requested id
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The store could not be reached or read
    #[error("{context}: {source}")]
    StoreUnavailable {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// A status update failed at some point after validation. Which cells
    /// landed is unknown; callers should re-fetch.
    #[error("Failed to update content {id} to {status}: {source}")]
    UpdateFailed {
        id: String,
        status: String,
        #[source]
        source: StoreError,
    },

    /// A sync batch failed; no per-item outcome is known.
    #[error("Failed to sync {count} items: {source}")]
    SyncFailed {
        count: usize,
        #[source]
        source: StoreError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn store_source(&self) -> Option<&StoreError> {
        match self {
            AppError::StoreUnavailable { source, .. }
            | AppError::UpdateFailed { source, .. }
            | AppError::SyncFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Message safe to return to API clients.
    pub fn public_message(&self) -> String {
        let timed_out = self.store_source().is_some_and(StoreError::is_timeout);
        let base = match self {
            AppError::ValidationError(msg) => return msg.clone(),
            AppError::NotFound(_) => return "Content not found".to_string(),
            AppError::StoreUnavailable { context, .. } => context.to_string(),
            AppError::UpdateFailed { .. } => "Failed to update status".to_string(),
            AppError::SyncFailed { .. } => "Failed to sync content".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        };
        if timed_out {
            format!("{} (store timed out)", base)
        } else {
            base
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable { .. }
            | AppError::UpdateFailed { .. }
            | AppError::SyncFailed { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("42".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::SyncFailed {
                count: 3,
                source: StoreError::Unavailable("down".into()),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn public_message_hides_store_detail() {
        let err = AppError::UpdateFailed {
            id: "42".into(),
            status: "Approved".into(),
            source: StoreError::Rejected {
                status: 403,
                message: "caller lacks permission on spreadsheet 1AbC".into(),
            },
        };
        assert_eq!(err.public_message(), "Failed to update status");
        assert!(err.to_string().contains("1AbC"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn timeouts_are_called_out() {
        let err = AppError::StoreUnavailable {
            context: "Failed to fetch content",
            source: StoreError::Timeout(Duration::from_secs(5)),
        };
        assert_eq!(err.public_message(), "Failed to fetch content (store timed out)");
    }
}
