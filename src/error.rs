//! Application error type and its HTTP mapping.
//!
//! Every layer returns [`AppError`]. Handlers let it propagate and axum turns it
//! into a JSON error body via [`IntoResponse`].

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

/// JSON envelope for error responses.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error code plus a human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Identifier columns guarded by a unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierField {
    Slug,
    ShortId,
}

impl IdentifierField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::ShortId => "shortId",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    RateLimited { message: String, details: Value },

    /// Retryable failure: store timeout, exhausted identifier allocation, upstream outage.
    #[error("{message}")]
    Unavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    /// Unique-index violation on one of the generated identifiers.
    pub fn identifier_conflict(field: IdentifierField) -> Self {
        Self::Conflict {
            message: format!("Duplicate {}", field.as_str()),
            details: json!({ "field": field.as_str() }),
        }
    }

    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns the identifier whose unique index was violated, if this is such a conflict.
    pub fn conflict_field(&self) -> Option<IdentifierField> {
        match self {
            Self::Conflict { details, .. } => match details.get("field").and_then(Value::as_str) {
                Some("slug") => Some(IdentifierField::Slug),
                Some("shortId") => Some(IdentifierField::ShortId),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unavailable { .. } => "unavailable",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Converts the error into its serializable form.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (message, details) = match self {
            Self::Validation { message, details }
            | Self::Unauthorized { message, details }
            | Self::Forbidden { message, details }
            | Self::NotFound { message, details }
            | Self::Conflict { message, details }
            | Self::RateLimited { message, details }
            | Self::Unavailable { message, details }
            | Self::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code: self.code(),
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return match db.constraint() {
                Some("smartlinks_slug_key") => Self::identifier_conflict(IdentifierField::Slug),
                Some("smartlinks_short_id_key") => {
                    Self::identifier_conflict(IdentifierField::ShortId)
                }
                other => Self::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": other }),
                ),
            };
        }

        if matches!(e, sqlx::Error::PoolTimedOut) {
            return Self::unavailable("Database is busy, try again", json!({}));
        }

        tracing::error!(error = %e, "Database error");
        Self::internal("Database error", json!({}))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid JSON body", json!({ "reason": rejection.body_text() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: serde_json::Map<String, Value> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), json!(messages))
            })
            .collect();

        let details = if fields.is_empty() {
            // Nested (list/struct) errors have no flat field entry.
            json!({ "errors": errors.to_string() })
        } else {
            json!({ "fields": fields })
        };

        Self::bad_request("Validation failed", details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::forbidden("x", json!({})).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::unavailable("x", json!({})).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::rate_limited("x", json!({})).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_identifier_conflict_round_trips_field() {
        let err = AppError::identifier_conflict(IdentifierField::ShortId);
        assert_eq!(err.conflict_field(), Some(IdentifierField::ShortId));

        let err = AppError::identifier_conflict(IdentifierField::Slug);
        assert_eq!(err.conflict_field(), Some(IdentifierField::Slug));
    }

    #[test]
    fn test_plain_conflict_has_no_field() {
        let err = AppError::conflict("dup", json!({ "constraint": "other" }));
        assert_eq!(err.conflict_field(), None);
        assert_eq!(AppError::not_found("x", json!({})).conflict_field(), None);
    }

    #[test]
    fn test_retryable() {
        assert!(AppError::unavailable("x", json!({})).is_retryable());
        assert!(!AppError::internal("x", json!({})).is_retryable());
    }

    #[test]
    fn test_display_uses_message() {
        let err = AppError::not_found("SmartLink not found", json!({}));
        assert_eq!(err.to_string(), "SmartLink not found");
        assert_eq!(err.to_error_info().code, "not_found");
    }
}
