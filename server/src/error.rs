use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use palengke_common::role::Role;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for every handler and store operation.
///
/// Each variant carries the client-facing message; the HTTP status is
/// derived in [`IntoResponse`]. Database and internal failures are logged
/// and collapsed to a generic 500 so details never leak to callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    /// Authenticated but holding the wrong role. The response discloses
    /// the caller's actual role and the roles that would be accepted.
    #[error("Access denied")]
    RoleDenied { actual: Role, required: Vec<Role> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The first-admin bootstrap endpoint was called after an admin exists.
    #[error("Admin account already exists. Use the admin registration endpoint.")]
    AlreadyInitialized,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("All items in an order must come from the same farmer")]
    CrossFarmerOrder,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Conflict(_)
            | ApiError::InvalidOperation(_)
            | ApiError::InsufficientStock { .. }
            | ApiError::CrossFarmerOrder => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::RoleDenied { .. } | ApiError::AlreadyInitialized => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::RoleDenied { actual, required } => {
                let required: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                json!({
                    "success": false,
                    "error": format!("Access denied. Required roles: {}", required.join(", ")),
                    "your_role": actual.as_str(),
                    "required_roles": required,
                })
            }
            ApiError::Database(err) => {
                tracing::error!(%err, "database failure");
                json!({ "success": false, "error": "Server error" })
            }
            ApiError::Internal(err) => {
                tracing::error!(%err, "internal failure");
                json!({ "success": false, "error": "Server error" })
            }
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("bcrypt failure: {err}"))
    }
}
