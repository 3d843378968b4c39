//! Request-body extraction with the error contract applied.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// Drop-in for `axum::Json` in handler arguments. A body that fails to
/// parse, including an unknown enum value like a made-up status string,
/// becomes a 400 with the usual `{"success": false, "error": ...}`
/// shape instead of axum's plain-text 422 rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(map_rejection(rejection)),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn map_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => ApiError::validation(err.body_text()),
        JsonRejection::JsonSyntaxError(err) => ApiError::validation(err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::validation("Request body must be JSON")
        }
        other => ApiError::validation(other.body_text()),
    }
}
