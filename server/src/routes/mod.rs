use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde_json::json;
use tower_http::cors::CorsLayer;

use palengke_common::farmer::Farmer;
use palengke_common::role::Role;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

mod admin;
mod auth;
mod farmers;
mod orders;
mod products;
mod recommendations;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::routes())
        .nest("/api/products", products::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/farmers", farmers::routes())
        .nest("/api/admin", admin::routes())
        .nest("/api/recommendations", recommendations::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve the farm profile the caller owns. Every farmer-scoped
/// mutation goes through here, so the role gate and the ownership
/// lookup cannot drift apart.
pub(crate) async fn resolve_owner(
    state: &AppState,
    caller: &AuthUser,
) -> Result<Farmer, ApiError> {
    caller.require_role(&[Role::Farmer])?;
    state
        .store
        .farmer_by_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("No farmer profile for this account".into()))
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|err| ApiError::Internal(format!("store unreachable: {err}")))?;
    Ok(Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
