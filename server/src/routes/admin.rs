use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, put};
use axum::Router;
use palengke_common::audit::action_type;
use palengke_common::product::ProductStatus;
use palengke_common::role::{Role, UserStatus};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;
use crate::store::{AdminOrderUpdate, PageParams, ProductFilters};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(user_details))
        .route("/users/{id}/status", patch(set_user_status))
        .route("/users/{id}/role", patch(set_user_role))
        .route("/farmers/pending", get(pending_farmers))
        .route("/farmers/{id}/verify", patch(verify_farmer))
        .route("/products", get(list_products))
        .route("/products/{id}/status", patch(set_product_status))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", put(update_order))
        .route("/analytics", get(analytics))
        .route("/logs", get(logs))
        .route("/settings", put(update_settings))
}

/// Audit writes are best-effort: the primary change has already
/// committed, so a logging failure is reported but not surfaced.
async fn audit(
    state: &AppState,
    admin_id: i64,
    action: &'static str,
    target_id: Option<i64>,
    details: Value,
) {
    if let Err(err) = state
        .store
        .log_admin_action(admin_id, action, target_id, &details)
        .await
    {
        tracing::warn!(%err, action, "failed to write audit log entry");
    }
}

// Query strings are deserialized flat; paging fields are inlined in each
// params struct because serde_urlencoded cannot flatten nested structs.
#[derive(Debug, Deserialize)]
struct UserListParams {
    role: Option<Role>,
    status: Option<UserStatus>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let (users, pagination) = state
        .store
        .list_users(
            params.role,
            params.status,
            PageParams::new(params.page, params.limit),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "users": users,
        "pagination": pagination,
    })))
}

async fn user_details(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let user = state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let details = match user.role {
        Role::Farmer => {
            let farmer = state.store.farmer_by_user(id).await?;
            let stats = match &farmer {
                Some(f) => Some(state.store.farmer_stats(f.farmer_id).await?),
                None => None,
            };
            json!({ "farmer": farmer, "stats": stats })
        }
        Role::Customer => {
            json!({ "stats": state.store.customer_stats(id).await? })
        }
        Role::Admin => json!({}),
    };
    Ok(Json(json!({ "success": true, "user": user, "details": details })))
}

#[derive(Debug, Deserialize)]
struct UserStatusChange {
    status: UserStatus,
}

async fn set_user_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<UserStatusChange>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    if id == caller.user_id && change.status != UserStatus::Active {
        return Err(ApiError::InvalidOperation(
            "Admins cannot deactivate their own account".into(),
        ));
    }
    let before = state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let user = state.store.set_user_status(id, change.status).await?;
    audit(
        &state,
        caller.user_id,
        action_type::USER_STATUS_CHANGE,
        Some(id),
        json!({ "from": before.status, "to": change.status }),
    )
    .await;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[derive(Debug, Deserialize)]
struct UserRoleChange {
    role: Role,
}

async fn set_user_role(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<UserRoleChange>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    if id == caller.user_id {
        return Err(ApiError::InvalidOperation(
            "Admins cannot change their own role".into(),
        ));
    }
    let before = state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let (user, note) = state.store.set_user_role(id, change.role).await?;
    audit(
        &state,
        caller.user_id,
        action_type::USER_ROLE_CHANGE,
        Some(id),
        json!({ "from": before.role, "to": change.role, "registry": note }),
    )
    .await;
    Ok(Json(json!({ "success": true, "user": user, "note": note })))
}

async fn pending_farmers(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let (farmers, pagination) = state.store.pending_farmers(page).await?;
    Ok(Json(json!({
        "success": true,
        "farmers": farmers,
        "pagination": pagination,
    })))
}

#[derive(Debug, Deserialize)]
struct VerifyChange {
    verified: bool,
}

async fn verify_farmer(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<VerifyChange>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let farmer = state.store.set_farmer_verified(id, change.verified).await?;
    audit(
        &state,
        caller.user_id,
        action_type::FARMER_VERIFICATION,
        Some(id),
        json!({ "verified": change.verified }),
    )
    .await;
    tracing::info!(farmer_id = id, verified = change.verified, "farmer verification updated");
    Ok(Json(json!({ "success": true, "farmer": farmer })))
}

#[derive(Debug, Deserialize)]
struct AdminProductParams {
    category: Option<String>,
    barangay: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    status: Option<ProductStatus>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_products(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<AdminProductParams>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let filters = ProductFilters {
        category: params.category,
        barangay: params.barangay,
        min_price: params.min_price,
        max_price: params.max_price,
        status: params.status,
    };
    let (products, pagination) = state
        .store
        .admin_products(&filters, PageParams::new(params.page, params.limit))
        .await?;
    Ok(Json(json!({
        "success": true,
        "products": products,
        "pagination": pagination,
    })))
}

#[derive(Debug, Deserialize)]
struct ProductStatusChange {
    status: ProductStatus,
    reason: Option<String>,
}

/// Moderation: admins may set any product status. Removal and review
/// decisions land in the audit log with the stated reason.
async fn set_product_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<ProductStatusChange>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let before = state
        .store
        .product_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let product = state.store.set_product_status(id, change.status).await?;
    if matches!(
        change.status,
        ProductStatus::Removed | ProductStatus::UnderReview
    ) {
        audit(
            &state,
            caller.user_id,
            action_type::PRODUCT_STATUS_CHANGE,
            Some(id),
            json!({
                "from": before.status,
                "to": change.status,
                "reason": change.reason,
            }),
        )
        .await;
    }
    Ok(Json(json!({ "success": true, "product": product })))
}

#[derive(Debug, Deserialize)]
struct AdminOrderParams {
    status: Option<palengke_common::order::OrderStatus>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_orders(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<AdminOrderParams>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let (orders, pagination) = state
        .store
        .admin_orders(params.status, PageParams::new(params.page, params.limit))
        .await?;
    Ok(Json(json!({
        "success": true,
        "orders": orders,
        "pagination": pagination,
    })))
}

async fn update_order(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<AdminOrderUpdate>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let before = state
        .store
        .order_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    if let Some(status) = update.order_status {
        if !before.order_status.can_transition_to(status) {
            return Err(ApiError::InvalidOperation(format!(
                "Cannot change a {} order to {}",
                before.order_status, status
            )));
        }
    }
    if let Some(total) = update.total_amount {
        if total < 0.0 {
            return Err(ApiError::validation("Total amount cannot be negative"));
        }
    }
    let order = state.store.admin_update_order(id, &update).await?;
    audit(
        &state,
        caller.user_id,
        action_type::ORDER_UPDATE,
        Some(id),
        json!({
            "from_status": before.order_status,
            "to_status": order.order_status,
            "total_amount": order.total_amount,
        }),
    )
    .await;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn analytics(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let summary = state.store.analytics_summary().await?;
    Ok(Json(json!({ "success": true, "analytics": summary })))
}

fn default_settings() -> serde_json::Map<String, Value> {
    let defaults = json!({
        "platform_name": "Palengke",
        "commission_rate": 0.05,
        "min_order_amount": 50,
        "max_delivery_distance": 20,
        "support_email": "support@palengke.ph",
        "support_phone": "09123456789",
        "cod_enabled": true,
        "maintenance_mode": false,
    });
    match defaults {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

#[derive(Debug, Deserialize)]
struct SettingsUpdate {
    settings: Value,
}

/// Platform settings override. The merged map is returned and the
/// change audited; there is no settings table, the audit trail is the
/// durable record.
async fn update_settings(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let overrides = match update.settings {
        Value::Object(map) => map,
        _ => return Err(ApiError::validation("Invalid settings data")),
    };
    let mut settings = default_settings();
    for (key, value) in &overrides {
        settings.insert(key.clone(), value.clone());
    }
    audit(
        &state,
        caller.user_id,
        action_type::SYSTEM_SETTINGS_UPDATE,
        None,
        Value::Object(overrides),
    )
    .await;
    Ok(Json(json!({
        "success": true,
        "message": "System settings updated successfully",
        "settings": settings,
        "updated_at": chrono::Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
struct LogParams {
    action_type: Option<String>,
    admin_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn logs(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<LogParams>,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Admin])?;
    let (actions, pagination) = state
        .store
        .admin_actions(
            params.action_type.as_deref(),
            params.admin_id,
            PageParams::new(params.page, params.limit),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "logs": actions,
        "pagination": pagination,
    })))
}
