use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use palengke_common::order::{DeliveryOption, Order, OrderItemRequest, OrderStatus};
use palengke_common::role::Role;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resolve_owner;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/customer", get(customer_orders))
        .route("/farmer", get(farmer_orders))
        .route("/{id}", get(detail))
        .route("/{id}/items", get(items))
        .route("/{id}/status", put(update_status))
}

#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    items: Vec<OrderItemRequest>,
    delivery_option: Option<DeliveryOption>,
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.require_role(&[Role::Customer])?;
    let (order, items) = state
        .store
        .create_order(caller.user_id, &req.items, req.delivery_option)
        .await?;
    tracing::info!(
        order_id = order.order_id,
        customer_id = caller.user_id,
        total = order.total_amount,
        "order placed"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "order": order, "items": items })),
    ))
}

async fn customer_orders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Customer])?;
    let orders = state.store.orders_by_customer(caller.user_id).await?;
    let mut enriched = Vec::with_capacity(orders.len());
    for order in orders {
        let items = state.store.order_items(order.order.order_id).await?;
        enriched.push(json!({ "order": order, "items": items }));
    }
    Ok(Json(json!({
        "success": true,
        "count": enriched.len(),
        "orders": enriched,
    })))
}

#[derive(Debug, Deserialize)]
struct FarmerOrderParams {
    status: Option<OrderStatus>,
}

async fn farmer_orders(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<FarmerOrderParams>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let orders = state
        .store
        .orders_by_farmer(farmer.farmer_id, params.status)
        .await?;
    Ok(Json(json!({
        "success": true,
        "count": orders.len(),
        "orders": orders,
    })))
}

/// The order's customer, the owning farmer, or an admin may read it.
async fn load_order_for(
    state: &AppState,
    caller: &AuthUser,
    order_id: i64,
) -> Result<Order, ApiError> {
    let order = state
        .store
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    if caller.role == Role::Admin || order.customer_id == caller.user_id {
        return Ok(order);
    }
    if caller.role == Role::Farmer {
        if let Some(farmer) = state.store.farmer_by_user(caller.user_id).await? {
            if farmer.farmer_id == order.farmer_id {
                return Ok(order);
            }
        }
    }
    Err(ApiError::Forbidden("You do not have access to this order".into()))
}

async fn detail(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let order = load_order_for(&state, &caller, id).await?;
    let items = state.store.order_items(id).await?;
    Ok(Json(json!({ "success": true, "order": order, "items": items })))
}

async fn items(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    load_order_for(&state, &caller, id).await?;
    let items = state.store.order_items(id).await?;
    Ok(Json(json!({ "success": true, "items": items })))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: OrderStatus,
}

/// Only the owning farmer or an admin moves an order along. DELIVERED
/// and CANCELLED are final.
async fn update_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Value>, ApiError> {
    let order = state
        .store
        .order_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    if caller.role != Role::Admin {
        let farmer = resolve_owner(&state, &caller).await?;
        if farmer.farmer_id != order.farmer_id {
            return Err(ApiError::Forbidden("You do not own this order".into()));
        }
    }
    if !order.order_status.can_transition_to(change.status) {
        return Err(ApiError::InvalidOperation(format!(
            "Cannot change a {} order to {}",
            order.order_status, change.status
        )));
    }
    let order = state.store.set_order_status(id, change.status).await?;
    tracing::info!(order_id = id, status = %order.order_status, "order status updated");
    Ok(Json(json!({ "success": true, "order": order })))
}
