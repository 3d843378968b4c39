use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Router;
use palengke_common::feedback::RatingStats;
use palengke_common::product::ProductStatus;
use palengke_common::role::Role;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resolve_owner;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;
use crate::store::{NewProduct, ProductFilters, ProductUpdate};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/category/{category}", get(by_category))
        .route("/mine", get(mine))
        .route("/{id}", get(detail).put(update).delete(remove))
        .route("/{id}/status", patch(set_status))
        .route("/{id}/feedback", post(leave_feedback))
}

async fn list(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<Value>, ApiError> {
    let products = state.store.list_public_products(&filters).await?;
    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "products": products,
    })))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let term = params.query.trim();
    if term.is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }
    let products = state.store.search_products(term).await?;
    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "products": products,
    })))
}

async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let filters = ProductFilters {
        category: Some(category),
        ..ProductFilters::default()
    };
    let products = state.store.list_public_products(&filters).await?;
    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "products": products,
    })))
}

async fn mine(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let products = state.store.products_by_farmer(farmer.farmer_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "products": products,
    })))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    if !farmer.verified_status {
        return Err(ApiError::Forbidden(
            "Farmer profile must be verified before listing products".into(),
        ));
    }
    if new.product_name.trim().is_empty() {
        return Err(ApiError::validation("Product name is required"));
    }
    if new.category.trim().is_empty() {
        return Err(ApiError::validation("Category is required"));
    }
    if new.price <= 0.0 {
        return Err(ApiError::validation("Price must be greater than zero"));
    }
    if new.quantity < 0 {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }
    let product = state.store.create_product(farmer.farmer_id, &new).await?;
    tracing::info!(product_id = product.product_id, farmer_id = farmer.farmer_id, "product listed");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "product": product })),
    ))
}

/// Public product detail. A logged-in customer's visit is recorded as a
/// view for the demand reports; recording failures never fail the read.
async fn detail(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let listing = state
        .store
        .product_listing_by_id(id)
        .await?
        .filter(|l| l.product.status != ProductStatus::Removed)
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    if let Some(caller) = caller {
        if caller.role == Role::Customer {
            if let Err(err) = state.store.record_view(caller.user_id, id).await {
                tracing::warn!(%err, product_id = id, "failed to record product view");
            }
        }
    }
    let ratings = state.store.product_ratings(id).await?;
    Ok(Json(json!({
        "success": true,
        "product": listing,
        "ratings": RatingStats::from_ratings(&ratings),
    })))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let product = state
        .store
        .product_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    if product.farmer_id != farmer.farmer_id {
        return Err(ApiError::Forbidden("You do not own this product".into()));
    }
    if let Some(price) = update.price {
        if price <= 0.0 {
            return Err(ApiError::validation("Price must be greater than zero"));
        }
    }
    if let Some(quantity) = update.quantity {
        if quantity < 0 {
            return Err(ApiError::validation("Quantity cannot be negative"));
        }
    }
    let product = state.store.update_product(id, &update).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// Soft delete: the listing goes UNAVAILABLE, order history stays intact.
async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let product = state
        .store
        .product_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    if product.farmer_id != farmer.farmer_id {
        return Err(ApiError::Forbidden("You do not own this product".into()));
    }
    let product = state
        .store
        .set_product_status(id, ProductStatus::Unavailable)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product removed from listings",
        "product": product,
    })))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    rating: i64,
    comment: Option<String>,
}

async fn leave_feedback(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.require_role(&[Role::Customer])?;
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::validation("Rating must be between 1 and 5"));
    }
    state
        .store
        .product_by_id(id)
        .await?
        .filter(|p| p.status != ProductStatus::Removed)
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let feedback = state
        .store
        .create_feedback(caller.user_id, id, req.rating, req.comment.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "feedback": feedback })),
    ))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: ProductStatus,
}

/// Owner toggling between AVAILABLE and UNAVAILABLE. Moderation states
/// are admin-only and rejected here.
async fn set_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let product = state
        .store
        .product_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    if product.farmer_id != farmer.farmer_id {
        return Err(ApiError::Forbidden("You do not own this product".into()));
    }
    if !matches!(
        change.status,
        ProductStatus::Available | ProductStatus::Unavailable
    ) {
        return Err(ApiError::InvalidOperation(
            "Farmers may only set AVAILABLE or UNAVAILABLE".into(),
        ));
    }
    if change.status == ProductStatus::Available && product.quantity == 0 {
        return Err(ApiError::InvalidOperation(
            "Cannot mark a product with no stock as AVAILABLE".into(),
        ));
    }
    let product = state.store.set_product_status(id, change.status).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}
