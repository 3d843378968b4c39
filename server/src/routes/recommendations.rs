use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use palengke_common::role::Role;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resolve_owner;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;
use crate::store::ProductFilters;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/demand", get(demand))
        .route("/trending", get(trending))
        .route("/preferences", get(preferences))
        .route("/market-insights", get(market_insights))
        .route("/seasonal", get(seasonal))
        .route("/personalized", get(personalized))
}

/// Demand analysis over the calling farmer's catalog. An empty catalog
/// is an empty report, not an error.
async fn demand(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let analysis = state.store.demand_analysis(farmer.farmer_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": analysis.len(),
        "analysis": analysis,
    })))
}

#[derive(Debug, Deserialize)]
struct TrendingParams {
    limit: Option<i64>,
}

/// Marketplace-wide trending listings. Any authenticated caller.
async fn trending(
    State(state): State<AppState>,
    _caller: AuthUser,
    Query(params): Query<TrendingParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let trending = state.store.trending_products(limit).await?;
    Ok(Json(json!({
        "success": true,
        "count": trending.len(),
        "trending": trending,
    })))
}

/// The calling farmer's products scored against the category-wide
/// market: interest counters, competition, average prices.
async fn market_insights(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let insights = state.store.market_insights(farmer.farmer_id).await?;
    Ok(Json(json!({
        "success": true,
        "farmer_id": farmer.farmer_id,
        "insights": insights,
    })))
}

/// What's in season: categories with listings harvested this month or
/// the next. Any authenticated caller.
async fn seasonal(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    use chrono::Datelike;
    let month = chrono::Utc::now().month();
    let picks = state.store.seasonal_picks(month).await?;
    Ok(Json(json!({
        "success": true,
        "current_month": month,
        "recommendations": picks,
    })))
}

/// Per-customer picks: recently viewed products, unseen products from
/// browsed categories, and the marketplace trending list.
async fn personalized(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Customer])?;
    let recently_viewed = state.store.recently_viewed(caller.user_id, 10).await?;
    let similar = state.store.similar_products(caller.user_id, 5).await?;
    let trending = state.store.trending_products(5).await?;
    Ok(Json(json!({
        "success": true,
        "recently_viewed": recently_viewed,
        "similar_products": similar,
        "trending_products": trending,
    })))
}

/// Personal picks for a customer: their purchase stats plus available
/// products from their most-bought category.
async fn preferences(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    caller.require_role(&[Role::Customer])?;
    let stats = state.store.customer_stats(caller.user_id).await?;
    let suggested = match &stats.favorite_category {
        Some(category) => {
            let filters = ProductFilters {
                category: Some(category.clone()),
                ..ProductFilters::default()
            };
            let mut products = state.store.list_public_products(&filters).await?;
            products.truncate(5);
            products
        }
        None => Vec::new(),
    };
    Ok(Json(json!({
        "success": true,
        "stats": stats,
        "suggested": suggested,
    })))
}
