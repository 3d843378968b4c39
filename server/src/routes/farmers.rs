use axum::extract::{Query, State};
use axum::routing::{get, put};
use axum::Router;
use chrono::{Duration, Utc};
use palengke_common::farmer::FarmerProfileUpdate;
use palengke_common::feedback::RatingStats;
use palengke_common::product::ProductStatus;
use palengke_common::scoring;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resolve_owner;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/profile", put(update_profile))
        .route("/sales-report", get(sales_report))
        .route("/inventory", get(inventory))
        .route("/reviews", get(reviews))
        .route("/performance", get(performance))
}

async fn dashboard(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let stats = state.store.farmer_stats(farmer.farmer_id).await?;
    let mut recent_orders = state.store.orders_by_farmer(farmer.farmer_id, None).await?;
    recent_orders.truncate(10);
    let restock = state.store.restock_candidates(farmer.farmer_id).await?;
    let feedback = state
        .store
        .recent_feedback_for_farmer(farmer.farmer_id, 5)
        .await?;
    Ok(Json(json!({
        "success": true,
        "farmer": farmer,
        "stats": stats,
        "recent_orders": recent_orders,
        "unavailable_products": restock,
        "recent_feedback": feedback,
    })))
}

async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(update): Json<FarmerProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    if update.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }
    if let Some(name) = &update.farm_name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Farm name cannot be empty"));
        }
    }
    let farmer = state
        .store
        .update_farm_profile(farmer.farmer_id, &update)
        .await?;
    Ok(Json(json!({ "success": true, "farmer": farmer })))
}

#[derive(Debug, Deserialize)]
struct SalesParams {
    period: Option<String>,
}

/// DELIVERED revenue over a trailing window. Unknown periods fall back
/// to monthly, matching the permissive query handling elsewhere.
async fn sales_report(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<SalesParams>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let period = params.period.as_deref().unwrap_or("monthly");
    let days = match period {
        "weekly" => 7,
        "yearly" => 365,
        _ => 30,
    };
    let since = Utc::now() - Duration::days(days);
    let report = state.store.sales_report(farmer.farmer_id, since).await?;
    Ok(Json(json!({
        "success": true,
        "period": period,
        "since": since.to_rfc3339(),
        "report": report,
    })))
}

#[derive(Debug, Deserialize)]
struct ReviewParams {
    min_rating: Option<i64>,
    product_id: Option<i64>,
}

async fn reviews(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    if let Some(min) = params.min_rating {
        if !(1..=5).contains(&min) {
            return Err(ApiError::validation("Rating must be a number between 1 and 5"));
        }
    }
    let reviews = state
        .store
        .farmer_reviews(farmer.farmer_id, params.min_rating, params.product_id)
        .await?;
    let ratings: Vec<i64> = reviews.iter().map(|r| r.feedback.rating).collect();
    Ok(Json(json!({
        "success": true,
        "reviews": reviews,
        "rating_stats": RatingStats::from_ratings(&ratings),
    })))
}

/// Scores the farmer's operation on a 100-point scale from delivery
/// share, ratings, turnaround and sales growth, with coaching notes for
/// the weak components.
async fn performance(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let metrics = state.store.performance_metrics(farmer.farmer_id).await?;

    let fulfillment_rate = metrics
        .order_fulfillment
        .iter()
        .find(|b| b.order_status == "DELIVERED")
        .map(|b| b.percentage)
        .unwrap_or(0.0);
    let growth = match metrics.sales_trend.as_slice() {
        [recent, previous, ..] => scoring::growth_rate(recent.weekly_sales, previous.weekly_sales),
        _ => 0.0,
    };
    let overall = scoring::performance_score(
        fulfillment_rate,
        metrics.avg_rating,
        metrics.avg_response_hours,
        growth,
    );

    Ok(Json(json!({
        "success": true,
        "performance_metrics": metrics,
        "performance_score": {
            "fulfillment_rate": fulfillment_rate,
            "avg_rating": metrics.avg_rating,
            "response_time": metrics.avg_response_hours,
            "sales_growth": growth,
            "overall": overall,
            "level": scoring::performance_level(overall),
        },
        "recommendations": performance_advice(fulfillment_rate, metrics.avg_rating, metrics.avg_response_hours, growth),
    })))
}

fn performance_advice(
    fulfillment_rate: f64,
    avg_rating: f64,
    response_hours: f64,
    growth: f64,
) -> Vec<Value> {
    let mut advice = Vec::new();
    if fulfillment_rate < 90.0 {
        advice.push(json!({
            "area": "Order Fulfillment",
            "suggestion": "Improve delivery time and order accuracy",
            "priority": "HIGH",
        }));
    }
    if avg_rating < 4.0 {
        advice.push(json!({
            "area": "Customer Satisfaction",
            "suggestion": "Check feedback and improve product quality",
            "priority": "HIGH",
        }));
    }
    if response_hours > 48.0 {
        advice.push(json!({
            "area": "Order Processing Time",
            "suggestion": "Process and deliver orders faster",
            "priority": "MEDIUM",
        }));
    }
    if growth < 0.0 {
        advice.push(json!({
            "area": "Sales Growth",
            "suggestion": "Consider promotional offers or new products",
            "priority": "MEDIUM",
        }));
    }
    advice
}

#[derive(Debug, Deserialize)]
struct InventoryParams {
    category: Option<String>,
    status: Option<ProductStatus>,
}

async fn inventory(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<InventoryParams>,
) -> Result<Json<Value>, ApiError> {
    let farmer = resolve_owner(&state, &caller).await?;
    let rows = state
        .store
        .farmer_inventory(farmer.farmer_id, params.category.as_deref(), params.status)
        .await?;
    let stock_value: f64 = rows
        .iter()
        .map(|r| r.product.price * r.product.quantity as f64)
        .sum();
    let out_of_stock = rows.iter().filter(|r| r.product.quantity == 0).count();
    let units_sold: i64 = rows.iter().map(|r| r.units_sold).sum();
    Ok(Json(json!({
        "success": true,
        "summary": {
            "total_products": rows.len(),
            "stock_value": stock_value,
            "out_of_stock": out_of_stock,
            "units_sold": units_sold,
        },
        "inventory": rows,
    })))
}
