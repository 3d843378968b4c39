//! Weighted-sum scores used by the recommendation reports.
//!
//! The database supplies the raw counts; the weights and rounding live
//! here so the formulas are testable without a store.

/// Demand score weights: view frequency, price trend, unmet demand.
pub const DEMAND_WEIGHTS: (f64, f64, f64) = (0.4, 0.3, 0.3);

/// Popularity score weights: unique viewers, purchases, average rating.
pub const POPULARITY_WEIGHTS: (f64, f64, f64) = (0.4, 0.5, 0.1);

/// Demand score for a single product: freq*0.4 + price_trend*0.3 + unmet*0.3.
///
/// `price_trend` is 1.0 when the product has sold at least once, 0.5
/// otherwise; `unmet_demand` counts pending orders touching the product.
pub fn demand_score(view_count: i64, has_sold: bool, unmet_demand: i64) -> f64 {
    let (wf, wp, wu) = DEMAND_WEIGHTS;
    let price_trend = if has_sold { 1.0 } else { 0.5 };
    round2(view_count as f64 * wf + price_trend * wp + unmet_demand as f64 * wu)
}

/// Popularity score for trending listings: viewers*0.4 + purchases*0.5 + rating*0.1.
pub fn popularity_score(unique_viewers: i64, purchases: i64, avg_rating: f64) -> f64 {
    let (wv, wp, wr) = POPULARITY_WEIGHTS;
    round2(unique_viewers as f64 * wv + purchases as f64 * wp + avg_rating * wr)
}

/// Market-insight demand weights: views, purchases, rating, unmet demand.
pub const INSIGHT_WEIGHTS: (f64, f64, f64, f64) = (0.3, 0.4, 0.2, 0.1);

/// Demand score used by the market-insights report:
/// views*0.3 + purchases*0.4 + rating*0.2 + unmet*0.1.
pub fn market_demand_score(views: i64, purchases: i64, avg_rating: f64, unmet: i64) -> f64 {
    let (wv, wp, wr, wu) = INSIGHT_WEIGHTS;
    round2(views as f64 * wv + purchases as f64 * wp + avg_rating * wr + unmet as f64 * wu)
}

/// Week-over-week growth, in percent. With no prior week sales, any
/// current sales count as 100% growth.
pub fn growth_rate(recent: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if recent > 0.0 { 100.0 } else { 0.0 };
    }
    (recent - previous) / previous * 100.0
}

/// Farmer performance on a 100-point scale.
///
/// Components: delivered share of orders (30%), average rating scaled
/// from 5 to 100 points (30%), delivery turnaround inside a 72-hour
/// window (20%), and sales growth capped at 100% (20%).
pub fn performance_score(
    fulfillment_rate: f64,
    avg_rating: f64,
    response_hours: f64,
    growth_pct: f64,
) -> f64 {
    round1(
        fulfillment_rate * 0.3
            + avg_rating * 20.0 * 0.3
            + (72.0 - response_hours.min(72.0)) * 0.2
            + growth_pct.min(100.0) * 0.2,
    )
}

pub fn performance_level(score: f64) -> &'static str {
    if score >= 80.0 {
        "EXCELLENT"
    } else if score >= 70.0 {
        "GOOD"
    } else if score >= 60.0 {
        "AVERAGE"
    } else if score >= 50.0 {
        "NEEDS IMPROVEMENT"
    } else {
        "POOR"
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
