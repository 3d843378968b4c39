use chrono::{DateTime, Utc};
use palengke_common::product::Product;
use palengke_common::scoring;
use serde::Serialize;

use super::Store;
use crate::error::ApiError;

/// Raw per-product counters behind the demand analysis.
#[derive(Debug, Clone, sqlx::FromRow)]
struct DemandCounters {
    product_id: i64,
    product_name: String,
    category: String,
    view_count: i64,
    units_sold: i64,
    pending_orders: i64,
}

/// One product in the demand report, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct DemandRow {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub view_count: i64,
    pub units_sold: i64,
    pub pending_orders: i64,
    pub demand_score: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TrendingCounters {
    product_id: i64,
    product_name: String,
    category: String,
    price: f64,
    farm_name: String,
    unique_viewers: i64,
    purchases: i64,
    average_rating: f64,
}

/// One product in the trending report, most popular first.
#[derive(Debug, Clone, Serialize)]
pub struct TrendingRow {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub farm_name: String,
    pub unique_viewers: i64,
    pub purchases: i64,
    pub average_rating: f64,
    pub popularity_score: f64,
}

/// Delivered revenue bucketed by calendar day.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesDay {
    pub day: String,
    pub orders: i64,
    pub revenue: f64,
}

/// Per-product totals over the report window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductPerformance {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub units_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub total_orders: i64,
    pub total_revenue: f64,
    pub daily: Vec<SalesDay>,
    pub products: Vec<ProductPerformance>,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnalyticsSummary {
    pub total_customers: i64,
    pub total_farmers: i64,
    pub verified_farmers: i64,
    pub total_products: i64,
    pub available_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub total_revenue: f64,
}

/// A customer's own purchase counters.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerStats {
    pub total_orders: i64,
    pub total_spent: f64,
    pub favorite_category: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct InsightCounters {
    product_id: i64,
    product_name: String,
    category: String,
    view_count: i64,
    purchase_count: i64,
    avg_rating: f64,
    unmet_demand: i64,
    market_avg_price: f64,
    market_competition: i64,
}

/// One product in the market-insights report: the farmer's own counters
/// next to the category-wide market context.
#[derive(Debug, Clone, Serialize)]
pub struct MarketInsightRow {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub view_count: i64,
    pub purchase_count: i64,
    pub avg_rating: f64,
    pub unmet_demand: i64,
    pub market_avg_price: f64,
    pub market_competition: i64,
    pub demand_score: f64,
}

/// Category availability bucketed by harvest month.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SeasonalRow {
    pub category: String,
    pub total_listings: i64,
    pub avg_price: f64,
    pub harvest_month: i64,
}

/// A product the customer recently opened.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ViewedProduct {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub viewed_at: DateTime<Utc>,
}

/// An available product from a category the customer has browsed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SimilarProduct {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub farm_name: String,
}

/// Per-status order counts with their share of the farmer's total.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusBreakdown {
    pub order_status: String,
    pub count: i64,
    pub percentage: f64,
}

/// One week of a farmer's sales history, newest first.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WeeklySales {
    pub week: String,
    pub weekly_sales: f64,
    pub weekly_orders: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_name: String,
    pub total_sold: i64,
    pub revenue: f64,
    pub avg_rating: f64,
}

/// Raw inputs for the farmer performance score.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub order_fulfillment: Vec<StatusBreakdown>,
    pub avg_rating: f64,
    pub total_reviews: i64,
    pub avg_response_hours: f64,
    pub sales_trend: Vec<WeeklySales>,
    pub top_products: Vec<TopProduct>,
}

impl Store {
    /// Demand analysis over one farmer's catalog: views, sales, and
    /// still-pending orders, weighted into a score and sorted on it.
    pub async fn demand_analysis(&self, farmer_id: i64) -> Result<Vec<DemandRow>, ApiError> {
        let counters = sqlx::query_as::<_, DemandCounters>(
            "SELECT p.product_id, p.product_name, p.category,
                (SELECT COUNT(*) FROM product_views pv
                  WHERE pv.product_id = p.product_id) AS view_count,
                (SELECT COALESCE(SUM(oi.quantity), 0) FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                  WHERE oi.product_id = p.product_id
                    AND o.order_status != 'CANCELLED') AS units_sold,
                (SELECT COUNT(DISTINCT o.order_id) FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                  WHERE oi.product_id = p.product_id
                    AND o.order_status = 'PENDING') AS pending_orders
             FROM products p
             WHERE p.farmer_id = ? AND p.status != 'REMOVED'",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<DemandRow> = counters
            .into_iter()
            .map(|c| DemandRow {
                demand_score: scoring::demand_score(c.view_count, c.units_sold > 0, c.pending_orders),
                product_id: c.product_id,
                product_name: c.product_name,
                category: c.category,
                view_count: c.view_count,
                units_sold: c.units_sold,
                pending_orders: c.pending_orders,
            })
            .collect();
        rows.sort_by(|a, b| b.demand_score.total_cmp(&a.demand_score));
        Ok(rows)
    }

    /// Trending products across the whole marketplace.
    pub async fn trending_products(&self, limit: i64) -> Result<Vec<TrendingRow>, ApiError> {
        let counters = sqlx::query_as::<_, TrendingCounters>(
            "SELECT p.product_id, p.product_name, p.category, p.price, f.farm_name,
                (SELECT COUNT(DISTINCT pv.user_id) FROM product_views pv
                  WHERE pv.product_id = p.product_id) AS unique_viewers,
                (SELECT COUNT(DISTINCT o.order_id) FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                  WHERE oi.product_id = p.product_id
                    AND o.order_status != 'CANCELLED') AS purchases,
                (SELECT COALESCE(ROUND(AVG(fb.rating), 1), 0.0) FROM feedback fb
                  WHERE fb.product_id = p.product_id) AS average_rating
             FROM products p
             JOIN farmers f ON f.farmer_id = p.farmer_id
             WHERE p.status = 'AVAILABLE' AND f.verified_status = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<TrendingRow> = counters
            .into_iter()
            .map(|c| TrendingRow {
                popularity_score: scoring::popularity_score(
                    c.unique_viewers,
                    c.purchases,
                    c.average_rating,
                ),
                product_id: c.product_id,
                product_name: c.product_name,
                category: c.category,
                price: c.price,
                farm_name: c.farm_name,
                unique_viewers: c.unique_viewers,
                purchases: c.purchases,
                average_rating: c.average_rating,
            })
            .collect();
        rows.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    /// Sales report for a farmer since `since`. Only DELIVERED orders
    /// count toward revenue.
    pub async fn sales_report(
        &self,
        farmer_id: i64,
        since: DateTime<Utc>,
    ) -> Result<SalesReport, ApiError> {
        let (total_orders, total_revenue): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_amount), 0.0)
             FROM orders
             WHERE farmer_id = ? AND order_status = 'DELIVERED' AND order_date >= ?",
        )
        .bind(farmer_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let daily = sqlx::query_as::<_, SalesDay>(
            "SELECT substr(order_date, 1, 10) AS day,
                    COUNT(*) AS orders,
                    COALESCE(SUM(total_amount), 0.0) AS revenue
             FROM orders
             WHERE farmer_id = ? AND order_status = 'DELIVERED' AND order_date >= ?
             GROUP BY day
             ORDER BY day DESC",
        )
        .bind(farmer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let products = sqlx::query_as::<_, ProductPerformance>(
            "SELECT p.product_id, p.product_name, p.category,
                    COALESCE(SUM(oi.quantity), 0) AS units_sold,
                    COALESCE(SUM(oi.quantity * oi.price), 0.0) AS revenue
             FROM order_items oi
             JOIN orders o ON o.order_id = oi.order_id
             JOIN products p ON p.product_id = oi.product_id
             WHERE o.farmer_id = ? AND o.order_status = 'DELIVERED' AND o.order_date >= ?
             GROUP BY p.product_id
             ORDER BY revenue DESC",
        )
        .bind(farmer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesReport {
            total_orders,
            total_revenue,
            daily,
            products,
        })
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        let summary = sqlx::query_as::<_, AnalyticsSummary>(
            "SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'CUSTOMER') AS total_customers,
                (SELECT COUNT(*) FROM farmers) AS total_farmers,
                (SELECT COUNT(*) FROM farmers WHERE verified_status = 1) AS verified_farmers,
                (SELECT COUNT(*) FROM products WHERE status != 'REMOVED') AS total_products,
                (SELECT COUNT(*) FROM products WHERE status = 'AVAILABLE') AS available_products,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM orders WHERE order_status = 'PENDING') AS pending_orders,
                (SELECT COUNT(*) FROM orders WHERE order_status = 'DELIVERED') AS delivered_orders,
                (SELECT COALESCE(SUM(total_amount), 0.0) FROM orders
                  WHERE order_status = 'DELIVERED') AS total_revenue",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    /// Market insights for one farmer: per-product interest counters plus
    /// the category-level market picture, scored and sorted.
    pub async fn market_insights(&self, farmer_id: i64) -> Result<Vec<MarketInsightRow>, ApiError> {
        let counters = sqlx::query_as::<_, InsightCounters>(
            "SELECT p.product_id, p.product_name, p.category,
                (SELECT COUNT(*) FROM product_views pv
                  WHERE pv.product_id = p.product_id) AS view_count,
                (SELECT COUNT(*) FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                  WHERE oi.product_id = p.product_id
                    AND o.order_status != 'CANCELLED') AS purchase_count,
                (SELECT COALESCE(ROUND(AVG(fb.rating), 1), 0.0) FROM feedback fb
                  WHERE fb.product_id = p.product_id) AS avg_rating,
                (SELECT COUNT(DISTINCT o.order_id) FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                  WHERE oi.product_id = p.product_id
                    AND o.order_status = 'PENDING') AS unmet_demand,
                (SELECT COALESCE(ROUND(AVG(m.price), 2), 0.0) FROM products m
                  WHERE m.category = p.category AND m.status = 'AVAILABLE') AS market_avg_price,
                (SELECT COUNT(DISTINCT m.farmer_id) FROM products m
                  WHERE m.category = p.category AND m.status = 'AVAILABLE') AS market_competition
             FROM products p
             WHERE p.farmer_id = ? AND p.status != 'REMOVED'",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<MarketInsightRow> = counters
            .into_iter()
            .map(|c| MarketInsightRow {
                demand_score: scoring::market_demand_score(
                    c.view_count,
                    c.purchase_count,
                    c.avg_rating,
                    c.unmet_demand,
                ),
                product_id: c.product_id,
                product_name: c.product_name,
                category: c.category,
                view_count: c.view_count,
                purchase_count: c.purchase_count,
                avg_rating: c.avg_rating,
                unmet_demand: c.unmet_demand,
                market_avg_price: c.market_avg_price,
                market_competition: c.market_competition,
            })
            .collect();
        rows.sort_by(|a, b| b.demand_score.total_cmp(&a.demand_score));
        Ok(rows)
    }

    /// Categories with listings harvested in the given month or the next
    /// one. `month` is 1-based.
    pub async fn seasonal_picks(&self, month: u32) -> Result<Vec<SeasonalRow>, ApiError> {
        let next = month % 12 + 1;
        let rows = sqlx::query_as::<_, SeasonalRow>(
            "SELECT category,
                    COUNT(*) AS total_listings,
                    COALESCE(ROUND(AVG(price), 2), 0.0) AS avg_price,
                    CAST(strftime('%m', harvest_date) AS INTEGER) AS harvest_month
             FROM products
             WHERE status = 'AVAILABLE' AND harvest_date IS NOT NULL
             GROUP BY category, harvest_month
             HAVING harvest_month IN (?, ?)
             ORDER BY total_listings DESC",
        )
        .bind(month as i64)
        .bind(next as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recently_viewed(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ViewedProduct>, ApiError> {
        let rows = sqlx::query_as::<_, ViewedProduct>(
            "SELECT p.*, pv.viewed_at
             FROM product_views pv
             JOIN products p ON p.product_id = pv.product_id
             WHERE pv.user_id = ?
             ORDER BY pv.viewed_at DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Available products from categories the user has viewed, excluding
    /// everything already seen. Sampled, not ranked.
    pub async fn similar_products(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<SimilarProduct>, ApiError> {
        let rows = sqlx::query_as::<_, SimilarProduct>(
            "SELECT p.*, f.farm_name
             FROM products p
             JOIN farmers f ON f.farmer_id = p.farmer_id
             WHERE p.status = 'AVAILABLE'
               AND p.category IN (
                   SELECT DISTINCT v.category FROM product_views pv
                   JOIN products v ON v.product_id = pv.product_id
                   WHERE pv.user_id = ?1)
               AND p.product_id NOT IN (
                   SELECT product_id FROM product_views WHERE user_id = ?1)
             ORDER BY RANDOM()
             LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Raw counters behind the farmer performance score: fulfillment
    /// breakdown, review totals, twelve weeks of sales, top sellers.
    pub async fn performance_metrics(
        &self,
        farmer_id: i64,
    ) -> Result<PerformanceMetrics, ApiError> {
        let order_fulfillment = sqlx::query_as::<_, StatusBreakdown>(
            "SELECT order_status,
                    COUNT(*) AS count,
                    ROUND(COUNT(*) * 100.0 /
                        (SELECT COUNT(*) FROM orders WHERE farmer_id = ?1), 2) AS percentage
             FROM orders
             WHERE farmer_id = ?1
             GROUP BY order_status",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        let (avg_rating, total_reviews): (f64, i64) = sqlx::query_as(
            "SELECT COALESCE(ROUND(AVG(fb.rating), 2), 0.0), COUNT(*)
             FROM feedback fb
             JOIN products p ON p.product_id = fb.product_id
             WHERE p.farmer_id = ?",
        )
        .bind(farmer_id)
        .fetch_one(&self.pool)
        .await?;

        // Hours between placement and now for delivered orders; 24 when
        // nothing has been delivered yet.
        let (avg_response_hours,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(AVG((julianday('now') - julianday(order_date)) * 24), 24.0)
             FROM orders
             WHERE farmer_id = ? AND order_status = 'DELIVERED'",
        )
        .bind(farmer_id)
        .fetch_one(&self.pool)
        .await?;

        let since = Utc::now() - chrono::Duration::weeks(12);
        let sales_trend = sqlx::query_as::<_, WeeklySales>(
            "SELECT strftime('%Y-%W', order_date) AS week,
                    COALESCE(SUM(total_amount), 0.0) AS weekly_sales,
                    COUNT(DISTINCT order_id) AS weekly_orders
             FROM orders
             WHERE farmer_id = ? AND order_date >= ?
             GROUP BY week
             ORDER BY week DESC
             LIMIT 12",
        )
        .bind(farmer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(
            "SELECT p.product_name,
                    COALESCE(SUM(oi.quantity), 0) AS total_sold,
                    COALESCE(SUM(oi.quantity * oi.price), 0.0) AS revenue,
                    (SELECT COALESCE(ROUND(AVG(fb.rating), 1), 0.0) FROM feedback fb
                      WHERE fb.product_id = p.product_id) AS avg_rating
             FROM products p
             JOIN order_items oi ON oi.product_id = p.product_id
             WHERE p.farmer_id = ?
             GROUP BY p.product_id
             ORDER BY revenue DESC
             LIMIT 5",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PerformanceMetrics {
            order_fulfillment,
            avg_rating,
            total_reviews,
            avg_response_hours,
            sales_trend,
            top_products,
        })
    }

    pub async fn customer_stats(&self, customer_id: i64) -> Result<CustomerStats, ApiError> {
        let stats = sqlx::query_as::<_, CustomerStats>(
            "SELECT
                (SELECT COUNT(*) FROM orders WHERE customer_id = ?1) AS total_orders,
                (SELECT COALESCE(SUM(total_amount), 0.0) FROM orders
                  WHERE customer_id = ?1 AND order_status = 'DELIVERED') AS total_spent,
                (SELECT p.category FROM order_items oi
                   JOIN orders o ON o.order_id = oi.order_id
                   JOIN products p ON p.product_id = oi.product_id
                  WHERE o.customer_id = ?1
                  GROUP BY p.category
                  ORDER BY SUM(oi.quantity) DESC
                  LIMIT 1) AS favorite_category",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
