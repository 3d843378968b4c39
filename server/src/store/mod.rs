//! SQLite-backed persistence layer.
//!
//! One [`Store`] handle wraps the connection pool and is cloned into the
//! router state. Each domain area lives in its own submodule as an
//! `impl Store` block; anything transactional (order creation, role
//! changes) runs inside a single sqlx transaction here rather than in
//! the handlers.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

mod audit;
mod farmers;
mod orders;
mod products;
mod reports;
mod users;

pub use audit::AdminActionDetail;
pub use farmers::FeedbackDetail;
pub use orders::{AdminOrderUpdate, CustomerOrderRow, FarmerOrderRow, OrderItemDetail};
pub use products::{InventoryRow, NewProduct, ProductFilters, ProductUpdate};
pub use reports::{
    AnalyticsSummary, CustomerStats, DemandRow, MarketInsightRow, PerformanceMetrics,
    ProductPerformance, SalesDay, SalesReport, SeasonalRow, SimilarProduct, StatusBreakdown,
    TopProduct, TrendingRow, ViewedProduct, WeeklySales,
};
pub use users::NewUser;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database file, apply migrations, and return a
    /// pooled handle.
    ///
    /// SQLite allows one writer at a time, and a transaction that starts
    /// as a read cannot always upgrade to a write under contention. A
    /// single pooled connection serializes transactions instead, so the
    /// conditional stock decrement decides races rather than SQLITE_BUSY.
    pub async fn connect(path: &str) -> Result<Self, sqlx::Error> {
        let path = path.strip_prefix("sqlite:").unwrap_or(path);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Store { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Page metadata returned alongside every paginated listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Pagination {
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit.max(1),
        }
    }
}

/// Query-string paging parameters, clamped to sane bounds.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct PageParams {
    page: Option<i64>,
    limit: Option<i64>,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageParams { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}
