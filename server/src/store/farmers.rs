use chrono::Utc;
use palengke_common::farmer::{Farmer, FarmerProfileUpdate, FarmerStats, FarmerWithContact};
use palengke_common::feedback::Feedback;
use serde::Serialize;
use sqlx::QueryBuilder;

use super::{PageParams, Pagination, Store};
use crate::error::ApiError;

/// Feedback joined with the product and reviewer, for dashboards.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FeedbackDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub feedback: Feedback,
    pub product_name: String,
    pub customer_name: String,
}

impl Store {
    /// One-shot farmer self-registration: creates the unverified farm
    /// profile and flips the user's role to FARMER in one transaction.
    pub async fn register_farmer(
        &self,
        user_id: i64,
        farm_name: &str,
        barangay: Option<&str>,
        product_categories: Option<&str>,
    ) -> Result<Farmer, ApiError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let farmer_id = sqlx::query(
            "INSERT INTO farmers (user_id, farm_name, barangay, product_categories, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(farm_name)
        .bind(barangay)
        .bind(product_categories)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("User is already registered as a farmer".into())
            }
            _ => ApiError::from(err),
        })?
        .last_insert_rowid();
        sqlx::query("UPDATE users SET role = 'FARMER', updated_at = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.farmer_by_id(farmer_id)
            .await?
            .ok_or_else(|| ApiError::Internal("created farmer vanished".into()))
    }

    /// Resolve the farm profile owned by `user_id`. This is the single
    /// ownership lookup every farmer-scoped handler goes through; a
    /// suspended or inactive account resolves to nothing.
    pub async fn farmer_by_user(&self, user_id: i64) -> Result<Option<Farmer>, ApiError> {
        let farmer = sqlx::query_as::<_, Farmer>(
            "SELECT f.* FROM farmers f
             JOIN users u ON u.user_id = f.user_id
             WHERE f.user_id = ? AND u.status = 'ACTIVE'",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(farmer)
    }

    pub async fn farmer_by_id(&self, farmer_id: i64) -> Result<Option<Farmer>, ApiError> {
        let farmer = sqlx::query_as::<_, Farmer>("SELECT * FROM farmers WHERE farmer_id = ?")
            .bind(farmer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(farmer)
    }

    pub async fn farmer_with_contact(
        &self,
        farmer_id: i64,
    ) -> Result<Option<FarmerWithContact>, ApiError> {
        let farmer = sqlx::query_as::<_, FarmerWithContact>(
            "SELECT f.*, u.full_name, u.email, u.contact_number, u.address
             FROM farmers f JOIN users u ON u.user_id = f.user_id
             WHERE f.farmer_id = ?",
        )
        .bind(farmer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(farmer)
    }

    pub async fn update_farm_profile(
        &self,
        farmer_id: i64,
        update: &FarmerProfileUpdate,
    ) -> Result<Farmer, ApiError> {
        sqlx::query(
            "UPDATE farmers SET
                farm_name = COALESCE(?, farm_name),
                barangay = COALESCE(?, barangay),
                product_categories = COALESCE(?, product_categories)
             WHERE farmer_id = ?",
        )
        .bind(&update.farm_name)
        .bind(&update.barangay)
        .bind(&update.product_categories)
        .bind(farmer_id)
        .execute(&self.pool)
        .await?;
        self.farmer_by_id(farmer_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Farmer not found"))
    }

    pub async fn set_farmer_verified(
        &self,
        farmer_id: i64,
        verified: bool,
    ) -> Result<Farmer, ApiError> {
        let result = sqlx::query("UPDATE farmers SET verified_status = ? WHERE farmer_id = ?")
            .bind(verified)
            .bind(farmer_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Farmer not found"));
        }
        self.farmer_by_id(farmer_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Farmer not found"))
    }

    pub async fn pending_farmers(
        &self,
        page: PageParams,
    ) -> Result<(Vec<FarmerWithContact>, Pagination), ApiError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM farmers WHERE verified_status = 0")
                .fetch_one(&self.pool)
                .await?;
        let farmers = sqlx::query_as::<_, FarmerWithContact>(
            "SELECT f.*, u.full_name, u.email, u.contact_number, u.address
             FROM farmers f JOIN users u ON u.user_id = f.user_id
             WHERE f.verified_status = 0
             ORDER BY f.created_at ASC
             LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((farmers, Pagination::new(total, page.page(), page.limit())))
    }

    pub async fn farmer_stats(&self, farmer_id: i64) -> Result<FarmerStats, ApiError> {
        let stats = sqlx::query_as::<_, FarmerStats>(
            "SELECT
                (SELECT COUNT(*) FROM products
                  WHERE farmer_id = ?1 AND status != 'REMOVED') AS total_products,
                (SELECT COUNT(*) FROM orders WHERE farmer_id = ?1) AS total_orders,
                (SELECT COALESCE(ROUND(AVG(fb.rating), 1), 0.0)
                   FROM feedback fb
                   JOIN products p ON p.product_id = fb.product_id
                  WHERE p.farmer_id = ?1) AS average_rating,
                (SELECT COALESCE(SUM(total_amount), 0.0) FROM orders
                  WHERE farmer_id = ?1 AND order_status = 'DELIVERED') AS total_sales",
        )
        .bind(farmer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// All reviews on a farmer's products, optionally floored by rating
    /// or narrowed to one product.
    pub async fn farmer_reviews(
        &self,
        farmer_id: i64,
        min_rating: Option<i64>,
        product_id: Option<i64>,
    ) -> Result<Vec<FeedbackDetail>, ApiError> {
        let mut query = QueryBuilder::new(
            "SELECT fb.*, p.product_name, u.full_name AS customer_name
             FROM feedback fb
             JOIN products p ON p.product_id = fb.product_id
             JOIN users u ON u.user_id = fb.customer_id
             WHERE p.farmer_id = ",
        );
        query.push_bind(farmer_id);
        if let Some(min) = min_rating {
            query.push(" AND fb.rating >= ").push_bind(min);
        }
        if let Some(product) = product_id {
            query.push(" AND p.product_id = ").push_bind(product);
        }
        query.push(" ORDER BY fb.created_at DESC");
        let rows = query
            .build_query_as::<FeedbackDetail>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn recent_feedback_for_farmer(
        &self,
        farmer_id: i64,
        limit: i64,
    ) -> Result<Vec<FeedbackDetail>, ApiError> {
        let rows = sqlx::query_as::<_, FeedbackDetail>(
            "SELECT fb.*, p.product_name, u.full_name AS customer_name
             FROM feedback fb
             JOIN products p ON p.product_id = fb.product_id
             JOIN users u ON u.user_id = fb.customer_id
             WHERE p.farmer_id = ?
             ORDER BY fb.created_at DESC
             LIMIT ?",
        )
        .bind(farmer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
