use chrono::{NaiveDate, Utc};
use palengke_common::feedback::Feedback;
use palengke_common::product::{Product, ProductListing, ProductStatus};
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use super::{PageParams, Pagination, Store};
use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    pub harvest_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub harvest_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Catalog filters accepted by the public listing and the admin view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub barangay: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub status: Option<ProductStatus>,
}

/// Product row enriched with sales and interest counters for the
/// farmer's inventory view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub times_sold: i64,
    pub units_sold: i64,
    pub view_count: i64,
    pub average_rating: f64,
}

const LISTING_SELECT: &str =
    "SELECT p.*, f.farm_name, u.full_name AS farmer_name, f.barangay
     FROM products p
     JOIN farmers f ON f.farmer_id = p.farmer_id
     JOIN users u ON u.user_id = f.user_id";

impl Store {
    pub async fn create_product(
        &self,
        farmer_id: i64,
        new: &NewProduct,
    ) -> Result<Product, ApiError> {
        let status = if new.quantity > 0 {
            ProductStatus::Available
        } else {
            ProductStatus::Unavailable
        };
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products (farmer_id, product_name, category, price, quantity, harvest_date, description, image_url, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(farmer_id)
        .bind(&new.product_name)
        .bind(&new.category)
        .bind(new.price)
        .bind(new.quantity)
        .bind(new.harvest_date)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        self.product_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ApiError::Internal("created product vanished".into()))
    }

    pub async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, ApiError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn product_listing_by_id(
        &self,
        product_id: i64,
    ) -> Result<Option<ProductListing>, ApiError> {
        let listing = sqlx::query_as::<_, ProductListing>(&format!(
            "{LISTING_SELECT} WHERE p.product_id = ?"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(listing)
    }

    /// Public catalog: available products from verified farmers whose
    /// accounts are active.
    pub async fn list_public_products(
        &self,
        filters: &ProductFilters,
    ) -> Result<Vec<ProductListing>, ApiError> {
        let mut query = QueryBuilder::new(LISTING_SELECT);
        query.push(
            " WHERE p.status = 'AVAILABLE' AND f.verified_status = 1 AND u.status = 'ACTIVE'",
        );
        push_catalog_filters(&mut query, filters);
        query.push(" ORDER BY p.created_at DESC");
        let listings = query
            .build_query_as::<ProductListing>()
            .fetch_all(&self.pool)
            .await?;
        Ok(listings)
    }

    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductListing>, ApiError> {
        let pattern = format!("%{term}%");
        let listings = sqlx::query_as::<_, ProductListing>(&format!(
            "{LISTING_SELECT}
             WHERE p.status = 'AVAILABLE' AND f.verified_status = 1 AND u.status = 'ACTIVE'
               AND (p.product_name LIKE ?1 OR p.category LIKE ?1
                    OR p.description LIKE ?1 OR f.farm_name LIKE ?1)
             ORDER BY p.created_at DESC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(listings)
    }

    pub async fn products_by_farmer(&self, farmer_id: i64) -> Result<Vec<Product>, ApiError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE farmer_id = ? AND status != 'REMOVED'
             ORDER BY created_at DESC",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Partial update. The status recompute sits in the same statement
    /// as the quantity write, so a concurrent order can never observe an
    /// AVAILABLE product at zero stock between them: restocking brings
    /// an UNAVAILABLE product back, emptying the shelf takes an
    /// AVAILABLE one off it, other statuses stand.
    pub async fn update_product(
        &self,
        product_id: i64,
        update: &ProductUpdate,
    ) -> Result<Product, ApiError> {
        sqlx::query(
            "UPDATE products SET
                product_name = COALESCE(?1, product_name),
                category = COALESCE(?2, category),
                price = COALESCE(?3, price),
                quantity = COALESCE(?4, quantity),
                harvest_date = COALESCE(?5, harvest_date),
                description = COALESCE(?6, description),
                image_url = COALESCE(?7, image_url),
                status = CASE
                    WHEN ?4 IS NULL THEN status
                    WHEN ?4 = 0 AND status = 'AVAILABLE' THEN 'UNAVAILABLE'
                    WHEN ?4 > 0 AND status = 'UNAVAILABLE' THEN 'AVAILABLE'
                    ELSE status END,
                updated_at = ?8
             WHERE product_id = ?9",
        )
        .bind(&update.product_name)
        .bind(&update.category)
        .bind(update.price)
        .bind(update.quantity)
        .bind(update.harvest_date)
        .bind(&update.description)
        .bind(&update.image_url)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&self.pool)
        .await?;
        self.product_by_id(product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    pub async fn set_product_status(
        &self,
        product_id: i64,
        status: ProductStatus,
    ) -> Result<Product, ApiError> {
        let result =
            sqlx::query("UPDATE products SET status = ?, updated_at = ? WHERE product_id = ?")
                .bind(status)
                .bind(Utc::now())
                .bind(product_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Product not found"));
        }
        self.product_by_id(product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    /// Best-effort interest signal; feeds the demand and trending reports.
    pub async fn record_view(&self, user_id: i64, product_id: i64) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO product_views (user_id, product_id, viewed_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(product_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn admin_products(
        &self,
        filters: &ProductFilters,
        page: PageParams,
    ) -> Result<(Vec<ProductListing>, Pagination), ApiError> {
        let mut count = QueryBuilder::new(
            "SELECT COUNT(*) FROM products p
             JOIN farmers f ON f.farmer_id = p.farmer_id
             JOIN users u ON u.user_id = f.user_id
             WHERE 1=1",
        );
        let mut query = QueryBuilder::new(LISTING_SELECT);
        query.push(" WHERE 1=1");
        for builder in [&mut count, &mut query] {
            if let Some(status) = filters.status {
                builder.push(" AND p.status = ").push_bind(status);
            }
            push_catalog_filters(builder, filters);
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;
        query
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let listings = query
            .build_query_as::<ProductListing>()
            .fetch_all(&self.pool)
            .await?;
        Ok((listings, Pagination::new(total, page.page(), page.limit())))
    }

    pub async fn farmer_inventory(
        &self,
        farmer_id: i64,
        category: Option<&str>,
        status: Option<ProductStatus>,
    ) -> Result<Vec<InventoryRow>, ApiError> {
        let mut query = QueryBuilder::new(
            "SELECT p.*,
                COUNT(DISTINCT oi.order_id) AS times_sold,
                COALESCE(SUM(oi.quantity), 0) AS units_sold,
                (SELECT COUNT(*) FROM product_views pv WHERE pv.product_id = p.product_id) AS view_count,
                (SELECT COALESCE(ROUND(AVG(fb.rating), 1), 0.0) FROM feedback fb
                  WHERE fb.product_id = p.product_id) AS average_rating
             FROM products p
             LEFT JOIN order_items oi ON oi.product_id = p.product_id
             WHERE p.status != 'REMOVED' AND p.farmer_id = ",
        );
        query.push_bind(farmer_id);
        if let Some(category) = category {
            query.push(" AND p.category = ").push_bind(category.to_owned());
        }
        if let Some(status) = status {
            query.push(" AND p.status = ").push_bind(status);
        }
        query.push(" GROUP BY p.product_id ORDER BY p.product_name ASC");
        let rows = query
            .build_query_as::<InventoryRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// UNAVAILABLE products still drawing views, surfaced on the farmer
    /// dashboard as restock candidates.
    pub async fn restock_candidates(&self, farmer_id: i64) -> Result<Vec<Product>, ApiError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT p.* FROM products p
             WHERE p.farmer_id = ? AND p.status = 'UNAVAILABLE'
             ORDER BY (SELECT COUNT(*) FROM product_views pv
                        WHERE pv.product_id = p.product_id) DESC
             LIMIT 5",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Leave a rating on a purchased product. Purchase is any
    /// non-cancelled order of the caller containing the product.
    pub async fn create_feedback(
        &self,
        customer_id: i64,
        product_id: i64,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<Feedback, ApiError> {
        let (purchased,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM order_items oi
             JOIN orders o ON o.order_id = oi.order_id
             WHERE oi.product_id = ? AND o.customer_id = ?
               AND o.order_status != 'CANCELLED'",
        )
        .bind(product_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        if purchased == 0 {
            return Err(ApiError::InvalidOperation(
                "You can only review products you have ordered".into(),
            ));
        }
        let id = sqlx::query(
            "INSERT INTO feedback (product_id, customer_id, rating, comment, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(product_id)
        .bind(customer_id)
        .bind(rating)
        .bind(comment)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        let feedback =
            sqlx::query_as::<_, Feedback>("SELECT * FROM feedback WHERE feedback_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(feedback)
    }

    pub async fn product_ratings(&self, product_id: i64) -> Result<Vec<i64>, ApiError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT rating FROM feedback WHERE product_id = ?")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(r,)| r).collect())
    }
}

fn push_catalog_filters(query: &mut QueryBuilder<'_, sqlx::Sqlite>, filters: &ProductFilters) {
    if let Some(category) = &filters.category {
        query.push(" AND p.category = ").push_bind(category.clone());
    }
    if let Some(barangay) = &filters.barangay {
        query.push(" AND f.barangay = ").push_bind(barangay.clone());
    }
    if let Some(min) = filters.min_price {
        query.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price {
        query.push(" AND p.price <= ").push_bind(max);
    }
}
