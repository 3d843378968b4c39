use chrono::Utc;
use palengke_common::order::{
    DeliveryOption, Order, OrderItem, OrderItemRequest, OrderStatus,
};
use palengke_common::product::Product;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use super::{PageParams, Pagination, Store};
use crate::error::ApiError;

/// Order joined with the selling farm, for the customer's history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerOrderRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub farm_name: String,
    pub farmer_name: String,
}

/// Order joined with the buyer's contact details, for the farmer's queue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FarmerOrderRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

/// Line item joined with its product snapshot context.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
    pub category: String,
    pub image_url: Option<String>,
}

/// Admin override payload. Only the given fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminOrderUpdate {
    pub order_status: Option<OrderStatus>,
    pub delivery_option: Option<DeliveryOption>,
    pub total_amount: Option<f64>,
}

impl Store {
    /// Place an order: validate every line, then write the order, its
    /// items, and the stock decrements inside one transaction.
    ///
    /// The decrement is a conditional UPDATE guarded by `quantity >= ?`,
    /// so two concurrent orders for the last units cannot both succeed;
    /// the loser touches zero rows and the whole transaction rolls back.
    pub async fn create_order(
        &self,
        customer_id: i64,
        items: &[OrderItemRequest],
        delivery_option: Option<DeliveryOption>,
    ) -> Result<(Order, Vec<OrderItem>), ApiError> {
        if items.is_empty() {
            return Err(ApiError::validation("Order must contain at least one item"));
        }

        let mut tx = self.pool.begin().await?;

        let mut farmer_id: Option<i64> = None;
        let mut total_amount = 0.0;
        let mut lines: Vec<(Product, i64)> = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity <= 0 {
                return Err(ApiError::validation("Item quantity must be positive"));
            }
            let product =
                sqlx::query_as::<_, Product>("SELECT * FROM products WHERE product_id = ?")
                    .bind(item.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| {
                        ApiError::not_found(format!("Product {} not found", item.product_id))
                    })?;
            if !product.status.is_orderable() {
                return Err(ApiError::InvalidOperation(format!(
                    "{} is not available for ordering",
                    product.product_name
                )));
            }
            if product.quantity < item.quantity {
                return Err(ApiError::InsufficientStock {
                    product: product.product_name,
                });
            }
            match farmer_id {
                None => farmer_id = Some(product.farmer_id),
                Some(id) if id != product.farmer_id => return Err(ApiError::CrossFarmerOrder),
                Some(_) => {}
            }
            total_amount += product.price * item.quantity as f64;
            lines.push((product, item.quantity));
        }
        // items is non-empty, so the loop always set this.
        let farmer_id =
            farmer_id.ok_or_else(|| ApiError::Internal("order validated with no items".into()))?;
        let delivery = delivery_option.unwrap_or_default();

        let now = Utc::now();
        let order_id = sqlx::query(
            "INSERT INTO orders (customer_id, farmer_id, total_amount, delivery_option, order_status, order_date)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(customer_id)
        .bind(farmer_id)
        .bind(total_amount)
        .bind(delivery)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let mut order_items = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let item_id = sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(product.product_id)
            .bind(quantity)
            .bind(product.price)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            let decremented = sqlx::query(
                "UPDATE products SET
                    quantity = quantity - ?1,
                    status = CASE WHEN quantity - ?1 = 0 THEN 'UNAVAILABLE' ELSE status END,
                    updated_at = ?2
                 WHERE product_id = ?3 AND quantity >= ?1",
            )
            .bind(quantity)
            .bind(now)
            .bind(product.product_id)
            .execute(&mut *tx)
            .await?;
            if decremented.rows_affected() == 0 {
                // Lost a race since the validation read; drop the tx.
                return Err(ApiError::InsufficientStock {
                    product: product.product_name.clone(),
                });
            }

            order_items.push(OrderItem {
                order_item_id: item_id,
                order_id,
                product_id: product.product_id,
                quantity: *quantity,
                price: product.price,
            });
        }

        tx.commit().await?;

        let order = Order {
            order_id,
            customer_id,
            farmer_id,
            total_amount,
            delivery_option: delivery,
            order_status: OrderStatus::Pending,
            order_date: now,
        };
        Ok((order, order_items))
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, ApiError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, ApiError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.*, p.product_name, p.category, p.image_url
             FROM order_items oi
             JOIN products p ON p.product_id = oi.product_id
             WHERE oi.order_id = ?
             ORDER BY oi.order_item_id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn orders_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<CustomerOrderRow>, ApiError> {
        let orders = sqlx::query_as::<_, CustomerOrderRow>(
            "SELECT o.*, f.farm_name, u.full_name AS farmer_name
             FROM orders o
             JOIN farmers f ON f.farmer_id = o.farmer_id
             JOIN users u ON u.user_id = f.user_id
             WHERE o.customer_id = ?
             ORDER BY o.order_date DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn orders_by_farmer(
        &self,
        farmer_id: i64,
        status: Option<OrderStatus>,
    ) -> Result<Vec<FarmerOrderRow>, ApiError> {
        let mut query = QueryBuilder::new(
            "SELECT o.*, u.full_name AS customer_name, u.contact_number, u.address
             FROM orders o
             JOIN users u ON u.user_id = o.customer_id
             WHERE o.farmer_id = ",
        );
        query.push_bind(farmer_id);
        if let Some(status) = status {
            query.push(" AND o.order_status = ").push_bind(status);
        }
        query.push(" ORDER BY o.order_date DESC");
        let orders = query
            .build_query_as::<FarmerOrderRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn set_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let result = sqlx::query("UPDATE orders SET order_status = ? WHERE order_id = ?")
            .bind(status)
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Order not found"));
        }
        self.order_by_id(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))
    }

    pub async fn admin_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageParams,
    ) -> Result<(Vec<CustomerOrderRow>, Pagination), ApiError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders o WHERE 1=1");
        let mut query = QueryBuilder::new(
            "SELECT o.*, f.farm_name, u.full_name AS farmer_name
             FROM orders o
             JOIN farmers f ON f.farmer_id = o.farmer_id
             JOIN users u ON u.user_id = f.user_id
             WHERE 1=1",
        );
        for builder in [&mut count, &mut query] {
            if let Some(status) = status {
                builder.push(" AND o.order_status = ").push_bind(status);
            }
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;
        query
            .push(" ORDER BY o.order_date DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let orders = query
            .build_query_as::<CustomerOrderRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok((orders, Pagination::new(total, page.page(), page.limit())))
    }

    pub async fn admin_update_order(
        &self,
        order_id: i64,
        update: &AdminOrderUpdate,
    ) -> Result<Order, ApiError> {
        sqlx::query(
            "UPDATE orders SET
                order_status = COALESCE(?, order_status),
                delivery_option = COALESCE(?, delivery_option),
                total_amount = COALESCE(?, total_amount)
             WHERE order_id = ?",
        )
        .bind(update.order_status)
        .bind(update.delivery_option)
        .bind(update.total_amount)
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        self.order_by_id(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))
    }
}
