use chrono::Utc;
use palengke_common::audit::AdminAction;
use serde::Serialize;
use sqlx::QueryBuilder;

use super::{PageParams, Pagination, Store};
use crate::error::ApiError;

/// Audit entry joined with the acting admin's identity.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminActionDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub action: AdminAction,
    pub admin_name: String,
    pub admin_email: String,
}

impl Store {
    /// Append to the audit log. Callers treat failure as non-fatal: the
    /// primary change has already committed, so they log and move on.
    pub async fn log_admin_action(
        &self,
        admin_id: i64,
        action_type: &str,
        target_id: Option<i64>,
        details: &serde_json::Value,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO admin_actions (admin_id, action_type, target_id, details, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(admin_id)
        .bind(action_type)
        .bind(target_id)
        .bind(details.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn admin_actions(
        &self,
        action_type: Option<&str>,
        admin_id: Option<i64>,
        page: PageParams,
    ) -> Result<(Vec<AdminActionDetail>, Pagination), ApiError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM admin_actions a WHERE 1=1");
        let mut query = QueryBuilder::new(
            "SELECT a.*, u.full_name AS admin_name, u.email AS admin_email
             FROM admin_actions a
             JOIN users u ON u.user_id = a.admin_id
             WHERE 1=1",
        );
        for builder in [&mut count, &mut query] {
            if let Some(action_type) = action_type {
                builder
                    .push(" AND a.action_type = ")
                    .push_bind(action_type.to_owned());
            }
            if let Some(admin_id) = admin_id {
                builder.push(" AND a.admin_id = ").push_bind(admin_id);
            }
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;
        query
            .push(" ORDER BY a.created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let actions = query
            .build_query_as::<AdminActionDetail>()
            .fetch_all(&self.pool)
            .await?;
        Ok((actions, Pagination::new(total, page.page(), page.limit())))
    }
}
