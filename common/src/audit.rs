use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of an admin action. Written once, never mutated.
/// `details` holds a JSON payload describing the change.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminAction {
    pub action_id: i64,
    pub admin_id: i64,
    pub action_type: String,
    pub target_id: Option<i64>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Action types recorded in the audit log.
pub mod action_type {
    pub const PRODUCT_STATUS_CHANGE: &str = "PRODUCT_STATUS_CHANGE";
    pub const ORDER_UPDATE: &str = "ORDER_UPDATE";
    pub const USER_STATUS_CHANGE: &str = "USER_STATUS_CHANGE";
    pub const USER_ROLE_CHANGE: &str = "USER_ROLE_CHANGE";
    pub const FARMER_VERIFICATION: &str = "FARMER_VERIFICATION";
    pub const SYSTEM_SETTINGS_UPDATE: &str = "SYSTEM_SETTINGS_UPDATE";
}
