use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A farm profile, one-to-one with a user whose role is FARMER.
///
/// Products belonging to an unverified farmer are hidden from public
/// listings and the farmer cannot create new ones until an admin flips
/// `verified_status`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Farmer {
    pub farmer_id: i64,
    pub user_id: i64,
    pub farm_name: String,
    pub barangay: Option<String>,
    pub product_categories: Option<String>,
    pub verified_status: bool,
    pub farmer_rating: f64,
    pub created_at: DateTime<Utc>,
}

/// Farmer joined with the owning user's contact details, as returned by
/// lookups that feed responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FarmerWithContact {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub farmer: Farmer,
    pub full_name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

/// Partial farm-profile update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FarmerProfileUpdate {
    pub farm_name: Option<String>,
    pub barangay: Option<String>,
    pub product_categories: Option<String>,
}

impl FarmerProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.farm_name.is_none() && self.barangay.is_none() && self.product_categories.is_none()
    }
}

/// Aggregate statistics for a farmer's dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct FarmerStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub average_rating: f64,
    pub total_sales: f64,
}

/// Default farm profile created when an admin changes a user's role to
/// FARMER, keeping the role/registry invariant intact.
pub fn default_farm_name(full_name: &str) -> String {
    format!("{full_name}'s Farm")
}
