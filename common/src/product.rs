use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::role::UnknownVariant;

/// Catalog visibility of a product.
///
/// `Unavailable` is set automatically when an order drains the stock to
/// zero; `Removed` and `UnderReview` are admin moderation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    Available,
    Unavailable,
    Removed,
    #[serde(rename = "UNDER_REVIEW")]
    #[sqlx(rename = "UNDER_REVIEW")]
    UnderReview,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "AVAILABLE",
            ProductStatus::Unavailable => "UNAVAILABLE",
            ProductStatus::Removed => "REMOVED",
            ProductStatus::UnderReview => "UNDER_REVIEW",
        }
    }

    /// Only AVAILABLE products can be ordered; everything else fails
    /// validation before the order transaction writes anything.
    pub fn is_orderable(self) -> bool {
        matches!(self, ProductStatus::Available)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(ProductStatus::Available),
            "UNAVAILABLE" => Ok(ProductStatus::Unavailable),
            "REMOVED" => Ok(ProductStatus::Removed),
            "UNDER_REVIEW" => Ok(ProductStatus::UnderReview),
            other => Err(UnknownVariant {
                kind: "product status",
                value: other.to_string(),
            }),
        }
    }
}

/// A product listing owned by exactly one farmer. `farmer_id` is fixed at
/// creation; `quantity` is the remaining stock decremented by orders.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: i64,
    pub farmer_id: i64,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
    pub harvest_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product joined with farm and farmer contact details for public listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub farm_name: String,
    pub farmer_name: String,
    pub barangay: Option<String>,
}
