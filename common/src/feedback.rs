use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer's rating and comment on a product. Read-side only: feeds
/// farmer dashboards, reviews and the recommendation reports.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub feedback_id: i64,
    pub product_id: i64,
    pub customer_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Distribution of ratings for a review listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingStats {
    pub average: f64,
    pub total: i64,
    pub distribution: [i64; 5],
}

impl RatingStats {
    /// Build stats from raw 1-5 ratings. Out-of-range values are ignored.
    pub fn from_ratings(ratings: &[i64]) -> Self {
        let mut distribution = [0i64; 5];
        let mut sum = 0i64;
        let mut total = 0i64;
        for &r in ratings {
            if (1..=5).contains(&r) {
                distribution[(r - 1) as usize] += 1;
                sum += r;
                total += 1;
            }
        }
        let average = if total > 0 {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };
        RatingStats {
            average,
            total,
            distribution,
        }
    }
}
