use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::{Role, UserStatus};

/// A registered account. The `password` field holds the bcrypt hash and is
/// never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub status: UserStatus,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.contact_number.is_none()
            && self.address.is_none()
            && self.barangay.is_none()
    }
}
