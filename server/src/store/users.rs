use chrono::Utc;
use palengke_common::farmer::default_farm_name;
use palengke_common::role::{Role, UserStatus};
use palengke_common::user::{ProfileUpdate, User};
use sqlx::QueryBuilder;

use super::{PageParams, Pagination, Store};
use crate::error::ApiError;

/// Row to insert for a fresh account. Email is already normalized and the
/// password already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
}

impl Store {
    pub async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (full_name, email, password, role, status, contact_number, address, barangay, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(UserStatus::Active)
        .bind(&new.contact_number)
        .bind(&new.address)
        .bind(&new.barangay)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Email already registered".into())
            }
            _ => ApiError::from(err),
        })?;
        self.user_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ApiError::Internal("created user vanished".into()))
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn admin_count(&self) -> Result<i64, ApiError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        sqlx::query(
            "UPDATE users SET
                full_name = COALESCE(?, full_name),
                contact_number = COALESCE(?, contact_number),
                address = COALESCE(?, address),
                barangay = COALESCE(?, barangay),
                updated_at = ?
             WHERE user_id = ?",
        )
        .bind(&update.full_name)
        .bind(&update.contact_number)
        .bind(&update.address)
        .bind(&update.barangay)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        self.user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn set_user_status(
        &self,
        user_id: i64,
        status: UserStatus,
    ) -> Result<User, ApiError> {
        let result = sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE user_id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User not found"));
        }
        self.user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Change a user's role and keep the farmer registry in sync, all in
    /// one transaction. Promoting to FARMER creates a default farm
    /// profile; demoting away from FARMER removes it.
    pub async fn set_user_role(
        &self,
        user_id: i64,
        new_role: Role,
    ) -> Result<(User, Option<&'static str>), ApiError> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        let now = Utc::now();
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE user_id = ?")
            .bind(new_role)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut note = None;
        if user.role == Role::Farmer && new_role != Role::Farmer {
            sqlx::query("DELETE FROM farmers WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            note = Some("Farmer profile removed");
        } else if user.role != Role::Farmer && new_role == Role::Farmer {
            sqlx::query(
                "INSERT OR IGNORE INTO farmers (user_id, farm_name, barangay, created_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(default_farm_name(&user.full_name))
            .bind(
                user.barangay
                    .as_deref()
                    .or(user.address.as_deref())
                    .unwrap_or("Not specified"),
            )
            .bind(now)
            .execute(&mut *tx)
            .await?;
            note = Some("Farmer profile created");
        }
        tx.commit().await?;

        let updated = self
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok((updated, note))
    }

    pub async fn list_users(
        &self,
        role: Option<Role>,
        status: Option<UserStatus>,
        page: PageParams,
    ) -> Result<(Vec<User>, Pagination), ApiError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        for builder in [&mut count, &mut query] {
            if let Some(role) = role {
                builder.push(" AND role = ").push_bind(role);
            }
            if let Some(status) = status {
                builder.push(" AND status = ").push_bind(status);
            }
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok((users, Pagination::new(total, page.page(), page.limit())))
    }
}
