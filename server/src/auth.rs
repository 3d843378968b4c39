use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use palengke_common::role::Role;
use palengke_common::user::User;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Issued tokens stay valid for a week.
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub exp: i64,
}

/// HS256 signing and verification keys, derived once from the configured
/// secret and shared through [`AppState`].
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        AuthKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let claims = Claims {
            user_id: user.user_id,
            email: user.email.clone(),
            role: user.role,
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".into()))
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(password, hash)?)
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Handlers take this as an argument; routes without it are public.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Role gate. Admins pass every gate that lists them; everyone else
    /// must match one of `required` exactly.
    pub fn require_role(&self, required: &[Role]) -> Result<(), ApiError> {
        if required.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::RoleDenied {
                actual: self.role,
                required: required.to_vec(),
            })
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthenticated("Authentication required".into()))?;
        let claims = state.auth.verify(token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Optional variant for endpoints that personalize when a token is present
/// but stay public otherwise. A malformed token counts as anonymous.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(None);
        };
        Ok(state.auth.verify(token).ok().map(|claims| AuthUser {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }))
    }
}
