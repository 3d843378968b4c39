use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use palengke_common::role::{Role, UserStatus};
use palengke_common::user::{ProfileUpdate, User};
use palengke_common::validate::{
    is_valid_email, normalize_email, MIN_ADMIN_PASSWORD_LEN, MIN_PASSWORD_LEN,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;
use crate::store::NewUser;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/update-profile", put(update_profile))
        .route("/register-farmer", post(register_farmer))
        .route("/create-first-admin", post(create_first_admin))
        .route("/admin/register", post(admin_register))
        .route("/admin/login", post(admin_login))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    full_name: String,
    email: String,
    password: String,
    confirm_password: String,
    contact_number: Option<String>,
    address: Option<String>,
    barangay: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterFarmerRequest {
    farm_name: Option<String>,
    barangay: Option<String>,
    product_categories: Option<String>,
}

fn check_registration(req: &RegisterRequest, min_password: usize) -> Result<String, ApiError> {
    if req.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    if req.password.len() < min_password {
        return Err(ApiError::validation(format!(
            "Password must be at least {min_password} characters"
        )));
    }
    if req.password != req.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    Ok(email)
}

fn check_account_active(user: &User) -> Result<(), ApiError> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Suspended => Err(ApiError::Forbidden("Account is suspended".into())),
        UserStatus::Inactive => Err(ApiError::Forbidden("Account is deactivated".into())),
    }
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = check_registration(&req, MIN_PASSWORD_LEN)?;
    let user = state
        .store
        .create_user(NewUser {
            full_name: req.full_name.trim().to_owned(),
            email,
            password_hash: hash_password(&req.password, state.bcrypt_cost)?,
            role: Role::Customer,
            contact_number: req.contact_number,
            address: req.address,
            barangay: req.barangay,
        })
        .await?;
    let token = state.auth.issue(&user)?;
    tracing::info!(user_id = user.user_id, "customer registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = normalize_email(&req.email);
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".into()))?;
    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::Unauthenticated("Invalid email or password".into()));
    }
    check_account_active(&user)?;
    let token = state.auth.issue(&user)?;
    let farmer = if user.role == Role::Farmer {
        state.store.farmer_by_user(user.user_id).await?
    } else {
        None
    };
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user,
        "farmer": farmer,
    })))
}

async fn profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .user_by_id(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let farmer = if user.role == Role::Farmer {
        state.store.farmer_by_user(user.user_id).await?
    } else {
        None
    };
    Ok(Json(json!({ "success": true, "user": user, "farmer": farmer })))
}

async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }
    let user = state.store.update_profile(caller.user_id, &update).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Converts the authenticated account into a farmer: creates an
/// unverified farm profile and flips the role.
async fn register_farmer(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<RegisterFarmerRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state
        .store
        .user_by_id(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    check_account_active(&user)?;
    let farm_name = match req.farm_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => palengke_common::farmer::default_farm_name(&user.full_name),
    };
    let farmer = state
        .store
        .register_farmer(
            caller.user_id,
            &farm_name,
            req.barangay.as_deref().or(user.barangay.as_deref()),
            req.product_categories.as_deref(),
        )
        .await?;
    tracing::info!(user_id = caller.user_id, farmer_id = farmer.farmer_id, "farmer registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Farmer registration submitted, awaiting verification",
            "farmer": farmer,
        })),
    ))
}

/// Unauthenticated bootstrap, usable only while no admin account exists.
async fn create_first_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if state.store.admin_count().await? > 0 {
        return Err(ApiError::AlreadyInitialized);
    }
    let email = check_registration(&req, MIN_ADMIN_PASSWORD_LEN)?;
    let user = state
        .store
        .create_user(NewUser {
            full_name: req.full_name.trim().to_owned(),
            email,
            password_hash: hash_password(&req.password, state.bcrypt_cost)?,
            role: Role::Admin,
            contact_number: req.contact_number,
            address: req.address,
            barangay: req.barangay,
        })
        .await?;
    let token = state.auth.issue(&user)?;
    tracing::info!(user_id = user.user_id, "first admin created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

async fn admin_register(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.require_role(&[Role::Admin])?;
    let email = check_registration(&req, MIN_ADMIN_PASSWORD_LEN)?;
    let user = state
        .store
        .create_user(NewUser {
            full_name: req.full_name.trim().to_owned(),
            email,
            password_hash: hash_password(&req.password, state.bcrypt_cost)?,
            role: Role::Admin,
            contact_number: req.contact_number,
            address: req.address,
            barangay: req.barangay,
        })
        .await?;
    tracing::info!(admin_id = caller.user_id, new_admin = user.user_id, "admin registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": user })),
    ))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = normalize_email(&req.email);
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".into()))?;
    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::Unauthenticated("Invalid email or password".into()));
    }
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Access denied. Admin credentials required".into(),
        ));
    }
    check_account_active(&user)?;
    let token = state.auth.issue(&user)?;
    Ok(Json(json!({ "success": true, "token": token, "user": user })))
}
