//! Handlers for the `/users` resource: registration, sessions, and profiles.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::roles::{is_valid_role, ROLE_USER};
use mes_core::validation::validate_input;
use mes_db::models::user::{CreateUser, UpdateProfile, User, UserFilter, UserResponse};
use mes_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::hash_refresh_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub phone: String,
    /// Honoured only when the caller is an admin.
    pub role: Option<String>,
}

/// Request body for `POST /users/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /users/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `PUT /users/profile`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub real_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// Request body for `PUT /users/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Query parameters for `GET /users/list`.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/users/register
///
/// Public. Without an admin token the new account always gets the `user` role.
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    validate_input(&input)?;

    let role = match (&caller, input.role.as_deref()) {
        (Some(admin), Some(requested)) if admin.is_admin() => {
            if !is_valid_role(requested) {
                return Err(CoreError::Validation(format!("Unknown role '{requested}'")).into());
            }
            requested.to_string()
        }
        _ => ROLE_USER.to_string(),
    };

    if UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .is_some()
    {
        return Err(CoreError::Conflict("Username is already taken".into()).into());
    }
    if UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .is_some()
    {
        return Err(CoreError::Conflict("Email is already registered".into()).into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            real_name: input.real_name,
            phone: input.phone,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: user.into() }),
    ))
}

/// POST /api/v1/users/login
///
/// Unknown users, inactive accounts, and wrong passwords all yield the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid username or password".into()));

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    UserRepo::record_login(&state.pool, user.id).await?;
    let tokens = issue_tokens(&state, user).await?;
    Ok(Json(DataResponse { data: tokens }))
}

/// POST /api/v1/users/refresh
///
/// Exchange a refresh token for a new token pair. The presented token is
/// revoked (rotation), so each refresh token works once.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let token_hash = hash_refresh_token(&input.refresh_token);
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid or expired refresh token".into()));

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid)?;

    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(invalid());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account is not active".into())))?;

    let tokens = issue_tokens(&state, user).await?;
    Ok(Json(DataResponse { data: tokens }))
}

/// POST /api/v1/users/logout
///
/// Revoke all sessions of the caller. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = find_user(&state, auth_user.user_id).await?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    validate_input(&input)?;

    if let Some(email) = &input.email {
        if let Some(other) = UserRepo::find_by_email(&state.pool, email).await? {
            if other.id != auth_user.user_id {
                return Err(CoreError::Conflict("Email is already registered".into()).into());
            }
        }
    }

    let update = UpdateProfile {
        email: input.email,
        real_name: input.real_name,
        phone: input.phone,
    };
    let user = UserRepo::update_profile(&state.pool, auth_user.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;

    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/users/password
///
/// Requires the current password. All sessions are revoked afterwards.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password)?;

    let user = find_user(&state, auth_user.user_id).await?;
    let old_valid = verify_password(&input.old_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !old_valid {
        return Err(CoreError::Validation("Old password is incorrect".into()).into());
    }

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;
    SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/list
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<PaginatedResponse<UserResponse>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let filter = UserFilter {
        keyword: non_empty(params.keyword),
    };

    let users = UserRepo::list(&state.pool, &filter, &page).await?;
    let total = UserRepo::count(&state.pool, &filter).await?;

    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total, page)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: mes_core::types::DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

/// Generate access + refresh tokens and persist the refresh session.
async fn issue_tokens(state: &AppState, user: User) -> AppResult<TokenResponse> {
    let jwt = &state.config.jwt;
    let access_token = jwt
        .sign_access_token(user.id, &user.role)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let refresh = jwt.issue_refresh_token();
    SessionRepo::create(
        &state.pool,
        &mes_db::models::session::CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh.hash,
            expires_at: refresh.expires_at,
        },
    )
    .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token: refresh.token,
        token_type: "Bearer",
        expires_in: jwt.access_expiry_secs(),
        user: user.into(),
    })
}
