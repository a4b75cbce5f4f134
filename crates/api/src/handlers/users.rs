//! Admin handlers for MQTT user management.
//!
//! Passwords arrive in plaintext and are hashed here before they reach
//! the repository; the hash never leaves the service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mqguard_core::error::CoreError;
use mqguard_core::types::DbId;
use mqguard_db::models::user::{CreateUser, UpdateUser};
use mqguard_db::repositories::UserRepo;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/users
///
/// Create an MQTT user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    if input.username.trim().is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }
    if input.password.is_empty() {
        return Err(AppError::BadRequest("password must not be empty".into()));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        input.username.trim(),
        &password_hash,
        input.client_id.as_deref(),
        input.is_superuser.unwrap_or(false),
        input.publish_acl.as_deref().unwrap_or(""),
        input.subscribe_acl.as_deref().unwrap_or(""),
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "MQTT user created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// GET /api/v1/users
///
/// List all MQTT users.
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/v1/users/{id}
///
/// Partially update a user. A password change or deactivation bumps the
/// user's cache version; already-cached auth results remain valid until
/// their TTL expires.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    let password_hash = match &input.password {
        Some(password) if password.is_empty() => {
            return Err(AppError::BadRequest("password must not be empty".into()));
        }
        Some(password) => Some(
            hash_password(password)
                .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?,
        ),
        None => None,
    };

    let updated = UserRepo::update(
        &state.pool,
        user_id,
        password_hash.as_deref(),
        input.client_id.as_deref(),
        input.is_superuser,
        input.is_active,
        input.publish_acl.as_deref(),
        input.subscribe_acl.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: user_id,
    }))?;

    tracing::info!(user_id, username = %updated.username, "MQTT user updated");

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = UserRepo::delete(&state.pool, user_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }));
    }

    tracing::info!(user_id, "MQTT user deleted");

    Ok(StatusCode::NO_CONTENT)
}
