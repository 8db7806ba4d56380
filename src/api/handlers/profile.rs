use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{FinanceAccessRequest, UpdateProfileRequest};
use crate::domain::models::auth::UserProfile;
use crate::domain::services::auth_service::{hash_password, verify_password};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&ctx.user_id).await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(UserProfile::from(user)))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&ctx.user_id).await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }

    let username = match payload.username.as_deref().map(str::trim) {
        Some("") => return Err(AppError::Validation("Username cannot be empty".into())),
        Some(name) => name.to_string(),
        None => user.username.clone(),
    };

    let password_hash = match payload.new_password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            return Err(AppError::Validation(format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
        }
        Some(p) => hash_password(p)?,
        None => user.password_hash.clone(),
    };

    let updated = state.user_repo.update_credentials(&user.id, &username, &password_hash).await?;
    info!(user_id = %updated.id, "Profile updated");
    Ok(Json(UserProfile::from(updated)))
}

pub async fn set_finance_access(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<FinanceAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let updated = state.user_repo.set_finance_access(&user_id, payload.allowed).await?;
    info!(user_id = %updated.id, allowed = payload.allowed, by = %ctx.username, "Finance access changed");
    Ok(Json(UserProfile::from(updated)))
}
