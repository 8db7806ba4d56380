use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::settings::{PublicSettings, SettingsUpdate};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    Ok(Json(state.settings_repo.get_or_create().await?))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let current = state.settings_repo.get_or_create().await?;
    let updated = state.settings_repo.update(&current.apply(payload)?).await?;
    info!(by = %ctx.username, relay = updated.relay_target().is_some(), "Settings updated");
    Ok(Json(updated))
}

pub async fn get_public_settings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings_repo.get_or_create().await?;
    Ok(Json(PublicSettings::from(settings)))
}
