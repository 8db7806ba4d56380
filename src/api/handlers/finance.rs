use axum::{extract::{State, Query}, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::FinanceParams;
use crate::domain::models::finance::FinanceReport;
use crate::domain::services::finance::{can_view_finance, date_range_bounds, totals_by_currency};
use crate::error::AppError;
use std::sync::Arc;

pub async fn finance_report(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Query(params): Query<FinanceParams>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&ctx.user_id).await?
        .ok_or(AppError::Unauthorized)?;
    let settings = state.settings_repo.get_or_create().await?;
    if !can_view_finance(&ctx, user.can_view_finance, settings.show_finance) {
        return Err(AppError::Forbidden("Finance access not granted".into()));
    }

    let today = Utc::now().date_naive();
    let start_date = params.start_date.unwrap_or(today);
    let end_date = params.end_date.unwrap_or(today.max(start_date));
    if end_date < start_date {
        return Err(AppError::Validation("end_date must not be before start_date".into()));
    }

    let (start, end) = date_range_bounds(start_date, end_date);
    let orders = state.order_repo.list_created_between(start, end).await?;

    Ok(Json(FinanceReport {
        start_date,
        end_date,
        totals: totals_by_currency(&orders),
        orders,
    }))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let (start, end) = date_range_bounds(today, today);
    Ok(Json(state.order_repo.dashboard_stats(start, end).await?))
}
