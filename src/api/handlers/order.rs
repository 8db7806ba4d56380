use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateOrderRequest, ListOrdersParams, LockOrderRequest};
use crate::api::dtos::responses::DeletedResponse;
use crate::domain::models::order::OrderView;
use crate::domain::services::order_service::CreateOrderInput;
use crate::error::AppError;
use std::sync::Arc;
use tracing::debug;

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.create_order(&ctx, CreateOrderInput {
        name: payload.name,
        phone: payload.phone,
        test: payload.test,
        price: payload.price,
        currency: payload.currency,
        notes: payload.notes,
    }).await?;
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ListOrdersParams>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.order_service.list_orders(params.status).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect::<Vec<_>>()))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.get_order(&order_id).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.order_service.delete_order(&ctx, &order_id).await?;
    Ok(Json(DeletedResponse { status: "deleted", id: order_id }))
}

/// Accepts the result as the multipart field `file`.
pub async fn upload_result(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(order_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name()
            .map(str::to_string)
            .ok_or(AppError::Validation("Uploaded file has no name".into()))?;
        let bytes = field.bytes().await
            .map_err(|e| AppError::Validation(format!("Upload could not be read: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or(AppError::Validation("No file uploaded".into()))?;
    debug!(order_id = %order_id, size = bytes.len(), "Received result upload {}", file_name);

    let order = state.order_service.attach_result(&ctx, &order_id, &file_name, bytes.to_vec()).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn approve_order(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.approve_and_publish(&ctx, &order_id).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn republish_order(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.republish(&ctx, &order_id).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn lock_order(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(order_id): Path<String>,
    Json(payload): Json<LockOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.set_locked(&ctx, &order_id, payload.locked).await?;
    Ok(Json(OrderView::from(order)))
}
