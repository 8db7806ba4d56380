use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::PatientSearchParams;
use crate::domain::models::patient::PatientHistory;
use crate::error::AppError;
use std::sync::Arc;

const PATIENT_LIST_LIMIT: i64 = 200;

pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<PatientSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let patients = state.patient_repo.search(search, PATIENT_LIST_LIMIT).await?;
    Ok(Json(patients))
}

pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let patient = state.patient_repo.find_by_id(&patient_id).await?
        .ok_or(AppError::NotFound(format!("Patient {} not found", patient_id)))?;
    let orders = state.order_repo.list_by_patient(&patient.id).await?;
    Ok(Json(PatientHistory { patient, orders }))
}
