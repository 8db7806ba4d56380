use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::path::Path;

use crate::error::AppError;

pub const ALLOWED_RESULT_EXTENSIONS: [&str; 6] = [".pdf", ".jpg", ".jpeg", ".png", ".docx", ".doc"];
pub const MAX_RESULT_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TestOrder {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub test_name: String,
    pub price: i64,
    pub currency: String,
    pub pin: String,
    pub result_file: Option<String>,
    pub published: bool,
    pub admin_approved: bool,
    pub is_locked: bool,
    pub expired_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Created,
    ResultUploaded,
    Published,
    Expired,
}

pub struct NewOrderParams {
    pub patient_name: String,
    pub test_name: String,
    pub price: i64,
    pub currency: String,
    pub pin: String,
    pub notes: Option<String>,
}

impl TestOrder {
    /// Builds an order in `CREATED`. `patient_id` is filled in by the
    /// repository once the patient row has been resolved.
    pub fn new(params: NewOrderParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            patient_id: String::new(),
            patient_name: params.patient_name,
            test_name: params.test_name,
            price: params.price,
            currency: params.currency,
            pin: params.pin,
            result_file: None,
            published: false,
            admin_approved: false,
            is_locked: false,
            expired_at: None,
            notes: params.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> OrderState {
        match (&self.result_file, self.published && self.admin_approved) {
            (Some(_), true) => OrderState::Published,
            (Some(_), false) => OrderState::ResultUploaded,
            (None, _) if self.expired_at.is_some() => OrderState::Expired,
            (None, _) => OrderState::Created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: TestOrder,
    pub state: OrderState,
}

impl From<TestOrder> for OrderView {
    fn from(order: TestOrder) -> Self {
        let state = order.state();
        Self { order, state }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusFilter {
    #[default]
    All,
    Pending,
    Published,
}

/// A published order joined with the phone of its patient, as seen by the
/// public lookup.
#[derive(Debug, FromRow, Clone)]
pub struct PublishedResult {
    pub pin: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub test_name: String,
    pub currency: String,
    pub result_file: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the external publish endpoint receives for one uploaded result.
#[derive(Debug, Clone)]
pub struct RelayPayload {
    pub target_url: String,
    pub pin: String,
    pub patient_name: String,
    pub phone: Option<String>,
    pub test_name: String,
    pub price: i64,
    pub currency: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Checks an uploaded result against the allow-list and size cap and returns
/// its lower-cased extension (with the leading dot).
pub fn validate_result_file(file_name: &str, size: usize) -> Result<String, AppError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    if !ALLOWED_RESULT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(format!(
            "File type not allowed. Allowed types: {}",
            ALLOWED_RESULT_EXTENSIONS.join(", ")
        )));
    }
    if size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }
    if size > MAX_RESULT_FILE_SIZE {
        return Err(AppError::Validation("File too large (maximum 10 MB)".into()));
    }
    Ok(ext)
}

pub fn result_file_name(pin: &str, uploaded_at: DateTime<Utc>, ext: &str) -> String {
    format!("{}_{}{}", pin, uploaded_at.format("%Y%m%d_%H%M%S_%3f"), ext)
}
