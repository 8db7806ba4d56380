use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, error};

use crate::domain::models::order::PublishedResult;
use crate::domain::ports::OrderRepository;

/// Shortest name prefix accepted as a secondary identifier.
pub const MIN_NAME_PREFIX_CHARS: usize = 3;

const NOT_FOUND_MESSAGE: &str = "Result not found or not published yet";
const ERROR_MESSAGE: &str = "An error occurred while searching";

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResponse {
    Success {
        patient: String,
        test: String,
        file: String,
        date: String,
        currency: String,
    },
    NotFound { message: String },
    Error { message: String },
}

impl LookupResponse {
    fn not_found() -> Self {
        LookupResponse::NotFound { message: NOT_FOUND_MESSAGE.to_string() }
    }
}

impl From<PublishedResult> for LookupResponse {
    fn from(r: PublishedResult) -> Self {
        LookupResponse::Success {
            patient: r.patient_name,
            test: r.test_name,
            file: format!("/results_files/{}", r.result_file),
            date: r.created_at.format("%Y-%m-%d").to_string(),
            currency: r.currency,
        }
    }
}

/// The identifier matches when it is the patient's phone, or a long enough
/// prefix of the name printed on the order.
pub fn identifier_matches(result: &PublishedResult, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    if result.patient_phone.as_deref().map(str::trim) == Some(identifier) {
        return true;
    }
    identifier.chars().count() >= MIN_NAME_PREFIX_CHARS
        && result.patient_name.to_lowercase().starts_with(&identifier.to_lowercase())
}

/// Public result lookup. Every miss looks the same to the caller, whether
/// the PIN is unknown, unpublished, or paired with the wrong identifier.
pub struct LookupService {
    orders: Arc<dyn OrderRepository>,
}

impl LookupService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn check_result(&self, pin: &str, identifier: &str) -> LookupResponse {
        let pin = pin.trim();
        let identifier = identifier.trim();
        if pin.is_empty() || identifier.is_empty() {
            return LookupResponse::not_found();
        }

        match self.orders.find_published_by_pin(pin).await {
            Ok(Some(result)) if identifier_matches(&result, identifier) => result.into(),
            Ok(_) => {
                debug!("Public lookup miss");
                LookupResponse::not_found()
            }
            Err(e) => {
                error!("Public lookup failed: {:?}", e);
                LookupResponse::Error { message: ERROR_MESSAGE.to_string() }
            }
        }
    }
}
