use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::models::order::OrderStatusFilter;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub new_password: Option<String>,
    pub current_password: String,
}

#[derive(Deserialize)]
pub struct FinanceAccessRequest {
    pub allowed: bool,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub name: String,
    pub phone: Option<String>,
    pub test: String,
    pub price: i64,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ListOrdersParams {
    #[serde(default)]
    pub status: OrderStatusFilter,
}

#[derive(Deserialize)]
pub struct LockOrderRequest {
    pub locked: bool,
}

#[derive(Deserialize, Default)]
pub struct PatientSearchParams {
    pub search: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct FinanceParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CheckResultRequest {
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub identifier: String,
}
