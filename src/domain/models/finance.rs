use serde::Serialize;
use chrono::NaiveDate;

use super::order::TestOrder;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CurrencyTotal {
    pub currency: String,
    pub total: i64,
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FinanceReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub totals: Vec<CurrencyTotal>,
    pub orders: Vec<TestOrder>,
}

#[derive(Debug, Serialize, Default)]
pub struct DashboardStats {
    pub patient_count: i64,
    pub order_count: i64,
    pub today_orders: i64,
    pub pending_results: i64,
}
