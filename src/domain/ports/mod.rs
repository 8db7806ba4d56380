use crate::domain::models::{
    user::User, patient::Patient, auth::RefreshTokenRecord, settings::SystemSettings,
    order::{TestOrder, OrderStatusFilter, PublishedResult, RelayPayload},
    finance::DashboardStats,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update_credentials(&self, id: &str, username: &str, password_hash: &str) -> Result<User, AppError>;
    async fn set_finance_access(&self, id: &str, allowed: bool) -> Result<User, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Patient>, AppError>;
    async fn search(&self, query: Option<&str>, limit: i64) -> Result<Vec<Patient>, AppError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Resolves the patient by `order.patient_name` (creating it or bumping
    /// its last visit) and inserts the order, all in one transaction.
    async fn create_with_patient(&self, order: &TestOrder, phone: Option<&str>) -> Result<TestOrder, AppError>;
    async fn pin_exists(&self, pin: &str) -> Result<bool, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<TestOrder>, AppError>;
    async fn list(&self, filter: OrderStatusFilter) -> Result<Vec<TestOrder>, AppError>;
    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<TestOrder>, AppError>;
    async fn list_created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TestOrder>, AppError>;
    async fn record_result(&self, id: &str, file_name: &str) -> Result<TestOrder, AppError>;
    /// Publishes the order only if a result is attached; `None` otherwise.
    async fn approve(&self, id: &str) -> Result<Option<TestOrder>, AppError>;
    async fn set_locked(&self, id: &str, locked: bool) -> Result<TestOrder, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn find_published_by_pin(&self, pin: &str) -> Result<Option<PublishedResult>, AppError>;
    async fn is_published_file(&self, file_name: &str) -> Result<bool, AppError>;
    async fn list_published_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<TestOrder>, AppError>;
    /// Clears `(order_id, result_file)` pairs in a single transaction and
    /// returns how many rows were expired.
    async fn expire_results(&self, batch: &[(String, String)], expired_at: DateTime<Utc>) -> Result<u64, AppError>;
    async fn dashboard_stats(&self, day_start: DateTime<Utc>, day_end: DateTime<Utc>) -> Result<DashboardStats, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_or_create(&self) -> Result<SystemSettings, AppError>;
    async fn update(&self, settings: &SystemSettings) -> Result<SystemSettings, AppError>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<(), AppError>;
    /// Removes a stored result. A file that is already gone is not an error.
    async fn remove(&self, file_name: &str) -> Result<(), AppError>;
    async fn exists(&self, file_name: &str) -> bool;
}

#[async_trait]
pub trait ResultRelay: Send + Sync {
    async fn relay(&self, payload: &RelayPayload) -> Result<(), AppError>;
}
