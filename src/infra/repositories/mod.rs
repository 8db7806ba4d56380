pub mod sqlite_user_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_patient_repo;
pub mod sqlite_order_repo;
pub mod sqlite_settings_repo;

pub mod postgres_user_repo;
pub mod postgres_auth_repo;
pub mod postgres_patient_repo;
pub mod postgres_order_repo;
pub mod postgres_settings_repo;
