use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, OrderRepository, PatientRepository, ResultRelay, ResultStore,
    SettingsRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, lookup::LookupService, order_service::OrderService,
};
use crate::config::Config;
use crate::error::AppError;

/// Backend-specific repositories handed to [`AppState::new`].
pub struct Repositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub patient_repo: Arc<dyn PatientRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub patient_repo: Arc<dyn PatientRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub auth_service: Arc<AuthService>,
    pub order_service: Arc<OrderService>,
    pub lookup_service: Arc<LookupService>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        store: Arc<dyn ResultStore>,
        relay: Arc<dyn ResultRelay>,
    ) -> Result<Self, AppError> {
        let auth_service = Arc::new(AuthService::new(repos.auth_repo.clone(), config.clone())?);
        let order_service = Arc::new(OrderService::new(
            repos.order_repo.clone(),
            repos.patient_repo.clone(),
            repos.settings_repo.clone(),
            store,
            relay,
            config.default_currency.clone(),
        ));
        let lookup_service = Arc::new(LookupService::new(repos.order_repo.clone()));

        Ok(Self {
            config,
            user_repo: repos.user_repo,
            auth_repo: repos.auth_repo,
            patient_repo: repos.patient_repo,
            order_repo: repos.order_repo,
            settings_repo: repos.settings_repo,
            auth_service,
            order_service,
            lookup_service,
        })
    }
}
