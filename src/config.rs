use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Upper bound for `RESULT_RETENTION_DAYS` (100 years).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub results_dir: PathBuf,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub default_currency: String,
    pub retention_days: i64,
    pub sweep_interval: Duration,
    pub relay_timeout: Duration,
    pub seed_admin_password: String,
    pub seed_staff_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            database_url: required("DATABASE_URL")?,
            port: parsed("PORT", 3000)?,
            results_dir: PathBuf::from(env::var("RESULTS_DIR").unwrap_or_else(|_| "results_files".to_string())),
            jwt_secret_key: required("JWT_SECRET_KEY")?,
            jwt_public_key: required("JWT_PUBLIC_KEY")?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.lab.local".to_string()),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "EGP".to_string()),
            retention_days: parsed("RESULT_RETENTION_DAYS", 14)?,
            sweep_interval: Duration::from_secs(parsed("SWEEP_INTERVAL_SECS", 24 * 60 * 60)?),
            relay_timeout: Duration::from_secs(parsed("RELAY_TIMEOUT_SECS", 10)?),
            seed_admin_password: env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            seed_staff_password: env::var("SEED_STAFF_PASSWORD").unwrap_or_else(|_| "staff123".to_string()),
        };
        config.validate()
    }

    /// Rejects values the sweeper cannot work with.
    pub fn validate(self) -> Result<Self, AppError> {
        if self.sweep_interval.is_zero() {
            return Err(AppError::Config("SWEEP_INTERVAL_SECS must be greater than zero".into()));
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(AppError::Config(format!(
                "RESULT_RETENTION_DAYS must be between 0 and {}", MAX_RETENTION_DAYS
            )));
        }
        Ok(self)
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{} must be set", key)))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
