use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::state::{AppState, Repositories};
use crate::domain::models::auth::Role;
use crate::domain::ports::ResultRelay;
use crate::domain::services::auth_service::create_account;
use crate::infra::relay::http_result_relay::HttpResultRelay;
use crate::infra::storage::local_result_store::LocalResultStore;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_order_repo::PostgresOrderRepo,
    postgres_patient_repo::PostgresPatientRepo, postgres_settings_repo::PostgresSettingsRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_order_repo::SqliteOrderRepo,
    sqlite_patient_repo::SqlitePatientRepo, sqlite_settings_repo::SqliteSettingsRepo,
    sqlite_user_repo::SqliteUserRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let relay = Arc::new(HttpResultRelay::new(config.relay_timeout)?);
    bootstrap_state_with_relay(config, relay).await
}

/// Connects the database selected by `DATABASE_URL`, migrates it, prepares the
/// results directory and seeds the default accounts and settings row.
pub async fn bootstrap_state_with_relay(config: &Config, relay: Arc<dyn ResultRelay>) -> Result<AppState, AppError> {
    let store = LocalResultStore::new(config.results_dir.clone());
    store.ensure_root().await?;

    let repos = connect_repositories(&config.database_url).await?;
    let state = AppState::new(config.clone(), repos, Arc::new(store), relay)?;

    seed_default_users(&state).await?;
    let settings = state.settings_repo.get_or_create().await?;
    info!(lab_name = %settings.lab_name, "Settings loaded");

    Ok(state)
}

pub fn is_postgres_url(database_url: &str) -> bool {
    database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
}

/// Opens the pool for `database_url` and applies pending migrations.
pub async fn connect_repositories(database_url: &str) -> Result<Repositories, AppError> {
    if is_postgres_url(database_url) {
        info!("Initializing PostgreSQL connection...");
        let pool = connect_postgres(database_url).await?;
        run_postgres_migrations(&pool).await?;

        Ok(Repositories {
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth_repo: Arc::new(PostgresAuthRepo::new(pool.clone())),
            patient_repo: Arc::new(PostgresPatientRepo::new(pool.clone())),
            order_repo: Arc::new(PostgresOrderRepo::new(pool.clone())),
            settings_repo: Arc::new(PostgresSettingsRepo::new(pool)),
        })
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        let pool = connect_sqlite(database_url).await?;
        run_sqlite_migrations(&pool).await?;

        Ok(Repositories {
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
            patient_repo: Arc::new(SqlitePatientRepo::new(pool.clone())),
            order_repo: Arc::new(SqliteOrderRepo::new(pool.clone())),
            settings_repo: Arc::new(SqliteSettingsRepo::new(pool)),
        })
    }
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts: PgConnectOptions = database_url.parse()
        .map_err(|e| AppError::Config(format!("Invalid Postgres URL: {}", e)))?;
    let opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    Ok(PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await?)
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid SQLite connection string: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?)
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Postgres migrations failed: {}", e)))
}

async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("SQLite migrations failed: {}", e)))
}

/// Creates the `admin` and `staff` accounts on a fresh database.
async fn seed_default_users(state: &AppState) -> Result<(), AppError> {
    let seeds = [
        ("admin", Role::Admin, &state.config.seed_admin_password),
        ("staff", Role::Employee, &state.config.seed_staff_password),
    ];

    for (username, role, password) in seeds {
        if create_account(state.user_repo.as_ref(), username, password, role).await?.is_some() {
            info!(username, role = %role, "Seeded default user");
        }
    }
    Ok(())
}
