use crate::domain::{models::settings::SystemSettings, ports::SettingsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresSettingsRepo {
    pool: PgPool,
}

impl PostgresSettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepo {
    async fn get_or_create(&self) -> Result<SystemSettings, AppError> {
        let defaults = SystemSettings::default();
        sqlx::query(
            "INSERT INTO settings (id, lab_name, publish_link, default_language, show_finance, show_language_switch, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT(id) DO NOTHING"
        )
            .bind(defaults.id)
            .bind(&defaults.lab_name)
            .bind(&defaults.publish_link)
            .bind(&defaults.default_language)
            .bind(defaults.show_finance)
            .bind(defaults.show_language_switch)
            .bind(defaults.updated_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        sqlx::query_as::<_, SystemSettings>("SELECT * FROM settings WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, settings: &SystemSettings) -> Result<SystemSettings, AppError> {
        self.get_or_create().await?;
        sqlx::query_as::<_, SystemSettings>(
            "UPDATE settings SET lab_name = $1, publish_link = $2, default_language = $3, show_finance = $4, show_language_switch = $5, updated_at = $6
             WHERE id = 1
             RETURNING *"
        )
            .bind(&settings.lab_name)
            .bind(&settings.publish_link)
            .bind(&settings.default_language)
            .bind(settings.show_finance)
            .bind(settings.show_language_switch)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
