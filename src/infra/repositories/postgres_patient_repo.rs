use crate::domain::{models::patient::Patient, ports::PatientRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresPatientRepo {
    pool: PgPool,
}

impl PostgresPatientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for PostgresPatientRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Patient>, AppError> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn search(&self, query: Option<&str>, limit: i64) -> Result<Vec<Patient>, AppError> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", q);
                sqlx::query_as::<_, Patient>(
                    "SELECT * FROM patients WHERE name ILIKE $1 OR phone ILIKE $2 ORDER BY last_visit DESC LIMIT $3"
                )
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::Database)
            }
            None => {
                sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY last_visit DESC LIMIT $1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::Database)
            }
        }
    }
}
