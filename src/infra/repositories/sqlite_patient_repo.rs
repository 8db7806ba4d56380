use crate::domain::{models::patient::Patient, ports::PatientRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqlitePatientRepo {
    pool: SqlitePool,
}

impl SqlitePatientRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for SqlitePatientRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Patient>, AppError> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?")
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
                    "SELECT * FROM patients WHERE name LIKE ? OR phone LIKE ? ORDER BY last_visit DESC LIMIT ?"
                )
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::Database)
            }
            None => {
                sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY last_visit DESC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::Database)
            }
        }
    }
}
