use crate::domain::{
    models::{
        finance::DashboardStats,
        order::{OrderStatusFilter, PublishedResult, TestOrder},
        patient::Patient,
    },
    ports::OrderRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{SqlitePool, Row};
use chrono::{DateTime, Utc};

pub struct SqliteOrderRepo {
    pool: SqlitePool,
}

impl SqliteOrderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepo {
    async fn create_with_patient(&self, order: &TestOrder, phone: Option<&str>) -> Result<TestOrder, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();

        let existing = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE name = ?")
            .bind(&order.patient_name)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let patient_id = match existing {
            Some(patient) => {
                sqlx::query("UPDATE patients SET last_visit = ?, phone = COALESCE(phone, ?) WHERE id = ?")
                    .bind(now).bind(phone).bind(&patient.id)
                    .execute(&mut *tx).await.map_err(AppError::Database)?;
                patient.id
            }
            None => {
                let patient = Patient::new(order.patient_name.clone(), phone.map(str::to_string));
                sqlx::query("INSERT INTO patients (id, name, phone, last_visit, created_at) VALUES (?, ?, ?, ?, ?)")
                    .bind(&patient.id).bind(&patient.name).bind(&patient.phone)
                    .bind(patient.last_visit).bind(patient.created_at)
                    .execute(&mut *tx).await.map_err(AppError::Database)?;
                patient.id
            }
        };

        let created = sqlx::query_as::<_, TestOrder>(
            "INSERT INTO orders (id, patient_id, patient_name, test_name, price, currency, pin, result_file, published, admin_approved, is_locked, expired_at, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&order.id).bind(&patient_id).bind(&order.patient_name).bind(&order.test_name)
            .bind(order.price).bind(&order.currency).bind(&order.pin).bind(&order.result_file)
            .bind(order.published).bind(order.admin_approved).bind(order.is_locked).bind(order.expired_at)
            .bind(&order.notes).bind(order.created_at).bind(order.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn pin_exists(&self, pin: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE pin = ?)")
            .bind(pin)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TestOrder>, AppError> {
        sqlx::query_as::<_, TestOrder>("SELECT * FROM orders WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, filter: OrderStatusFilter) -> Result<Vec<TestOrder>, AppError> {
        let sql = match filter {
            OrderStatusFilter::All => "SELECT * FROM orders ORDER BY created_at DESC",
            OrderStatusFilter::Pending => "SELECT * FROM orders WHERE published = FALSE ORDER BY created_at DESC",
            OrderStatusFilter::Published => "SELECT * FROM orders WHERE published = TRUE ORDER BY created_at DESC",
        };
        sqlx::query_as::<_, TestOrder>(sql).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<TestOrder>, AppError> {
        sqlx::query_as::<_, TestOrder>("SELECT * FROM orders WHERE patient_id = ? ORDER BY created_at DESC").bind(patient_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TestOrder>, AppError> {
        sqlx::query_as::<_, TestOrder>("SELECT * FROM orders WHERE created_at >= ? AND created_at < ? ORDER BY created_at DESC").bind(start).bind(end).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn record_result(&self, id: &str, file_name: &str) -> Result<TestOrder, AppError> {
        sqlx::query_as::<_, TestOrder>(
            "UPDATE orders SET result_file = ?, published = FALSE, admin_approved = FALSE, expired_at = NULL, updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
            .bind(file_name).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Order not found".into()))
    }

    async fn approve(&self, id: &str) -> Result<Option<TestOrder>, AppError> {
        sqlx::query_as::<_, TestOrder>(
            "UPDATE orders SET published = TRUE, admin_approved = TRUE, updated_at = ?
             WHERE id = ? AND result_file IS NOT NULL
             RETURNING *"
        )
            .bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_locked(&self, id: &str, locked: bool) -> Result<TestOrder, AppError> {
        sqlx::query_as::<_, TestOrder>("UPDATE orders SET is_locked = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(locked).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Order not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Order not found".into())); }
        Ok(())
    }

    async fn find_published_by_pin(&self, pin: &str) -> Result<Option<PublishedResult>, AppError> {
        sqlx::query_as::<_, PublishedResult>(
            "SELECT o.pin, o.patient_name, p.phone AS patient_phone, o.test_name, o.currency, o.result_file, o.created_at
             FROM orders o LEFT JOIN patients p ON p.id = o.patient_id
             WHERE o.pin = ? AND o.published = TRUE AND o.admin_approved = TRUE AND o.result_file IS NOT NULL"
        )
            .bind(pin)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn is_published_file(&self, file_name: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE result_file = ? AND published = TRUE AND admin_approved = TRUE)")
            .bind(file_name)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_published_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<TestOrder>, AppError> {
        sqlx::query_as::<_, TestOrder>("SELECT * FROM orders WHERE published = TRUE AND created_at < ?").bind(cutoff).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn expire_results(&self, batch: &[(String, String)], expired_at: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut expired = 0;
        for (id, file) in batch {
            let result = sqlx::query(
                "UPDATE orders SET result_file = NULL, published = FALSE, expired_at = ?, updated_at = ?
                 WHERE id = ? AND result_file = ? AND published = TRUE"
            )
                .bind(expired_at).bind(expired_at).bind(id).bind(file)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            expired += result.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(expired)
    }

    async fn dashboard_stats(&self, day_start: DateTime<Utc>, day_end: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM patients) AS patient_count,
                (SELECT COUNT(*) FROM orders) AS order_count,
                (SELECT COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ?) AS today_orders,
                (SELECT COUNT(*) FROM orders WHERE published = FALSE) AS pending_results"
        )
            .bind(day_start).bind(day_end)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        Ok(DashboardStats {
            patient_count: row.get::<i64, _>("patient_count"),
            order_count: row.get::<i64, _>("order_count"),
            today_orders: row.get::<i64, _>("today_orders"),
            pending_results: row.get::<i64, _>("pending_results"),
        })
    }
}
