use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::order::TestOrder;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub last_visit: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(name: String, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            phone,
            age: None,
            gender: None,
            address: None,
            notes: None,
            last_visit: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PatientHistory {
    #[serde(flatten)]
    pub patient: Patient,
    pub orders: Vec<TestOrder>,
}
