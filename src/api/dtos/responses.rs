use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub id: String,
}
