use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, multipart};

use crate::domain::models::order::RelayPayload;
use crate::domain::ports::ResultRelay;
use crate::error::AppError;

/// Forwards uploaded results to the lab's configured publish link as a
/// multipart form.
pub struct HttpResultRelay {
    client: Client,
}

impl HttpResultRelay {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Cannot build relay HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResultRelay for HttpResultRelay {
    async fn relay(&self, payload: &RelayPayload) -> Result<(), AppError> {
        let file_part = multipart::Part::bytes(payload.content.clone())
            .file_name(payload.file_name.clone());

        let form = multipart::Form::new()
            .text("pin", payload.pin.clone())
            .text("patient", payload.patient_name.clone())
            .text("test", payload.test_name.clone())
            .text("phone", payload.phone.clone().unwrap_or_default())
            .text("price", payload.price.to_string())
            .text("currency", payload.currency.clone())
            .part("file", file_part);

        let res = self.client.post(&payload.target_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Relay connection error: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::InternalWithMsg(format!(
                "Relay rejected result. Status: {}, Body: {}", status, text
            )));
        }

        Ok(())
    }
}
