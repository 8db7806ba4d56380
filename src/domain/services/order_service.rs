use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{info, warn, info_span, Instrument};

use crate::domain::models::{
    auth::AuthContext,
    order::{
        NewOrderParams, OrderStatusFilter, RelayPayload, TestOrder,
        result_file_name, validate_result_file,
    },
};
use crate::domain::ports::{
    OrderRepository, PatientRepository, ResultRelay, ResultStore, SettingsRepository,
};
use crate::domain::services::pin::allocate_pin;
use crate::error::AppError;

/// How many times a create is retried when the database reports a unique
/// violation (PIN or patient name raced by a concurrent insert).
const CREATE_ATTEMPTS: usize = 3;

pub struct CreateOrderInput {
    pub name: String,
    pub phone: Option<String>,
    pub test: String,
    pub price: i64,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// Order lifecycle: creation, result attachment, publication and expiry.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    patients: Arc<dyn PatientRepository>,
    settings: Arc<dyn SettingsRepository>,
    store: Arc<dyn ResultStore>,
    relay: Arc<dyn ResultRelay>,
    default_currency: String,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        patients: Arc<dyn PatientRepository>,
        settings: Arc<dyn SettingsRepository>,
        store: Arc<dyn ResultStore>,
        relay: Arc<dyn ResultRelay>,
        default_currency: String,
    ) -> Self {
        Self { orders, patients, settings, store, relay, default_currency }
    }

    pub async fn create_order(&self, ctx: &AuthContext, input: CreateOrderInput) -> Result<TestOrder, AppError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Patient name is required".into()));
        }
        let test_name = input.test.trim().to_string();
        if test_name.is_empty() {
            return Err(AppError::Validation("Test name is required".into()));
        }
        if input.price <= 0 {
            return Err(AppError::Validation("Price must be greater than zero".into()));
        }
        let currency = input.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_currency.as_str())
            .to_uppercase();
        let phone = input.phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let notes = input.notes.filter(|n| !n.trim().is_empty());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let orders = self.orders.clone();
            let pin = allocate_pin(phone.as_deref(), |candidate| {
                let orders = orders.clone();
                async move { orders.pin_exists(&candidate).await }
            }).await?;

            let order = TestOrder::new(NewOrderParams {
                patient_name: name.clone(),
                test_name: test_name.clone(),
                price: input.price,
                currency: currency.clone(),
                pin,
                notes: notes.clone(),
            });

            match self.orders.create_with_patient(&order, phone.as_deref()).await {
                Ok(created) => {
                    info!(order_id = %created.id, pin = %created.pin, by = %ctx.username, "Order created for patient {}", created.patient_name);
                    return Ok(created);
                }
                Err(e) if e.is_unique_violation() && attempt < CREATE_ATTEMPTS => {
                    warn!(attempt, "Order insert raced a concurrent write, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_order(&self, id: &str) -> Result<TestOrder, AppError> {
        self.orders.find_by_id(id).await?
            .ok_or(AppError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn list_orders(&self, filter: OrderStatusFilter) -> Result<Vec<TestOrder>, AppError> {
        self.orders.list(filter).await
    }

    /// Stores the uploaded file and moves the order to `RESULT_UPLOADED`.
    /// The file is written before the row references it; any earlier
    /// publication is revoked until an admin approves again.
    pub async fn attach_result(
        &self,
        ctx: &AuthContext,
        order_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<TestOrder, AppError> {
        let order = self.get_order(order_id).await?;
        if order.is_locked {
            return Err(AppError::Conflict("Order is locked".into()));
        }
        let ext = validate_result_file(file_name, content.len())?;
        let stored_name = result_file_name(&order.pin, Utc::now(), &ext);

        self.store.save(&stored_name, &content).await?;

        let updated = match self.orders.record_result(&order.id, &stored_name).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(cleanup) = self.store.remove(&stored_name).await {
                    warn!("Failed to remove orphaned result file {}: {}", stored_name, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(previous) = order.result_file.filter(|p| *p != stored_name)
            && let Err(e) = self.store.remove(&previous).await {
            warn!("Failed to remove replaced result file {}: {}", previous, e);
        }

        info!(order_id = %updated.id, pin = %updated.pin, by = %ctx.username, file = %stored_name, "Result uploaded");

        self.spawn_relay(&updated, stored_name, content).await;
        Ok(updated)
    }

    async fn spawn_relay(&self, order: &TestOrder, file_name: String, content: Vec<u8>) {
        let target = match self.settings.get_or_create().await {
            Ok(settings) => settings.relay_target().map(str::to_string),
            Err(e) => {
                warn!("Skipping result relay, settings unavailable: {}", e);
                None
            }
        };
        let Some(target_url) = target else { return };

        let phone = match self.patients.find_by_id(&order.patient_id).await {
            Ok(patient) => patient.and_then(|p| p.phone),
            Err(e) => {
                warn!("Relaying result without phone, patient lookup failed: {}", e);
                None
            }
        };

        let payload = RelayPayload {
            target_url,
            pin: order.pin.clone(),
            patient_name: order.patient_name.clone(),
            phone,
            test_name: order.test_name.clone(),
            price: order.price,
            currency: order.currency.clone(),
            file_name,
            content,
        };

        let relay = self.relay.clone();
        let span = info_span!("result_relay", pin = %payload.pin);
        tokio::spawn(
            async move {
                match relay.relay(&payload).await {
                    Ok(()) => info!("Result relayed to {}", payload.target_url),
                    Err(e) => warn!("Result relay to {} failed: {}", payload.target_url, e),
                }
            }
            .instrument(span),
        );
    }

    /// Makes an uploaded result publicly retrievable. Without an attached
    /// result this leaves the order untouched.
    pub async fn approve_and_publish(&self, ctx: &AuthContext, order_id: &str) -> Result<TestOrder, AppError> {
        ctx.require_admin()?;
        let order = self.get_order(order_id).await?;

        match self.orders.approve(&order.id).await? {
            Some(published) => {
                info!(order_id = %published.id, pin = %published.pin, by = %ctx.username, "Result approved and published");
                Ok(published)
            }
            None => {
                warn!(order_id = %order.id, "Approve requested but no result is attached");
                Ok(order)
            }
        }
    }

    /// Re-publishes a result whose file is still on disk.
    pub async fn republish(&self, ctx: &AuthContext, order_id: &str) -> Result<TestOrder, AppError> {
        ctx.require_admin()?;
        let order = self.get_order(order_id).await?;

        let file = order.result_file.as_deref()
            .ok_or(AppError::Validation("No result file attached".into()))?;
        if !self.store.exists(file).await {
            return Err(AppError::Validation("Result file no longer exists".into()));
        }

        let published = self.orders.approve(&order.id).await?
            .ok_or(AppError::Validation("No result file attached".into()))?;
        info!(order_id = %published.id, pin = %published.pin, by = %ctx.username, "Result republished");
        Ok(published)
    }

    pub async fn set_locked(&self, ctx: &AuthContext, order_id: &str, locked: bool) -> Result<TestOrder, AppError> {
        ctx.require_admin()?;
        let order = self.get_order(order_id).await?;
        let updated = self.orders.set_locked(&order.id, locked).await?;
        info!(order_id = %updated.id, locked, by = %ctx.username, "Order lock changed");
        Ok(updated)
    }

    pub async fn delete_order(&self, ctx: &AuthContext, order_id: &str) -> Result<(), AppError> {
        ctx.require_admin()?;
        let order = self.get_order(order_id).await?;
        if order.is_locked {
            return Err(AppError::Conflict("Order is locked".into()));
        }

        if let Some(file) = &order.result_file
            && let Err(e) = self.store.remove(file).await {
            warn!("Failed to remove result file {} of deleted order: {}", file, e);
        }

        self.orders.delete(&order.id).await?;
        info!(order_id = %order.id, pin = %order.pin, by = %ctx.username, "Order deleted");
        Ok(())
    }

    /// Purges published results created before `cutoff`. Files go first,
    /// then all affected rows are cleared in one transaction.
    pub async fn expire_published_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let candidates = self.orders.list_published_before(cutoff).await?;
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut batch = Vec::with_capacity(candidates.len());
        for order in candidates {
            let Some(file) = order.result_file else { continue };
            if let Err(e) = self.store.remove(&file).await {
                warn!("Failed to remove expired result file {}: {}", file, e);
            }
            batch.push((order.id, file));
        }

        let expired = self.orders.expire_results(&batch, Utc::now()).await?;
        info!(expired, cutoff = %cutoff, "Expired published results");
        Ok(expired)
    }
}
