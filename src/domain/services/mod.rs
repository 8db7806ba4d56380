pub mod auth_service;
pub mod finance;
pub mod lookup;
pub mod order_service;
pub mod pin;
