pub mod auth;
pub mod finance;
pub mod health;
pub mod order;
pub mod patient;
pub mod profile;
pub mod public;
pub mod settings;
