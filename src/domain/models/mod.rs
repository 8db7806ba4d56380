pub mod auth;
pub mod finance;
pub mod order;
pub mod patient;
pub mod settings;
pub mod user;
