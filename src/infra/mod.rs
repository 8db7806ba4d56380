pub mod factory;
pub mod relay;
pub mod repositories;
pub mod storage;
