// pasar-api/src/services/mod.rs

pub mod auth_service;
pub mod order_service;
pub mod payment;
pub mod review_service;
