// pasar-api/src/lib.rs

//! Pasar order service: order creation with stock reservation, buyer
//! cancellation, payment notification reconciliation, transaction history
//! with lazy expiry, and reviews of paid orders.

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
