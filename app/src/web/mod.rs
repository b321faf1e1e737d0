// pasar-api/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;

pub use extractors::AuthenticatedUser;
pub use routes::{configure_app_routes, json_config, query_config};
