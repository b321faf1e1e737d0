// pasar-api/src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::payment::PaymentGateway;
use crate::store::{OrderStore, ProductStore, ReviewStore};
use pasar_flow::Flows;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub flows: Arc<Flows<AppError>>,
  pub products: Arc<dyn ProductStore>,
  pub orders: Arc<dyn OrderStore>,
  pub reviews: Arc<dyn ReviewStore>,
  pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
  /// Wires the collaborators together and registers every pipeline.
  pub fn new(
    config: Arc<AppConfig>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    reviews: Arc<dyn ReviewStore>,
    gateway: Arc<dyn PaymentGateway>,
  ) -> Result<Self> {
    let flows = Arc::new(Flows::<AppError>::new());
    pipelines::register_all_pipelines(&flows)?;
    Ok(Self {
      config,
      flows,
      products,
      orders,
      reviews,
      gateway,
    })
  }
}
