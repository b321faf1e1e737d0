// pasar-api/src/main.rs

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use pasar_api::config::{AppConfig, LogFormat, PaymentProvider, StoreBackend};
use pasar_api::services::auth_service::issue_token;
use pasar_api::services::payment::{MidtransGateway, MockPaymentGateway, PaymentGateway};
use pasar_api::state::AppState;
use pasar_api::store::{MemoryStore, OrderStore, PgStore, ProductStore, ReviewStore};
use pasar_api::web::{configure_app_routes, json_config, query_config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

type Stores = (Arc<dyn ProductStore>, Arc<dyn OrderStore>, Arc<dyn ReviewStore>);

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn split_store<S>(store: Arc<S>) -> Stores
where
  S: ProductStore + OrderStore + ReviewStore + 'static,
{
  let products: Arc<dyn ProductStore> = store.clone();
  let orders: Arc<dyn OrderStore> = store.clone();
  let reviews: Arc<dyn ReviewStore> = store;
  (products, orders, reviews)
}

async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres store")?;
      let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to the database")?;
      tracing::info!("Successfully connected to the database.");

      let store = Arc::new(PgStore::new(pool));
      if config.run_migrations {
        store.run_migrations().await?;
      }
      if config.seed_db {
        store.seed_demo_data().await?;
      }
      Ok(split_store(store))
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      let store = Arc::new(MemoryStore::new());
      if config.seed_db {
        let buyer = store.seed_demo_data();
        let token = issue_token(&config.jwt_secret, buyer.id, chrono::Duration::hours(24))?;
        tracing::info!(buyer_id = buyer.id, %token, "Demo buyer token issued.");
      }
      Ok(split_store(store))
    }
  }
}

fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
  let gateway: Arc<dyn PaymentGateway> = match config.payment_provider {
    PaymentProvider::Midtrans => {
      let server_key = config
        .midtrans_server_key
        .as_deref()
        .context("MIDTRANS_SERVER_KEY is required for the midtrans provider")?;
      Arc::new(MidtransGateway::new(server_key, config.midtrans_is_production)?)
    }
    PaymentProvider::Mock => {
      tracing::warn!("Using the mock payment gateway.");
      Arc::new(MockPaymentGateway::new())
    }
  };
  Ok(gateway)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);
  init_tracing(app_config.log_format);
  tracing::info!("Starting Pasar order service...");

  let (products, orders, reviews) = build_stores(&app_config).await?;
  let gateway = build_gateway(&app_config)?;
  let app_state = AppState::new(app_config.clone(), products, orders, reviews, gateway)?;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .app_data(json_config())
      .app_data(query_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
