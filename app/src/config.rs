// pasar-api/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
  Midtrans,
  Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

/// Retry settings for stock returns and remote cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompensationPolicy {
  pub max_attempts: u32,
  /// Multiplied by the attempt number before each retry.
  pub backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,
  pub seed_db: bool,

  pub jwt_secret: String,

  pub payment_provider: PaymentProvider,
  pub midtrans_server_key: Option<String>,
  pub midtrans_is_production: bool,
  pub payment_window_hours: i64,

  pub compensation: CompensationPolicy,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let get_or = |var_name: &str, default: &str| get_env(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var::<u16>("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;

    let store_backend = match get_or("STORE_BACKEND", "postgres").to_ascii_lowercase().as_str() {
      "postgres" => StoreBackend::Postgres,
      "memory" => StoreBackend::Memory,
      other => return Err(AppError::Config(format!("Invalid STORE_BACKEND: '{}'", other))),
    };
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = parse_var::<bool>("RUN_MIGRATIONS", &get_or("RUN_MIGRATIONS", "false"))?;
    let seed_db = parse_var::<bool>("SEED_DB", &get_or("SEED_DB", "false"))?;

    let jwt_secret = get_env("JWT_SECRET")?;

    let payment_provider = match get_or("PAYMENT_PROVIDER", "midtrans").to_ascii_lowercase().as_str() {
      "midtrans" => PaymentProvider::Midtrans,
      "mock" => PaymentProvider::Mock,
      other => return Err(AppError::Config(format!("Invalid PAYMENT_PROVIDER: '{}'", other))),
    };
    let midtrans_server_key = match payment_provider {
      PaymentProvider::Midtrans => Some(get_env("MIDTRANS_SERVER_KEY")?),
      PaymentProvider::Mock => get_env("MIDTRANS_SERVER_KEY").ok(),
    };
    let midtrans_is_production =
      parse_var::<bool>("MIDTRANS_IS_PRODUCTION", &get_or("MIDTRANS_IS_PRODUCTION", "false"))?;

    let payment_window_hours = parse_var::<i64>("PAYMENT_WINDOW_HOURS", &get_or("PAYMENT_WINDOW_HOURS", "24"))?;
    if payment_window_hours <= 0 {
      return Err(AppError::Config("PAYMENT_WINDOW_HOURS must be positive".to_string()));
    }

    let max_attempts = parse_var::<u32>(
      "COMPENSATION_MAX_ATTEMPTS",
      &get_or("COMPENSATION_MAX_ATTEMPTS", "3"),
    )?;
    if max_attempts == 0 {
      return Err(AppError::Config("COMPENSATION_MAX_ATTEMPTS must be at least 1".to_string()));
    }
    let backoff_ms = parse_var::<u64>("COMPENSATION_BACKOFF_MS", &get_or("COMPENSATION_BACKOFF_MS", "200"))?;

    let log_format = match get_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      _ => LogFormat::Pretty,
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      run_migrations,
      seed_db,
      jwt_secret,
      payment_provider,
      midtrans_server_key,
      midtrans_is_production,
      payment_window_hours,
      compensation: CompensationPolicy {
        max_attempts,
        backoff: Duration::from_millis(backoff_ms),
      },
      log_format,
    })
  }
}

fn parse_var<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e)))
}
