// pasar-api/src/pipelines/create_order_pipeline.rs

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::{NewOrder, ProductLookup};
use crate::pipelines::common_steps::{expect_set, positive_integer_field};
use crate::pipelines::compensation::{self, Compensation};
use crate::pipelines::contexts::{CreateOrderCtxData, OrderQuote};
use crate::store::INSUFFICIENT_STOCK;
use chrono::{Duration, Utc};
use pasar_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, StepKind};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub fn register_create_order_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut p = Pipeline::<CreateOrderCtxData, AppError>::new(&[
    ("validate_order_input", StepKind::Required, None),
    ("fetch_active_product", StepKind::Required, None),
    ("check_stock", StepKind::Required, None),
    ("price_order", StepKind::Required, None),
    ("open_payment_session", StepKind::Required, None),
    ("persist_order_and_reserve_stock", StepKind::Required, None),
  ]);

  p.on_root("validate_order_input", validate_order_input)?;
  p.on_root("fetch_active_product", fetch_active_product)?;
  p.on_root("check_stock", check_stock)?;
  p.on_root("price_order", price_order)?;
  p.on_root("open_payment_session", open_payment_session)?;
  p.on_root("persist_order_and_reserve_stock", persist_order_and_reserve_stock)?;

  flows.register_pipeline(p);
  info!("Create-order pipeline registered.");
  Ok(())
}

async fn validate_order_input(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let input = ctx_data.read().input.clone();

  let mut errors = FieldErrors::new();
  let product_id = positive_integer_field(&mut errors, "productId", input.product_id.as_ref());
  let quantity = positive_integer_field(&mut errors, "quantity", input.quantity.as_ref());
  let quantity = match quantity.map(i32::try_from) {
    Some(Ok(q)) => Some(q),
    Some(Err(_)) => {
      errors.insert(
        "quantity".to_string(),
        vec![format!("The quantity field must not be greater than {}", i32::MAX)],
      );
      None
    }
    None => None,
  };
  if !errors.is_empty() {
    return Err(AppError::Validation(errors));
  }

  let mut guard = ctx_data.write();
  guard.product_id = product_id;
  guard.quantity = quantity;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create_order::fetch_active_product", skip_all, err(Display))]
async fn fetch_active_product(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let (state, product_id) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.product_id)
  };
  let product_id = expect_set(product_id, "product_id")?;

  match state.products.find_active_by_id(product_id).await? {
    ProductLookup::Active(product) => {
      ctx_data.write().product = Some(product);
      Ok(PipelineControl::Continue)
    }
    ProductLookup::SoftDeleted => {
      info!(product_id, "Product is soft-deleted; refusing new orders.");
      Err(AppError::not_found("Product"))
    }
    ProductLookup::Missing => Err(AppError::not_found("Product")),
  }
}

async fn check_stock(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let guard = ctx_data.read();
  let product = expect_set(guard.product.as_ref(), "product")?;
  let quantity = expect_set(guard.quantity, "quantity")?;
  if product.stock < quantity {
    info!(product_id = product.id, stock = product.stock, quantity, "Not enough stock for the order.");
    return Err(AppError::domain(INSUFFICIENT_STOCK));
  }
  Ok(PipelineControl::Continue)
}

async fn price_order(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let price = expect_set(guard.product.as_ref(), "product")?.price;
  let quantity = expect_set(guard.quantity, "quantity")?;
  let window_hours = guard.app_state.config.payment_window_hours;

  let total_amount = price
    .checked_mul(i64::from(quantity))
    .ok_or_else(|| AppError::domain("Order total is out of range"))?;
  let quote = OrderQuote {
    reference: format!("ORDER-{}", Uuid::new_v4().simple()),
    total_amount,
    payment_due: Utc::now() + Duration::hours(window_hours),
  };
  info!(reference = %quote.reference, total_amount, "Order priced.");
  guard.quote = Some(quote);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create_order::open_payment_session", skip_all, err(Display))]
async fn open_payment_session(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let (state, quote) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.quote.clone())
  };
  let quote = expect_set(quote, "quote")?;

  let session = state
    .gateway
    .create_session(&quote.reference, quote.total_amount, state.config.payment_window_hours)
    .await
    .map_err(|e| {
      warn!(reference = %quote.reference, error = %e, "Payment session could not be opened; nothing persisted.");
      e
    })?;
  ctx_data.write().session = Some(session);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create_order::persist_order_and_reserve_stock", skip_all, err(Display))]
async fn persist_order_and_reserve_stock(ctx_data: ContextData<CreateOrderCtxData>) -> AppResult<PipelineControl> {
  let (state, new_order) = {
    let guard = ctx_data.read();
    let product = expect_set(guard.product.as_ref(), "product")?;
    let quote = expect_set(guard.quote.as_ref(), "quote")?;
    let session = expect_set(guard.session.as_ref(), "session")?;
    let new_order = NewOrder {
      order_reference: quote.reference.clone(),
      user_id: guard.user_id,
      product_id: product.id,
      quantity: expect_set(guard.quantity, "quantity")?,
      total_amount: quote.total_amount,
      product_name: product.name.clone(),
      product_price: product.price,
      product_image: product.image.clone(),
      payment_token: session.token.clone(),
      redirect_url: session.redirect_url.clone(),
      payment_due: quote.payment_due,
    };
    (guard.app_state.clone(), new_order)
  };
  let reference = new_order.order_reference.clone();

  match state.orders.create_reserving_stock(new_order).await {
    Ok(order) => {
      info!(order_id = order.id, %reference, "Order created in PENDING.");
      ctx_data.write().order = Some(order);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(%reference, error = %e, "Order not persisted; cancelling the payment session.");
      let cleanup = vec![Compensation::CancelRemoteSession {
        reference: reference.clone(),
      }];
      if let Err(cleanup_err) = compensation::run_compensations(&state, cleanup).await {
        warn!(%reference, error = %cleanup_err, "Orphaned payment session left open.");
      }
      Err(e)
    }
  }
}
