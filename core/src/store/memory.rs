// cartsync/src/store/memory.rs

//! A `CartStore` that keeps the cart in process memory with the cart
//! service's semantics, plus a call log, scripted failures and optional latency.

use crate::core::line::{CartLineId, ProductId, ServerCartRow};
use crate::error::StoreError;
use crate::store::CartStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;
use tracing::{event, Level};

/// The four store operations, for scripting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
  FetchCart,
  AddItem,
  UpdateQuantity,
  RemoveById,
}

impl StoreOp {
  pub fn as_str(&self) -> &'static str {
    match self {
      StoreOp::FetchCart => "fetch_cart",
      StoreOp::AddItem => "add_item",
      StoreOp::UpdateQuantity => "update_quantity",
      StoreOp::RemoveById => "remove_by_id",
    }
  }
}

impl fmt::Display for StoreOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One recorded call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
  FetchCart,
  AddItem { product_id: ProductId, quantity: u32 },
  UpdateQuantity { product_id: ProductId, quantity: u32 },
  RemoveById { line_id: CartLineId },
}

impl StoreCall {
  pub fn op(&self) -> StoreOp {
    match self {
      StoreCall::FetchCart => StoreOp::FetchCart,
      StoreCall::AddItem { .. } => StoreOp::AddItem,
      StoreCall::UpdateQuantity { .. } => StoreOp::UpdateQuantity,
      StoreCall::RemoveById { .. } => StoreOp::RemoveById,
    }
  }
}

/// Catalog data the store copies into new rows.
#[derive(Debug, Clone, Default)]
pub struct CatalogEntry {
  pub name: Option<String>,
  pub image_url: Option<String>,
  pub price: Option<Decimal>,
}

#[derive(Default)]
struct State {
  rows: Vec<ServerCartRow>,
  next_row_id: u64,
  catalog: HashMap<ProductId, CatalogEntry>,
  calls: Vec<StoreCall>,
  scripted_failures: VecDeque<(StoreOp, u16, String)>,
}

#[derive(Default)]
pub struct InMemoryCartStore {
  state: Mutex<State>,
  latency: Mutex<Option<Duration>>,
}

impl InMemoryCartStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers catalog data for a product.
  pub fn with_product(self, product_id: impl Into<ProductId>, entry: CatalogEntry) -> Self {
    self.state.lock().catalog.insert(product_id.into(), entry);
    self
  }

  /// Seeds a row as if it had been added earlier. Returns the row id.
  pub fn seed_row(&self, product_id: impl Into<ProductId>, quantity: u32) -> CartLineId {
    let mut state = self.state.lock();
    let product_id = product_id.into();
    let row = state.new_row(product_id, quantity);
    let id = row.id.clone().unwrap_or_else(|| CartLineId::new(""));
    state.rows.push(row);
    id
  }

  /// Makes every call sleep first, to widen race windows in tests.
  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock() = latency;
  }

  /// The next call of `op` fails with `status`; scripts queue in order.
  pub fn fail_next(&self, op: StoreOp, status: u16) {
    self
      .state
      .lock()
      .scripted_failures
      .push_back((op, status, format!("scripted {} failure", op)));
  }

  pub fn rows(&self) -> Vec<ServerCartRow> {
    self.state.lock().rows.clone()
  }

  pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
    self
      .state
      .lock()
      .rows
      .iter()
      .find(|r| r.product_id.as_ref() == Some(product_id))
      .and_then(|r| r.quantity)
      .and_then(|q| u32::try_from(q).ok())
  }

  pub fn calls(&self) -> Vec<StoreCall> {
    self.state.lock().calls.clone()
  }

  /// Calls other than `FetchCart`.
  pub fn mutating_calls(&self) -> Vec<StoreCall> {
    self
      .calls()
      .into_iter()
      .filter(|c| c.op() != StoreOp::FetchCart)
      .collect()
  }

  pub fn clear_calls(&self) {
    self.state.lock().calls.clear();
  }

  async fn enter(&self, call: StoreCall) -> Result<(), StoreError> {
    let latency = *self.latency.lock();
    if let Some(delay) = latency {
      tokio::time::sleep(delay).await;
    }
    let mut state = self.state.lock();
    let op = call.op();
    state.calls.push(call);
    let scripted = state.scripted_failures.iter().position(|(failing, _, _)| *failing == op);
    if let Some((_, status, body)) = scripted.and_then(|idx| state.scripted_failures.remove(idx)) {
      event!(Level::DEBUG, %op, status, "Scripted store failure.");
      return Err(StoreError::Rejected {
        operation: op.as_str(),
        status,
        body,
      });
    }
    Ok(())
  }
}

impl State {
  fn new_row(&mut self, product_id: ProductId, quantity: u32) -> ServerCartRow {
    self.next_row_id += 1;
    let entry = self.catalog.get(&product_id).cloned().unwrap_or_default();
    ServerCartRow {
      id: Some(CartLineId::new(self.next_row_id.to_string())),
      product_id: Some(product_id),
      product_name: entry.name,
      has_image: Some(entry.image_url.is_some()),
      image_url: entry.image_url,
      quantity: Some(i64::from(quantity)),
      price: entry.price,
    }
  }

  fn row_mut(&mut self, product_id: &ProductId) -> Option<&mut ServerCartRow> {
    self.rows.iter_mut().find(|r| r.product_id.as_ref() == Some(product_id))
  }
}

fn bad_request(operation: &'static str, body: &str) -> StoreError {
  StoreError::Rejected {
    operation,
    status: 400,
    body: body.to_string(),
  }
}

fn not_found(operation: &'static str, what: impl fmt::Display) -> StoreError {
  StoreError::Rejected {
    operation,
    status: 404,
    body: format!("cart item not found: {}", what),
  }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
  async fn fetch_cart(&self) -> Result<Vec<ServerCartRow>, StoreError> {
    self.enter(StoreCall::FetchCart).await?;
    Ok(self.rows())
  }

  async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
    self
      .enter(StoreCall::AddItem {
        product_id: product_id.clone(),
        quantity,
      })
      .await?;
    if quantity == 0 {
      return Err(bad_request("add_item", "Quantity must be greater than zero"));
    }
    let mut state = self.state.lock();
    match state.row_mut(product_id) {
      Some(row) => row.quantity = Some(row.quantity.unwrap_or(0) + i64::from(quantity)),
      None => {
        let row = state.new_row(product_id.clone(), quantity);
        state.rows.push(row);
      }
    }
    Ok(())
  }

  async fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
    self
      .enter(StoreCall::UpdateQuantity {
        product_id: product_id.clone(),
        quantity,
      })
      .await?;
    let mut state = self.state.lock();
    if quantity == 0 {
      let before = state.rows.len();
      state.rows.retain(|r| r.product_id.as_ref() != Some(product_id));
      if state.rows.len() == before {
        return Err(not_found("update_quantity", product_id));
      }
      return Ok(());
    }
    match state.row_mut(product_id) {
      Some(row) => {
        row.quantity = Some(i64::from(quantity));
        Ok(())
      }
      None => Err(not_found("update_quantity", product_id)),
    }
  }

  async fn remove_by_id(&self, line_id: &CartLineId) -> Result<(), StoreError> {
    self
      .enter(StoreCall::RemoveById {
        line_id: line_id.clone(),
      })
      .await?;
    let mut state = self.state.lock();
    let before = state.rows.len();
    state.rows.retain(|r| r.id.as_ref() != Some(line_id));
    if state.rows.len() == before {
      return Err(not_found("remove_by_id", line_id));
    }
    Ok(())
  }
}
