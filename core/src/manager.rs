// cartsync/src/manager.rs

//! Defines `CartSyncManager`, the single owner of the in-memory cart.
//!
//! Every mutation either ends with the snapshot matching the server's cart
//! (full refresh after success) or with the snapshot restored to what it was
//! before the mutation, and in both failure modes the caller gets an error.

use crate::core::control::MutationKind;
use crate::core::gate::ProductGates;
use crate::core::line::{CartLine, ProductId, ProductRef};
use crate::core::listeners::Subscription;
use crate::core::snapshot::{SharedSnapshot, Snapshot};
use crate::error::{CartError, CartResult};
use crate::mutation::{reconcile, OptimisticMutation};
use crate::store::CartStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct CartSyncManager {
  store: Arc<dyn CartStore>,
  snapshot: SharedSnapshot,
  gates: Arc<ProductGates>,
}

impl CartSyncManager {
  /// Creates a manager with an empty snapshot. Call `load_initial` once the
  /// owning context is up.
  pub fn new(store: Arc<dyn CartStore>) -> Self {
    Self {
      store,
      snapshot: SharedSnapshot::default(),
      gates: Arc::new(ProductGates::default()),
    }
  }

  // --- Reads ---

  pub fn snapshot(&self) -> Snapshot {
    self.snapshot.read().clone()
  }

  pub fn lines(&self) -> Vec<CartLine> {
    self.snapshot.read().lines().to_vec()
  }

  pub fn line(&self, product_id: &ProductId) -> Option<CartLine> {
    self.snapshot.read().find(product_id).cloned()
  }

  pub fn subtotal(&self) -> Decimal {
    self.snapshot.read().subtotal()
  }

  pub fn item_count(&self) -> u64 {
    self.snapshot.read().item_count()
  }

  /// Registers `listener` for every snapshot change until the returned
  /// `Subscription` is dropped. The listener may call this manager's read
  /// methods but never its mutations.
  pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> Subscription {
    self.snapshot.subscribe(Arc::new(listener))
  }

  // --- Loading ---

  /// Fetches the server's cart once at startup. A failure is only logged:
  /// the cart stays empty rather than blocking the caller.
  pub async fn load_initial(&self) {
    if let Err(e) = self.try_load_initial().await {
      warn!(error = %e, "Could not fetch server cart on load.");
    }
  }

  /// `load_initial`, but reporting `InitialLoadFailed`.
  #[instrument(name = "CartSyncManager::load_initial", skip_all, err(Display))]
  pub async fn try_load_initial(&self) -> CartResult<()> {
    let lines = reconcile(&self.snapshot, self.store.as_ref())
      .await
      .map_err(|source| CartError::InitialLoadFailed { source })?;
    info!(lines, "Initial cart loaded.");
    Ok(())
  }

  /// Re-fetches the server's cart and replaces the snapshot with it.
  /// On failure the snapshot is left as it was.
  #[instrument(name = "CartSyncManager::refresh", skip_all, err(Display))]
  pub async fn refresh(&self) -> CartResult<()> {
    let lines = reconcile(&self.snapshot, self.store.as_ref())
      .await
      .map_err(|source| CartError::RemoteRefreshFailed { source })?;
    debug!(lines, "Cart refreshed from server.");
    Ok(())
  }

  // --- Mutations ---

  /// Adds `quantity` of `product`, summing into an existing line.
  ///
  /// Fails with `InvalidArgument`, without any remote call, when the product
  /// has no usable id or `quantity` is zero.
  #[instrument(name = "CartSyncManager::add", skip_all, fields(product_id = ?product.id, quantity = quantity), err(Display))]
  pub async fn add(&self, product: &ProductRef, quantity: u32) -> CartResult<()> {
    let product_id = product
      .resolve_id()
      .ok_or_else(|| CartError::InvalidArgument("product has no id".to_string()))?;
    if quantity == 0 {
      return Err(CartError::InvalidArgument("quantity must be at least 1".to_string()));
    }

    let _permit = self.gates.acquire(&product_id).await;
    let optimistic = match self.line(&product_id) {
      Some(existing) => {
        let total = existing.quantity.checked_add(quantity).ok_or_else(|| {
          CartError::InvalidArgument(format!("quantity overflow for product '{}'", product_id))
        })?;
        existing.with_quantity(total)
      }
      None => CartLine::from_product(product_id.clone(), product, quantity),
    };

    OptimisticMutation::on_line(
      MutationKind::Add,
      product_id.clone(),
      move |s: &mut Snapshot| s.upsert(optimistic),
      self.store.add_item(&product_id, quantity),
    )
    .execute(&self.snapshot, self.store.as_ref())
    .await
  }

  /// Raises the line's quantity by one.
  #[instrument(name = "CartSyncManager::increase_quantity", skip_all, fields(product_id = %line.product_id), err(Display))]
  pub async fn increase_quantity(&self, line: &CartLine) -> CartResult<()> {
    ensure_product_id(line)?;
    let product_id = line.product_id.clone();
    let _permit = self.gates.acquire(&product_id).await;
    let current = self.current_line(line);

    let quantity = current.quantity.checked_add(1).ok_or_else(|| {
      CartError::InvalidArgument(format!("quantity overflow for product '{}'", product_id))
    })?;
    let optimistic = current.with_quantity(quantity);

    OptimisticMutation::on_line(
      MutationKind::Increase,
      product_id.clone(),
      move |s: &mut Snapshot| s.upsert(optimistic),
      self.store.update_quantity(&product_id, quantity),
    )
    .execute(&self.snapshot, self.store.as_ref())
    .await
  }

  /// Lowers the line's quantity by one; at quantity one this removes the line.
  #[instrument(name = "CartSyncManager::decrease_quantity", skip_all, fields(product_id = %line.product_id), err(Display))]
  pub async fn decrease_quantity(&self, line: &CartLine) -> CartResult<()> {
    ensure_product_id(line)?;
    let product_id = line.product_id.clone();
    let _permit = self.gates.acquire(&product_id).await;
    let current = self.current_line(line);

    if current.quantity <= 1 {
      return self.remove_current(current).await;
    }

    let quantity = current.quantity - 1;
    let optimistic = current.with_quantity(quantity);
    OptimisticMutation::on_line(
      MutationKind::Decrease,
      product_id.clone(),
      move |s: &mut Snapshot| s.upsert(optimistic),
      self.store.update_quantity(&product_id, quantity),
    )
    .execute(&self.snapshot, self.store.as_ref())
    .await
  }

  /// Takes the line out of the cart whatever its quantity.
  #[instrument(name = "CartSyncManager::remove", skip_all, fields(product_id = %line.product_id), err(Display))]
  pub async fn remove(&self, line: &CartLine) -> CartResult<()> {
    ensure_product_id(line)?;
    let _permit = self.gates.acquire(&line.product_id).await;
    let current = self.current_line(line);
    self.remove_current(current).await
  }

  /// Removes the line locally only. No remote call; whoever calls this is
  /// responsible for the server side.
  pub fn remove_local_only(&self, product_id: &ProductId) {
    self.snapshot.update(|s| s.remove(product_id));
    debug!(%product_id, "Line removed locally.");
  }

  /// Empties the snapshot locally (e.g. after checkout). No remote call.
  pub fn clear_local(&self) {
    self.snapshot.update(Snapshot::clear);
    debug!("Cart cleared locally.");
  }

  // --- Internals ---

  /// The snapshot's copy of the line when present, so queued mutations build
  /// on the result of the ones before them; otherwise the caller's copy.
  fn current_line(&self, line: &CartLine) -> CartLine {
    self.line(&line.product_id).unwrap_or_else(|| line.clone())
  }

  /// Removal path shared by `decrease_quantity` and `remove`. Lines the
  /// service has already assigned a row id are deleted by that id; others are
  /// set to quantity zero by product id. Caller holds the product's gate.
  async fn remove_current(&self, current: CartLine) -> CartResult<()> {
    let product_id = current.product_id.clone();
    let apply = |s: &mut Snapshot| s.remove(&product_id);

    match &current.cart_line_id {
      Some(line_id) => {
        OptimisticMutation::on_line(
          MutationKind::Remove,
          product_id.clone(),
          apply,
          self.store.remove_by_id(line_id),
        )
        .execute(&self.snapshot, self.store.as_ref())
        .await
      }
      None => {
        OptimisticMutation::on_line(
          MutationKind::Remove,
          product_id.clone(),
          apply,
          self.store.update_quantity(&product_id, 0),
        )
        .execute(&self.snapshot, self.store.as_ref())
        .await
      }
    }
  }
}

fn ensure_product_id(line: &CartLine) -> CartResult<()> {
  if line.product_id.is_blank() {
    return Err(CartError::InvalidArgument("cart line has no product id".to_string()));
  }
  Ok(())
}

impl std::fmt::Debug for CartSyncManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CartSyncManager")
      .field("snapshot", &self.snapshot)
      .field("active_gates", &self.gates.active())
      .finish()
  }
}
