// cartsync/src/core/gate.rs

//! Per-product serialization of cart mutations.
//!
//! A mutation holds its product's gate from the moment it reads the current
//! line until reconciliation finishes, so overlapping calls on the same
//! product queue in arrival order. Different products never wait on each other.

use crate::core::line::ProductId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{event, Level};

#[derive(Default)]
pub struct ProductGates {
  gates: Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>,
}

impl ProductGates {
  /// Waits for exclusive use of `product_id`.
  ///
  /// Dropping the returned future while it waits leaves no trace behind.
  pub async fn acquire(self: &Arc<Self>, product_id: &ProductId) -> GatePermit {
    let gate = {
      let mut gates = self.gates.lock();
      gates.entry(product_id.clone()).or_default().clone()
    };
    if gate.try_lock().is_err() {
      event!(Level::DEBUG, %product_id, "Mutation queued behind an in-flight one for the same product.");
    }
    // Dropped after the pending lock below, which owns the gate handle.
    let _pending = PendingGate {
      gates: self,
      product_id,
    };
    let guard = gate.lock_owned().await;
    GatePermit {
      product_id: product_id.clone(),
      gates: Arc::clone(self),
      guard: Some(guard),
    }
  }

  /// Number of products with a live gate.
  pub fn active(&self) -> usize {
    self.gates.lock().len()
  }

  /// Drops the map entry once nothing but the map refers to the gate.
  /// Handles are only cloned under the map lock, so the count is stable here.
  fn release_if_idle(&self, product_id: &ProductId) {
    let mut gates = self.gates.lock();
    let idle = gates
      .get(product_id)
      .map_or(false, |gate| Arc::strong_count(gate) == 1);
    if idle {
      gates.remove(product_id);
    }
  }
}

/// Cleans up after a wait that ends, normally or by cancellation.
struct PendingGate<'a> {
  gates: &'a ProductGates,
  product_id: &'a ProductId,
}

impl Drop for PendingGate<'_> {
  fn drop(&mut self) {
    self.gates.release_if_idle(self.product_id);
  }
}

/// Exclusive hold on one product's gate; released on drop.
pub struct GatePermit {
  product_id: ProductId,
  gates: Arc<ProductGates>,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GatePermit {
  fn drop(&mut self) {
    drop(self.guard.take());
    self.gates.release_if_idle(&self.product_id);
  }
}
