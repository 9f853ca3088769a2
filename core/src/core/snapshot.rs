// cartsync/src/core/snapshot.rs

//! The in-memory view of the cart and its shared, lock-guarded handle.

use crate::core::line::{CartLine, ProductId};
use crate::core::listeners::{Listener, Listeners, Subscription};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Ordered cart lines, at most one per product id.
///
/// `revision` increases on every change so listeners can tell snapshots apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
  lines: Vec<CartLine>,
  revision: u64,
}

/// What a local line change replaced, so it can be put back.
#[derive(Debug, Clone, PartialEq)]
pub struct LineUndo {
  product_id: ProductId,
  previous: Option<(usize, CartLine)>,
}

impl LineUndo {
  pub fn product_id(&self) -> &ProductId {
    &self.product_id
  }

  /// The line as it was before the change, if the product was in the cart.
  pub fn previous(&self) -> Option<&CartLine> {
    self.previous.as_ref().map(|(_, line)| line)
  }
}

impl Snapshot {
  /// Builds a snapshot from already-mapped lines, keeping the first line per
  /// product id and dropping lines with a zero quantity.
  pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
    let mut seen = HashSet::new();
    let lines = lines
      .into_iter()
      .filter(|line| {
        if line.quantity == 0 {
          warn!(product_id = %line.product_id, "Dropping zero-quantity line.");
          return false;
        }
        if !seen.insert(line.product_id.clone()) {
          warn!(product_id = %line.product_id, "Dropping duplicate line for product.");
          return false;
        }
        true
      })
      .collect();
    Self { lines, revision: 0 }
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn find(&self, product_id: &ProductId) -> Option<&CartLine> {
    self.lines.iter().find(|l| &l.product_id == product_id)
  }

  fn position(&self, product_id: &ProductId) -> Option<usize> {
    self.lines.iter().position(|l| &l.product_id == product_id)
  }

  /// Sum of quantities across lines.
  pub fn item_count(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }

  /// Sum of line totals; lines without a price count as zero.
  pub fn subtotal(&self) -> Decimal {
    self.lines.iter().map(CartLine::line_total).sum()
  }

  /// Replaces the line for `line.product_id` in place, or appends it.
  ///
  /// A zero quantity removes the line instead of storing it.
  pub fn upsert(&mut self, line: CartLine) -> LineUndo {
    if line.quantity == 0 {
      return self.remove(&line.product_id);
    }
    let product_id = line.product_id.clone();
    let previous = match self.position(&product_id) {
      Some(idx) => Some((idx, std::mem::replace(&mut self.lines[idx], line))),
      None => {
        self.lines.push(line);
        None
      }
    };
    self.revision += 1;
    LineUndo { product_id, previous }
  }

  /// Removes the line for `product_id`, if present.
  pub fn remove(&mut self, product_id: &ProductId) -> LineUndo {
    let previous = self.position(product_id).map(|idx| (idx, self.lines.remove(idx)));
    if previous.is_some() {
      self.revision += 1;
    }
    LineUndo {
      product_id: product_id.clone(),
      previous,
    }
  }

  /// Puts back whatever `undo` recorded: the previous line at its previous
  /// position, or no line at all for the product.
  pub fn restore(&mut self, undo: LineUndo) {
    let current = self.position(&undo.product_id);
    match (undo.previous, current) {
      (Some((_, line)), Some(idx)) => self.lines[idx] = line,
      (Some((idx, line)), None) => {
        let idx = idx.min(self.lines.len());
        self.lines.insert(idx, line);
      }
      (None, Some(idx)) => {
        self.lines.remove(idx);
      }
      (None, None) => return,
    }
    self.revision += 1;
  }

  /// Replaces every line; the revision keeps counting.
  pub fn replace(&mut self, other: Snapshot) {
    self.lines = other.lines;
    self.revision += 1;
  }

  pub fn clear(&mut self) {
    if !self.lines.is_empty() {
      self.lines.clear();
      self.revision += 1;
    }
  }
}

/// Shared handle to a `Snapshot` plus the listeners watching it.
///
/// Guards returned by `read` are blocking and MUST be dropped before any
/// `.await` point. Reads are recursive, so a listener may read the snapshot
/// through this handle (or the manager) while a writer is queued.
#[derive(Clone, Default)]
pub struct SharedSnapshot {
  state: Arc<RwLock<Snapshot>>,
  listeners: Arc<Listeners>,
}

impl SharedSnapshot {
  pub fn new(snapshot: Snapshot) -> Self {
    Self {
      state: Arc::new(RwLock::new(snapshot)),
      listeners: Arc::new(Listeners::default()),
    }
  }

  pub fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
    self.state.read_recursive()
  }

  /// Applies `f` under the write lock and, if the revision moved, notifies
  /// listeners with the new snapshot before any other writer can run.
  pub fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
    let mut guard = self.state.write();
    let before = guard.revision;
    let out = f(&mut *guard);
    if guard.revision != before {
      let guard = RwLockWriteGuard::downgrade(guard);
      self.listeners.notify(&*guard);
    }
    out
  }

  pub fn subscribe(&self, listener: Listener) -> Subscription {
    Listeners::subscribe(&self.listeners, listener)
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.len()
  }
}

impl std::fmt::Debug for SharedSnapshot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SharedSnapshot")
      .field("snapshot", &*self.state.read_recursive())
      .field("listeners", &self.listeners.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(id: &str, qty: u32) -> CartLine {
    CartLine::new(id, qty)
  }

  #[test]
  fn upsert_replaces_in_place_and_appends_new() {
    let mut s = Snapshot::from_lines([line("a", 1), line("b", 1)]);
    s.upsert(line("a", 5));
    s.upsert(line("c", 2));
    let ids: Vec<_> = s.lines().iter().map(|l| l.product_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(s.find(&ProductId::new("a")).unwrap().quantity, 5);
  }

  #[test]
  fn restore_undoes_upsert_and_remove_exactly() {
    let original = Snapshot::from_lines([line("a", 1), line("b", 2), line("c", 3)]);

    let mut s = original.clone();
    let undo = s.remove(&ProductId::new("b"));
    s.restore(undo);
    assert_eq!(s.lines(), original.lines());

    let undo = s.upsert(line("b", 9));
    s.restore(undo);
    assert_eq!(s.lines(), original.lines());

    let undo = s.upsert(line("z", 1));
    s.restore(undo);
    assert_eq!(s.lines(), original.lines());
  }

  #[test]
  fn zero_quantity_upsert_removes() {
    let mut s = Snapshot::from_lines([line("a", 1)]);
    let undo = s.upsert(line("a", 0));
    assert!(s.is_empty());
    assert_eq!(undo.previous().unwrap().quantity, 1);
  }

  #[test]
  fn from_lines_keeps_first_duplicate_and_drops_zero() {
    let s = Snapshot::from_lines([line("a", 1), line("a", 4), line("b", 0)]);
    assert_eq!(s.len(), 1);
    assert_eq!(s.lines()[0].quantity, 1);
  }

  #[test]
  fn revision_only_moves_on_change() {
    let mut s = Snapshot::default();
    s.remove(&ProductId::new("missing"));
    s.clear();
    assert_eq!(s.revision(), 0);
    s.upsert(line("a", 1));
    assert_eq!(s.revision(), 1);
  }
}
