// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use cartsync::store::memory::CatalogEntry;
use cartsync::{CartLine, CartSyncManager, Decimal, InMemoryCartStore, ProductId, Snapshot, Subscription};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Store / manager builders ---

pub fn millet_catalog() -> InMemoryCartStore {
  InMemoryCartStore::new()
    .with_product(
      "sku-1",
      CatalogEntry {
        name: Some("Foxtail millet".to_string()),
        image_url: Some("/img/sku-1.png".to_string()),
        price: Some(Decimal::from(100)),
      },
    )
    .with_product(
      "sku-2",
      CatalogEntry {
        name: Some("Ragi flour".to_string()),
        image_url: None,
        price: Some(Decimal::new(4950, 2)),
      },
    )
}

/// A manager over `store`, with the store's current rows already loaded and
/// the call log cleared.
pub async fn loaded_manager(store: &Arc<InMemoryCartStore>) -> CartSyncManager {
  let manager = CartSyncManager::new(store.clone());
  manager.try_load_initial().await.expect("initial load");
  store.clear_calls();
  manager
}

pub fn pid(id: &str) -> ProductId {
  ProductId::new(id)
}

pub fn line_of(manager: &CartSyncManager, id: &str) -> CartLine {
  manager
    .line(&pid(id))
    .unwrap_or_else(|| panic!("expected a line for {}", id))
}

/// (product id, quantity) pairs in snapshot order.
pub fn quantities(snapshot: &Snapshot) -> Vec<(String, u32)> {
  snapshot
    .lines()
    .iter()
    .map(|l| (l.product_id.to_string(), l.quantity))
    .collect()
}

/// Every snapshot a listener was handed, in order.
pub struct Recorder {
  pub seen: Arc<Mutex<Vec<Snapshot>>>,
  pub subscription: Subscription,
}

pub fn record(manager: &CartSyncManager) -> Recorder {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  let subscription = manager.subscribe(move |snapshot| sink.lock().push(snapshot.clone()));
  Recorder { seen, subscription }
}

impl Recorder {
  pub fn snapshots(&self) -> Vec<Snapshot> {
    self.seen.lock().clone()
  }

  pub fn quantities_seen(&self) -> Vec<Vec<(String, u32)>> {
    self.seen.lock().iter().map(quantities).collect()
  }
}

/// Asserts the snapshot invariants: unique product ids, positive quantities.
pub fn assert_invariants(snapshot: &Snapshot) {
  let mut ids: Vec<_> = snapshot.lines().iter().map(|l| l.product_id.clone()).collect();
  let total = ids.len();
  ids.sort();
  ids.dedup();
  assert_eq!(ids.len(), total, "duplicate product ids in {:?}", snapshot);
  assert!(
    snapshot.lines().iter().all(|l| l.quantity >= 1),
    "non-positive quantity in {:?}",
    snapshot
  );
}
