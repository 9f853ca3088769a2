// tests/concurrency_tests.rs
mod common;

use cartsync::{CartLine, StoreOp};
use common::*;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

const LATENCY: Duration = Duration::from_millis(20);

#[tokio::test]
#[serial]
async fn test_concurrent_increases_from_stale_line_both_count() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 1);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));

  // Both callers hold the same copy showing quantity 1.
  let stale = line_of(&manager, "sku-1");
  let (first, second) = tokio::join!(manager.increase_quantity(&stale), manager.increase_quantity(&stale));
  first.unwrap();
  second.unwrap();

  assert_eq!(line_of(&manager, "sku-1").quantity, 3);
  assert_eq!(store.quantity_of(&pid("sku-1")), Some(3));
}

#[tokio::test]
#[serial]
async fn test_queued_decrease_builds_on_preceding_increase() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 1);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));

  let stale = line_of(&manager, "sku-1");
  let (up, down) = tokio::join!(manager.increase_quantity(&stale), manager.decrease_quantity(&stale));
  up.unwrap();
  down.unwrap();

  // The decrease saw quantity 2 and so did not remove the line.
  assert_eq!(line_of(&manager, "sku-1").quantity, 1);
  assert_eq!(store.quantity_of(&pid("sku-1")), Some(1));
}

#[tokio::test]
#[serial]
async fn test_queued_mutation_builds_on_rolled_back_state() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 1);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));
  store.fail_next(StoreOp::UpdateQuantity, 500);

  let stale = line_of(&manager, "sku-1");
  let (failed, succeeded) = tokio::join!(manager.increase_quantity(&stale), manager.increase_quantity(&stale));
  assert!(failed.is_err());
  succeeded.unwrap();

  assert_eq!(line_of(&manager, "sku-1").quantity, 2);
  assert_eq!(store.quantity_of(&pid("sku-1")), Some(2));
}

#[tokio::test]
#[serial]
async fn test_different_products_do_not_wait_for_each_other() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 1);
  store.seed_row("sku-2", 1);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));

  let one = line_of(&manager, "sku-1");
  let two = line_of(&manager, "sku-2");
  let (a, b) = tokio::join!(manager.increase_quantity(&one), manager.increase_quantity(&two));
  a.unwrap();
  b.unwrap();

  // Both remote updates went out before either reconciliation fetch.
  let ops: Vec<StoreOp> = store.calls().iter().map(|c| c.op()).collect();
  assert_eq!(
    ops,
    vec![
      StoreOp::UpdateQuantity,
      StoreOp::UpdateQuantity,
      StoreOp::FetchCart,
      StoreOp::FetchCart
    ]
  );
  assert_eq!(
    quantities(&manager.snapshot()),
    vec![("sku-1".to_string(), 2), ("sku-2".to_string(), 2)]
  );
}

#[tokio::test]
#[serial]
async fn test_same_product_mutations_are_serialized() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 2);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));

  let stale = line_of(&manager, "sku-1");
  let (a, b) = tokio::join!(manager.increase_quantity(&stale), manager.increase_quantity(&stale));
  a.unwrap();
  b.unwrap();

  // Each mutation finished its reconciliation before the next one started.
  let ops: Vec<StoreOp> = store.calls().iter().map(|c| c.op()).collect();
  assert_eq!(
    ops,
    vec![
      StoreOp::UpdateQuantity,
      StoreOp::FetchCart,
      StoreOp::UpdateQuantity,
      StoreOp::FetchCart
    ]
  );
}

#[tokio::test]
#[serial]
async fn test_gates_are_released_after_mutations() {
  setup_tracing();
  let store = Arc::new(millet_catalog());
  store.seed_row("sku-1", 1);
  let manager = loaded_manager(&store).await;
  store.set_latency(Some(LATENCY));

  let stale = line_of(&manager, "sku-1");
  let other = CartLine::new("sku-2", 1);
  let _ = tokio::join!(
    manager.increase_quantity(&stale),
    manager.increase_quantity(&stale),
    manager.decrease_quantity(&other)
  );

  let debug = format!("{:?}", manager);
  assert!(debug.contains("active_gates: 0"), "{}", debug);
  assert_invariants(&manager.snapshot());
}
