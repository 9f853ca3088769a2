// cartsync/examples/rollback.rs

use cartsync::{CartError, CartSyncManager, InMemoryCartStore, ProductId, StoreOp};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), CartError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Rollback Example ---");

  let store = Arc::new(InMemoryCartStore::new());
  store.seed_row("sku-1", 1);

  let manager = CartSyncManager::new(store.clone());
  manager.try_load_initial().await?;
  let _subscription = manager.subscribe(|snapshot| {
    let quantity = snapshot.lines().first().map(|l| l.quantity);
    info!(revision = snapshot.revision(), ?quantity, "Listener saw a change.");
  });

  // The service rejects the next row deletion.
  store.fail_next(StoreOp::RemoveById, 500);

  let sku_1 = ProductId::new("sku-1");
  let Some(line) = manager.line(&sku_1) else {
    return Ok(());
  };
  match manager.decrease_quantity(&line).await {
    Ok(()) => info!("Removal went through."),
    Err(e) => {
      // The line disappeared optimistically and was put back.
      warn!(error = %e, "Removal failed.");
      if let Some(source) = e.store_error() {
        warn!(status = ?source.status(), "Cart service answer.");
      }
    }
  }

  info!(lines = manager.lines().len(), "Cart after the failed removal.");
  manager.refresh().await?;
  Ok(())
}
