// cartsync/examples/basic_cart.rs

use cartsync::store::memory::CatalogEntry;
use cartsync::{CartResult, CartSyncManager, Decimal, InMemoryCartStore, ProductId, ProductRef, Snapshot};
use std::sync::Arc;
use tracing::info;

fn render(snapshot: &Snapshot) {
  info!(
    revision = snapshot.revision(),
    items = snapshot.item_count(),
    subtotal = %snapshot.subtotal(),
    "Cart changed."
  );
}

#[tokio::main]
async fn main() -> CartResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Cart Example ---");

  // 1. A store standing in for the cart service, with one product in its catalog.
  let store = InMemoryCartStore::new().with_product(
    "sku-1",
    CatalogEntry {
      name: Some("Foxtail millet".to_string()),
      image_url: None,
      price: Some(Decimal::from(100)),
    },
  );

  // 2. The manager, and a listener playing the part of the UI.
  let manager = CartSyncManager::new(Arc::new(store));
  let _subscription = manager.subscribe(render);
  manager.load_initial().await;

  // 3. Mutations show up locally at once, then get replaced by the server's cart.
  manager.add(&ProductRef::new("sku-1"), 2).await?;

  let sku_1 = ProductId::new("sku-1");
  if let Some(line) = manager.line(&sku_1) {
    manager.increase_quantity(&line).await?;
  }
  if let Some(line) = manager.line(&sku_1) {
    manager.decrease_quantity(&line).await?;
  }

  for line in manager.lines() {
    info!(
      product_id = %line.product_id,
      name = ?line.name,
      quantity = line.quantity,
      total = %line.line_total(),
      "Line"
    );
  }
  info!(subtotal = %manager.subtotal(), "Final cart.");
  Ok(())
}
