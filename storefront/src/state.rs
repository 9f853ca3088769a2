// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use cartsync::store::memory::CatalogEntry;
use cartsync::{CartSyncManager, CredentialProvider, Decimal, HttpCartStore, InMemoryCartStore, StaticCredential};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub manager: Arc<CartSyncManager>,
}

impl AppState {
  /// State backed by the cart service at `config.cart_api_base_url`.
  pub fn connect(config: &AppConfig) -> Result<Self> {
    let credentials: Arc<dyn CredentialProvider> = match &config.cart_api_token {
      Some(token) => Arc::new(StaticCredential::new(token.clone())),
      None => Arc::new(StaticCredential::anonymous()),
    };
    let store = HttpCartStore::new(config.http_store(), credentials)?;
    tracing::info!(base_url = %store.base_url(), "Using cart service.");
    Ok(Self {
      manager: Arc::new(CartSyncManager::new(Arc::new(store))),
    })
  }

  /// State backed by an in-process store holding a small demo cart.
  pub fn offline() -> Self {
    tracing::info!("Using in-memory demo cart; nothing is persisted.");
    Self {
      manager: Arc::new(CartSyncManager::new(Arc::new(demo_store()))),
    }
  }
}

pub fn demo_store() -> InMemoryCartStore {
  let product = |name: &str, image: &str, price: Decimal| CatalogEntry {
    name: Some(name.to_string()),
    image_url: Some(image.to_string()),
    price: Some(price),
  };
  let store = InMemoryCartStore::new()
    .with_product("1", product("Foxtail Millet", "/images/foxtail.jpg", Decimal::from(120)))
    .with_product("2", product("Little Millet", "/images/little.jpg", Decimal::from(110)))
    .with_product("3", product("Ragi Flour", "/images/ragi.jpg", Decimal::new(8950, 2)))
    .with_product("4", product("Barnyard Millet", "/images/barnyard.jpg", Decimal::from(95)));
  store.seed_row("1", 2);
  store.seed_row("3", 1);
  store
}
