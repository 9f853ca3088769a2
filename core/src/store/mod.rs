// cartsync/src/store/mod.rs

//! The Cart Storage Service seam and its implementations.

pub mod credentials;
pub mod http;
pub mod memory;

use crate::core::line::{CartLineId, ProductId, ServerCartRow};
use crate::error::StoreError;
use async_trait::async_trait;

pub use credentials::{CredentialProvider, SessionCredential, StaticCredential};
pub use http::{HttpCartStore, HttpStoreConfig};
pub use memory::{InMemoryCartStore, StoreCall, StoreOp};

/// The durable cart, owned by a remote service.
///
/// Mutating calls report only success or failure: whatever the service echoes
/// back is superseded by the full fetch that follows every successful mutation.
#[async_trait]
pub trait CartStore: Send + Sync {
  /// All rows of the caller's cart, in service order.
  async fn fetch_cart(&self) -> Result<Vec<ServerCartRow>, StoreError>;

  /// Adds `quantity` of the product; the service sums it into an existing row.
  async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError>;

  /// Sets the row for the product to `quantity`; zero means removal.
  async fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError>;

  /// Deletes one row by its service-assigned id.
  async fn remove_by_id(&self, line_id: &CartLineId) -> Result<(), StoreError>;
}
