// src/lib.rs

//! cartsync: an optimistic, server-reconciled shopping cart for Rust clients.
//!
//! The `CartSyncManager` keeps one in-memory snapshot of the cart and
//! mediates every change to it:
//!  - Mutations (add, increase, decrease, remove) apply locally first, so a UI
//!    reflects them with no latency.
//!  - The change is then sent to the Cart Storage Service through a `CartStore`.
//!  - On success the whole snapshot is replaced by the server's cart.
//!  - On failure the local change is rolled back before the error is returned.
//!  - Mutations on the same product are serialized; different products run
//!    concurrently.
//!  - Listeners subscribe to snapshot changes instead of polling.

pub mod core;
pub mod error;
pub mod manager;
pub mod mutation;
pub mod store;

// --- Re-exports for the Public API ---

// Data model
pub use crate::core::control::MutationKind;
pub use crate::core::line::{CartLine, CartLineId, ProductId, ProductRef, ServerCartRow};
pub use crate::core::listeners::Subscription;
pub use crate::core::snapshot::{LineUndo, SharedSnapshot, Snapshot};

// The manager and the helper every mutation goes through
pub use crate::manager::CartSyncManager;
pub use crate::mutation::OptimisticMutation;

// Collaborators
pub use crate::store::{
  CartStore, CredentialProvider, HttpCartStore, HttpStoreConfig, InMemoryCartStore, SessionCredential,
  StaticCredential, StoreCall, StoreOp,
};
pub use crate::store::memory::CatalogEntry;

pub use crate::error::{CartError, CartResult, StoreError};

// Re-exported so callers can name prices without a direct dependency.
pub use rust_decimal::Decimal;

/*
    Typical wiring:
    1. Build a `CartStore`: `HttpCartStore::new(config, credentials)` against the
       service, or `InMemoryCartStore` for tests and offline demos.
    2. `let manager = CartSyncManager::new(Arc::new(store));`
    3. `let _sub = manager.subscribe(|snapshot| render(snapshot));`
    4. `manager.load_initial().await;` once, when the owning context starts.
    5. Call `add` / `increase_quantity` / `decrease_quantity` / `remove` from UI
       events. On `Err`, show the error; the snapshot is already consistent.
       `refresh()` is the manual resync for anything the caller cannot recover.
*/
