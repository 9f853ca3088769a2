pub mod control;
pub mod gate;
pub mod line;
pub mod listeners;
pub mod snapshot;

// Re-export key types for easier access from other cartsync modules (and lib.rs)
pub use control::MutationKind;
pub use line::{CartLine, CartLineId, ProductId, ProductRef, ServerCartRow};
pub use listeners::{Listener, Subscription};
pub use snapshot::{LineUndo, SharedSnapshot, Snapshot};
