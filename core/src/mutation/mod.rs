// cartsync/src/mutation/mod.rs

//! The optimistic mutation helper: apply locally, call the service, then
//! either reconcile from the server or roll the local change back.

pub mod definition;
pub mod execution;

pub use definition::OptimisticMutation;
pub use execution::reconcile;
