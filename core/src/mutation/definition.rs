// cartsync/src/mutation/definition.rs

//! Contains the `OptimisticMutation` struct and its construction.

use crate::core::control::MutationKind;
use crate::core::line::ProductId;
use crate::core::snapshot::{LineUndo, Snapshot};
use crate::error::StoreError;
use std::future::Future;
use std::marker::PhantomData;

/// One cart mutation, described by its three moving parts:
///
/// - `apply`: changes the snapshot locally and returns an undo record `U`.
/// - `remote`: the call to the cart service confirming the change.
/// - `rollback`: consumes the undo record to put the snapshot back.
///
/// Every public cart operation is expressed as one of these; see `execute`.
pub struct OptimisticMutation<Apply, Remote, Rollback, U> {
  pub(crate) kind: MutationKind,
  pub(crate) product_id: ProductId,
  pub(crate) apply: Apply,
  pub(crate) remote: Remote,
  pub(crate) rollback: Rollback,
  _undo: PhantomData<fn() -> U>,
}

impl<Apply, Remote, Rollback, U> OptimisticMutation<Apply, Remote, Rollback, U>
where
  Apply: FnOnce(&mut Snapshot) -> U,
  Remote: Future<Output = Result<(), StoreError>>,
  Rollback: FnOnce(&mut Snapshot, U),
{
  pub fn new(kind: MutationKind, product_id: ProductId, apply: Apply, remote: Remote, rollback: Rollback) -> Self {
    Self {
      kind,
      product_id,
      apply,
      remote,
      rollback,
      _undo: PhantomData,
    }
  }

  pub fn kind(&self) -> MutationKind {
    self.kind
  }

  pub fn product_id(&self) -> &ProductId {
    &self.product_id
  }
}

impl<Apply, Remote> OptimisticMutation<Apply, Remote, fn(&mut Snapshot, LineUndo), LineUndo>
where
  Apply: FnOnce(&mut Snapshot) -> LineUndo,
  Remote: Future<Output = Result<(), StoreError>>,
{
  /// A mutation on a single line whose rollback restores the line exactly
  /// as `apply` found it (same quantity, identifiers and position).
  pub fn on_line(kind: MutationKind, product_id: ProductId, apply: Apply, remote: Remote) -> Self {
    Self::new(kind, product_id, apply, remote, Snapshot::restore as fn(&mut Snapshot, LineUndo))
  }
}
