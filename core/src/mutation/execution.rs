// cartsync/src/mutation/execution.rs

//! Contains `OptimisticMutation::execute()` and the full-refresh reconciliation
//! it ends with.

use crate::core::line::CartLine;
use crate::core::snapshot::{SharedSnapshot, Snapshot};
use crate::error::{CartError, CartResult, StoreError};
use crate::mutation::definition::OptimisticMutation;
use crate::store::CartStore;
use std::future::Future;
use tracing::{event, instrument, Level};

impl<Apply, Remote, Rollback, U> OptimisticMutation<Apply, Remote, Rollback, U>
where
  Apply: FnOnce(&mut Snapshot) -> U,
  Remote: Future<Output = Result<(), StoreError>>,
  Rollback: FnOnce(&mut Snapshot, U),
{
  /// Runs the mutation against `snapshot`.
  ///
  /// 1. `apply` runs immediately, so listeners see the change with no latency.
  /// 2. The remote call is awaited.
  /// 3. On failure, `rollback` runs before `RemoteMutationFailed` is returned;
  ///    the snapshot never keeps a half-applied change.
  /// 4. On success, the snapshot is replaced by a fresh fetch. If that fetch
  ///    fails the mutation still happened server-side: the optimistic value stays
  ///    and `RemoteRefreshFailed` is returned.
  #[instrument(
    name = "OptimisticMutation::execute",
    skip_all,
    fields(operation = %self.kind, product_id = %self.product_id),
    err(Display)
  )]
  pub async fn execute(self, snapshot: &SharedSnapshot, store: &dyn CartStore) -> CartResult<()> {
    let OptimisticMutation {
      kind,
      product_id,
      apply,
      remote,
      rollback,
      ..
    } = self;

    let undo = snapshot.update(apply);
    event!(Level::DEBUG, "Optimistic change applied; issuing remote call.");

    if let Err(source) = remote.await {
      event!(Level::WARN, error = %source, "Remote call failed; rolling back local change.");
      snapshot.update(|s| rollback(s, undo));
      return Err(CartError::RemoteMutationFailed {
        operation: kind,
        product_id,
        source,
      });
    }
    drop(undo);

    event!(Level::DEBUG, "Remote call succeeded; reconciling from server.");
    match reconcile(snapshot, store).await {
      Ok(lines) => {
        event!(Level::INFO, lines, "Cart reconciled after {}.", kind);
        Ok(())
      }
      Err(source) => {
        event!(Level::ERROR, error = %source, "Reconciliation failed; optimistic value remains until the next refresh.");
        Err(CartError::RemoteRefreshFailed { source })
      }
    }
  }
}

/// Fetches the server's cart and replaces the whole snapshot with it.
///
/// On failure the snapshot is left untouched. Returns the number of lines.
#[instrument(name = "reconcile", skip_all)]
pub async fn reconcile(snapshot: &SharedSnapshot, store: &dyn CartStore) -> Result<usize, StoreError> {
  let rows = store.fetch_cart().await?;
  let fetched = rows.len();
  let fresh = Snapshot::from_lines(rows.into_iter().filter_map(CartLine::from_server_row));
  let lines = fresh.len();
  if lines != fetched {
    event!(Level::WARN, fetched, kept = lines, "Some server rows did not map to cart lines.");
  }
  snapshot.update(|s| s.replace(fresh));
  Ok(lines)
}
