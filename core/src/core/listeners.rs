// cartsync/src/core/listeners.rs

//! Snapshot listeners: the presentation layer subscribes here instead of
//! polling the manager.

use crate::core::snapshot::Snapshot;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{event, Level};

/// Called with the new snapshot after every change.
///
/// Runs while the snapshot's read lock is held: a listener may read the
/// snapshot it is handed, and may call the manager's read methods, but
/// MUST NOT call any mutating operation (`add`, `remove_local_only`, ...):
/// those need the write lock and deadlock.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
pub struct Listeners {
  entries: Mutex<Vec<(u64, Listener)>>,
  next_id: Mutex<u64>,
}

impl Listeners {
  pub(crate) fn subscribe(this: &Arc<Self>, listener: Listener) -> Subscription {
    let id = {
      let mut next = this.next_id.lock();
      *next += 1;
      *next
    };
    this.entries.lock().push((id, listener));
    event!(Level::DEBUG, subscription_id = id, "Snapshot listener registered.");
    Subscription {
      id,
      registry: Arc::downgrade(this),
    }
  }

  fn unsubscribe(&self, id: u64) {
    self.entries.lock().retain(|(entry_id, _)| *entry_id != id);
    event!(Level::DEBUG, subscription_id = id, "Snapshot listener removed.");
  }

  pub(crate) fn notify(&self, snapshot: &Snapshot) {
    // Cloned out so a listener may drop its own Subscription.
    let current: Vec<Listener> = self.entries.lock().iter().map(|(_, l)| l.clone()).collect();
    event!(
      Level::TRACE,
      revision = snapshot.revision(),
      listeners = current.len(),
      "Notifying snapshot listeners."
    );
    for listener in current {
      listener(snapshot);
    }
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
  id: u64,
  registry: Weak<Listeners>,
}

impl Subscription {
  pub fn id(&self) -> u64 {
    self.id
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(registry) = self.registry.upgrade() {
      registry.unsubscribe(self.id);
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("id", &self.id)
      .field("registry_alive", &(self.registry.strong_count() > 0))
      .finish()
  }
}
