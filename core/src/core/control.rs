// cartsync/src/core/control.rs

//! Names the cart mutations, for logging and error reporting.

use std::fmt;

/// Which public cart operation a mutation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
  /// Add a product (or more of it) to the cart.
  Add,
  /// Raise a line's quantity by one.
  Increase,
  /// Lower a line's quantity by one.
  Decrease,
  /// Take the line out of the cart, either because a decrease reached zero
  /// or because the caller asked for removal outright.
  Remove,
}

impl MutationKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      MutationKind::Add => "add",
      MutationKind::Increase => "increase",
      MutationKind::Decrease => "decrease",
      MutationKind::Remove => "remove",
    }
  }
}

impl fmt::Display for MutationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
