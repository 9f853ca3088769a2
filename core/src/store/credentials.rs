// cartsync/src/store/credentials.rs

//! Bearer credentials for the cart service, injected into the HTTP store
//! rather than looked up from ambient session state.

use parking_lot::RwLock;
use tracing::{event, Level};

/// Supplies the bearer token for each outgoing request.
///
/// Returning `None` sends the request without an `Authorization` header.
pub trait CredentialProvider: Send + Sync {
  fn bearer_token(&self) -> Option<String>;
}

/// A fixed token (or none), for tests and single-user tools.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
  pub fn new(token: impl Into<String>) -> Self {
    Self(Some(token.into()))
  }

  pub fn anonymous() -> Self {
    Self(None)
  }
}

impl CredentialProvider for StaticCredential {
  fn bearer_token(&self) -> Option<String> {
    self.0.clone()
  }
}

/// A token whose lifecycle belongs to the auth collaborator: set at login,
/// cleared at logout or expiry.
#[derive(Debug, Default)]
pub struct SessionCredential {
  token: RwLock<Option<String>>,
}

impl SessionCredential {
  pub fn new(token: Option<String>) -> Self {
    Self {
      token: RwLock::new(token),
    }
  }

  pub fn set(&self, token: impl Into<String>) {
    *self.token.write() = Some(token.into());
    event!(Level::DEBUG, "Session credential set.");
  }

  pub fn clear(&self) {
    *self.token.write() = None;
    event!(Level::DEBUG, "Session credential cleared.");
  }

  pub fn is_set(&self) -> bool {
    self.token.read().is_some()
  }
}

impl CredentialProvider for SessionCredential {
  fn bearer_token(&self) -> Option<String> {
    self.token.read().clone()
  }
}
