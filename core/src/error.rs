// cartsync/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::core::control::MutationKind;
use crate::core::line::ProductId;

/// Failure of a single call to the Cart Storage Service.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Transport failure talking to the cart service: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Cart service rejected {operation} with status {status}: {body}")]
  Rejected {
    operation: &'static str,
    status: u16,
    body: String,
  },

  #[error("Cart service returned an unreadable payload for {operation}: {message}")]
  Decode { operation: &'static str, message: String },

  #[error("Cannot build cart service endpoint: {0}")]
  Endpoint(String),

  #[error("Cart store backend error. Source: {0}")]
  Backend(#[source] AnyhowError),
}

impl StoreError {
  /// Status code of a rejected call, if the service answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      StoreError::Rejected { status, .. } => Some(*status),
      StoreError::Transport(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }

  /// The bearer credential was refused. Credential lifecycle belongs to the
  /// auth collaborator; callers use this to route the user back to login.
  pub fn is_unauthorized(&self) -> bool {
    self.status() == Some(401)
  }
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend(err)
  }
}

#[derive(Debug, Error)]
pub enum CartError {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Remote {operation} failed for product '{product_id}'; local cart rolled back. Source: {source}")]
  RemoteMutationFailed {
    operation: MutationKind,
    product_id: ProductId,
    #[source]
    source: StoreError,
  },

  #[error("Cart refresh from the service failed. Source: {source}")]
  RemoteRefreshFailed {
    #[source]
    source: StoreError,
  },

  #[error("Initial cart load failed; continuing with an empty cart. Source: {source}")]
  InitialLoadFailed {
    #[source]
    source: StoreError,
  },
}

impl CartError {
  /// The underlying store failure, for every variant that has one.
  pub fn store_error(&self) -> Option<&StoreError> {
    match self {
      CartError::InvalidArgument(_) => None,
      CartError::RemoteMutationFailed { source, .. }
      | CartError::RemoteRefreshFailed { source }
      | CartError::InitialLoadFailed { source } => Some(source),
    }
  }
}

pub type CartResult<T, E = CartError> = std::result::Result<T, E>;
