// storefront/src/errors.rs

use cartsync::{CartError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Not in cart: {0}")]
  NotInCart(String),

  #[error("Cart Error: {0}")]
  Cart(#[from] CartError),

  #[error("Cart Service Error: {0}")]
  Store(#[from] StoreError),

  #[error("Output Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization Error: {0}")]
  Json(#[from] serde_json::Error),
}

impl AppError {
  /// Process exit code for this error.
  pub fn exit_code(&self) -> u8 {
    match self {
      AppError::Config(_) => 78,
      AppError::NotInCart(_) => 1,
      AppError::Cart(CartError::InvalidArgument(_)) => 64,
      AppError::Cart(e) if e.store_error().map_or(false, StoreError::is_unauthorized) => 77,
      AppError::Cart(_) | AppError::Store(_) => 69,
      AppError::Io(_) | AppError::Json(_) => 74,
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
