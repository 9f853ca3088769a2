// storefront/src/cli/handlers.rs

use crate::cli::Command;
use crate::errors::{AppError, Result};
use crate::render::{cart_table, CartView};
use crate::state::AppState;
use cartsync::{CartError, CartLine, ProductId, ProductRef};
use std::io::Write;
use tracing::{error, info, instrument, warn};

/// Runs one command against the loaded cart and prints the resulting cart.
#[instrument(name = "storefront::run", skip_all, fields(command = ?command))]
pub async fn run(state: &AppState, command: Command, json: bool, out: &mut impl Write) -> Result<()> {
  match command {
    // These act on a line already in the cart, so a failed load is not an empty cart.
    Command::Increase { .. } | Command::Decrease { .. } | Command::Remove { .. } => {
      state.manager.try_load_initial().await?
    }
    Command::Refresh => {}
    Command::Show | Command::Add { .. } => state.manager.load_initial().await,
  }

  let outcome = match command {
    Command::Show => Ok(()),
    Command::Refresh => state.manager.refresh().await,
    Command::Add {
      product_id,
      quantity,
      name,
      price,
    } => {
      let mut product = ProductRef::new(product_id);
      if let Some(name) = name {
        product = product.with_name(name);
      }
      if let Some(price) = price {
        product = product.with_unit_price(price);
      }
      state.manager.add(&product, quantity).await
    }
    Command::Increase { product_id } => {
      let line = line_in_cart(state, &product_id)?;
      state.manager.increase_quantity(&line).await
    }
    Command::Decrease { product_id } => {
      let line = line_in_cart(state, &product_id)?;
      state.manager.decrease_quantity(&line).await
    }
    Command::Remove { product_id } => {
      let line = line_in_cart(state, &product_id)?;
      state.manager.remove(&line).await
    }
  };

  if let Err(e) = &outcome {
    resync_after_failure(state, e).await;
  }

  print_cart(state, json, out)?;
  outcome.map_err(AppError::from)
}

fn line_in_cart(state: &AppState, product_id: &str) -> Result<CartLine> {
  state
    .manager
    .line(&ProductId::new(product_id))
    .ok_or_else(|| AppError::NotInCart(product_id.to_string()))
}

/// The local cart is already consistent after a failure; a refresh picks up
/// whatever else changed on the service meanwhile.
async fn resync_after_failure(state: &AppState, failure: &CartError) {
  error!(error = %failure, "Cart update failed.");
  if matches!(failure, CartError::InvalidArgument(_)) {
    return;
  }
  match state.manager.refresh().await {
    Ok(()) => info!("Cart resynchronized after failure."),
    Err(e) => warn!(error = %e, "Resync after failure also failed; showing local cart."),
  }
}

fn print_cart(state: &AppState, json: bool, out: &mut impl Write) -> Result<()> {
  let snapshot = state.manager.snapshot();
  if json {
    serde_json::to_writer_pretty(&mut *out, &CartView::from(&snapshot))?;
    writeln!(out)?;
  } else {
    write!(out, "{}", cart_table(&snapshot))?;
  }
  Ok(())
}
