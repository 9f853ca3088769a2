// storefront/src/cli/mod.rs

pub mod handlers;

use cartsync::Decimal;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(about = "Inspect and change your cart on the cart service")]
pub struct Cli {
  /// Work against an in-memory demo cart instead of the cart service.
  #[arg(long, global = true, default_value_t = false)]
  pub offline: bool,
  /// Print the cart as JSON instead of a table.
  #[arg(long, global = true, default_value_t = false)]
  pub json: bool,
  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
  /// Show the cart (the default).
  Show,
  /// Add a product, or more of one already in the cart.
  Add {
    product_id: String,
    #[arg(long, short, default_value_t = 1)]
    quantity: u32,
    /// Display name shown until the service answers.
    #[arg(long)]
    name: Option<String>,
    /// Unit price shown until the service answers.
    #[arg(long)]
    price: Option<Decimal>,
  },
  /// Raise a line's quantity by one.
  Increase { product_id: String },
  /// Lower a line's quantity by one; a line at one is removed.
  Decrease { product_id: String },
  /// Take a line out of the cart.
  Remove { product_id: String },
  /// Re-read the cart from the service.
  Refresh,
}
