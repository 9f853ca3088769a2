// storefront/src/render.rs

//! Text and JSON views of a cart snapshot.

use cartsync::{CartLine, Decimal, Snapshot};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct CartView<'a> {
  pub revision: u64,
  pub lines: &'a [CartLine],
  pub item_count: u64,
  pub subtotal: Decimal,
}

impl<'a> From<&'a Snapshot> for CartView<'a> {
  fn from(snapshot: &'a Snapshot) -> Self {
    Self {
      revision: snapshot.revision(),
      lines: snapshot.lines(),
      item_count: snapshot.item_count(),
      subtotal: snapshot.subtotal(),
    }
  }
}

fn money(amount: Option<Decimal>) -> String {
  match amount {
    Some(amount) => format!("{:.2}", amount),
    None => "-".to_string(),
  }
}

/// One row per line, then the subtotal.
pub fn cart_table(snapshot: &Snapshot) -> String {
  if snapshot.is_empty() {
    return "Your cart is empty.\n".to_string();
  }

  let rows: Vec<[String; 5]> = snapshot
    .lines()
    .iter()
    .map(|line| {
      [
        line.product_id.to_string(),
        line.name.clone().unwrap_or_default(),
        line.quantity.to_string(),
        money(line.unit_price),
        money(line.unit_price.map(|_| line.line_total())),
      ]
    })
    .collect();

  let header = ["PRODUCT", "NAME", "QTY", "PRICE", "TOTAL"];
  let mut widths = header.map(str::len);
  for row in &rows {
    for (width, cell) in widths.iter_mut().zip(row) {
      *width = (*width).max(cell.chars().count());
    }
  }

  let mut out = String::new();
  let mut push_row = |cells: [&str; 5]| {
    let _ = writeln!(
      out,
      "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}  {:>w4$}",
      cells[0],
      cells[1],
      cells[2],
      cells[3],
      cells[4],
      w0 = widths[0],
      w1 = widths[1],
      w2 = widths[2],
      w3 = widths[3],
      w4 = widths[4],
    );
  };
  push_row(header);
  for row in &rows {
    push_row([&row[0], &row[1], &row[2], &row[3], &row[4]]);
  }

  let _ = writeln!(
    out,
    "\n{} item(s), subtotal {}",
    snapshot.item_count(),
    money(Some(snapshot.subtotal()))
  );
  out
}
