// cartsync/src/core/line.rs

//! Cart line types: the client-side `CartLine`, the `ProductRef` handed to
//! `add`, and the `ServerCartRow` wire shape returned by the cart service.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

// The cart service uses numeric ids, catalog payloads sometimes carry strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Text(String),
  Signed(i64),
  Unsigned(u64),
}

impl From<RawId> for String {
  fn from(raw: RawId) -> Self {
    match raw {
      RawId::Text(s) => s,
      RawId::Signed(n) => n.to_string(),
      RawId::Unsigned(n) => n.to_string(),
    }
  }
}

macro_rules! opaque_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
      }

      pub fn as_str(&self) -> &str {
        &self.0
      }

      /// Blank ids never identify anything on the service.
      pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self {
        Self(s.to_string())
      }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self {
        Self(s)
      }
    }

    impl From<i64> for $name {
      fn from(n: i64) -> Self {
        Self(n.to_string())
      }
    }

    impl Serialize for $name {
      fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
      }
    }

    impl<'de> Deserialize<'de> for $name {
      fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
      }
    }
  };
}

opaque_id!(
  /// Catalog identifier of a product. Stable across sessions; unique per cart.
  ProductId
);

opaque_id!(
  /// Identifier the cart service assigns to a persisted cart row.
  CartLineId
);

impl From<CartLineId> for ProductId {
  fn from(id: CartLineId) -> Self {
    ProductId(id.0)
  }
}

/// A client-visible cart entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: ProductId,
  /// `None` until the service has accepted an add for this product.
  pub cart_line_id: Option<CartLineId>,
  pub name: Option<String>,
  pub image_ref: Option<String>,
  /// Always >= 1 while the line is in a snapshot.
  pub quantity: u32,
  pub unit_price: Option<Decimal>,
}

impl CartLine {
  pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
    Self {
      product_id: product_id.into(),
      cart_line_id: None,
      name: None,
      image_ref: None,
      quantity,
      unit_price: None,
    }
  }

  pub fn with_cart_line_id(mut self, id: impl Into<CartLineId>) -> Self {
    self.cart_line_id = Some(id.into());
    self
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_unit_price(mut self, price: Decimal) -> Self {
    self.unit_price = Some(price);
    self
  }

  /// `unit_price * quantity`; lines without a price count as zero.
  pub fn line_total(&self) -> Decimal {
    self.unit_price.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
  }

  /// Same line with a different quantity.
  pub(crate) fn with_quantity(&self, quantity: u32) -> Self {
    Self {
      quantity,
      ..self.clone()
    }
  }

  /// Synthesizes the optimistic line for a product not yet in the cart.
  /// Display fields are best-effort copies of the catalog data.
  pub(crate) fn from_product(product_id: ProductId, product: &ProductRef, quantity: u32) -> Self {
    Self {
      product_id,
      cart_line_id: None,
      name: product.name.clone(),
      image_ref: product.image_ref.clone(),
      quantity,
      unit_price: product.unit_price,
    }
  }

  /// Maps one service row to a client line.
  ///
  /// The product id falls back to the row id when the row carries none.
  /// Returns `None` for rows that cannot form a valid line.
  pub fn from_server_row(row: ServerCartRow) -> Option<Self> {
    let product_id = match (row.product_id, row.id.clone()) {
      (Some(pid), _) if !pid.is_blank() => pid,
      (_, Some(row_id)) if !row_id.is_blank() => ProductId::from(row_id),
      _ => {
        warn!(row_id = ?row.id, "Dropping cart row without any usable identifier.");
        return None;
      }
    };

    let quantity = match row.quantity {
      Some(q) if q >= 1 => match u32::try_from(q) {
        Ok(q) => q,
        Err(_) => {
          warn!(%product_id, quantity = q, "Dropping cart row with out-of-range quantity.");
          return None;
        }
      },
      other => {
        warn!(%product_id, quantity = ?other, "Dropping cart row without a positive quantity.");
        return None;
      }
    };

    Some(Self {
      product_id,
      cart_line_id: row.id,
      name: row.product_name,
      image_ref: row.image_url,
      quantity,
      unit_price: row.price,
    })
  }
}

/// Product data handed to `add`. Only the id is required; the rest seeds the
/// optimistic line until the service answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProductRef")]
pub struct ProductRef {
  pub id: Option<ProductId>,
  pub name: Option<String>,
  pub image_ref: Option<String>,
  pub unit_price: Option<Decimal>,
}

// Catalog and cart payloads name the same data differently, and a cart-row
// shaped product carries both names at once. The first present name wins.
#[derive(Deserialize)]
struct RawProductRef {
  id: Option<ProductId>,
  #[serde(rename = "productId")]
  product_id: Option<ProductId>,
  name: Option<String>,
  #[serde(rename = "productName")]
  product_name: Option<String>,
  image_ref: Option<String>,
  image: Option<String>,
  #[serde(rename = "imageUrl")]
  image_url: Option<String>,
  unit_price: Option<Decimal>,
  price: Option<Decimal>,
}

impl From<RawProductRef> for ProductRef {
  fn from(raw: RawProductRef) -> Self {
    Self {
      id: raw.id.or(raw.product_id),
      name: raw.name.or(raw.product_name),
      image_ref: raw.image_ref.or(raw.image).or(raw.image_url),
      unit_price: raw.unit_price.or(raw.price),
    }
  }
}

impl ProductRef {
  pub fn new(id: impl Into<ProductId>) -> Self {
    Self {
      id: Some(id.into()),
      ..Self::default()
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
    self.image_ref = Some(image_ref.into());
    self
  }

  pub fn with_unit_price(mut self, price: Decimal) -> Self {
    self.unit_price = Some(price);
    self
  }

  /// The product id, unless it is missing or blank.
  pub fn resolve_id(&self) -> Option<ProductId> {
    self.id.as_ref().filter(|id| !id.is_blank()).cloned()
  }
}

/// One row of `GET /cart`, as the cart service serializes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartRow {
  #[serde(default)]
  pub id: Option<CartLineId>,
  #[serde(default)]
  pub product_id: Option<ProductId>,
  #[serde(default)]
  pub product_name: Option<String>,
  #[serde(default)]
  pub has_image: Option<bool>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub quantity: Option<i64>,
  #[serde(default)]
  pub price: Option<Decimal>,
}
