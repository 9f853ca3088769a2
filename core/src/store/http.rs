// cartsync/src/store/http.rs

//! `CartStore` over the cart service's REST API.
//!
//! | operation         | request                                       |
//! |-------------------|-----------------------------------------------|
//! | `fetch_cart`      | `GET /cart`                                   |
//! | `add_item`        | `POST /cart/add/{productId}/{quantity}`       |
//! | `update_quantity` | `PATCH /cart/update/{productId}` `{quantity}` |
//! | `remove_by_id`    | `DELETE /cart/remove/{id}`                    |

use crate::core::line::{CartLineId, ProductId, ServerCartRow};
use crate::error::StoreError;
use crate::store::credentials::CredentialProvider;
use crate::store::CartStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, instrument, Level};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8082";

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
  pub base_url: String,
  /// `None` keeps the HTTP client's default (no timeout).
  pub timeout: Option<Duration>,
}

impl Default for HttpStoreConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout: None,
    }
  }
}

pub struct HttpCartStore {
  client: Client,
  base_url: Url,
  credentials: Arc<dyn CredentialProvider>,
}

impl HttpCartStore {
  pub fn new(config: HttpStoreConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self, StoreError> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| StoreError::Endpoint(format!("invalid base url '{}': {}", config.base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(StoreError::Endpoint(format!("base url '{}' cannot carry a path", base_url)));
    }

    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    event!(Level::DEBUG, %base_url, timeout = ?config.timeout, "HTTP cart store configured.");
    Ok(Self {
      client,
      base_url,
      credentials,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// `base_url` + `segments`, each segment percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| StoreError::Endpoint(format!("base url '{}' cannot carry a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match self.credentials.bearer_token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, StoreError> {
    let response = self.authorize(request).send().await?;
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    event!(Level::WARN, operation, status = status.as_u16(), %body, "Cart service rejected request.");
    Err(StoreError::Rejected {
      operation,
      status: status.as_u16(),
      body,
    })
  }
}

#[async_trait]
impl CartStore for HttpCartStore {
  #[instrument(name = "HttpCartStore::fetch_cart", skip_all, err(Display))]
  async fn fetch_cart(&self) -> Result<Vec<ServerCartRow>, StoreError> {
    let url = self.endpoint(&["cart"])?;
    let response = self.send("fetch_cart", self.client.get(url)).await?;
    let body: Value = response.json().await.map_err(|e| StoreError::Decode {
      operation: "fetch_cart",
      message: e.to_string(),
    })?;

    match body {
      Value::Array(_) => serde_json::from_value(body).map_err(|e| StoreError::Decode {
        operation: "fetch_cart",
        message: e.to_string(),
      }),
      other => {
        event!(Level::WARN, payload = %other, "Cart payload is not a list; treating the cart as empty.");
        Ok(Vec::new())
      }
    }
  }

  #[instrument(name = "HttpCartStore::add_item", skip_all, fields(product_id = %product_id, quantity = quantity), err(Display))]
  async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
    let quantity_segment = quantity.to_string();
    let url = self.endpoint(&["cart", "add", product_id.as_str(), &quantity_segment])?;
    self.send("add_item", self.client.post(url)).await?;
    Ok(())
  }

  #[instrument(name = "HttpCartStore::update_quantity", skip_all, fields(product_id = %product_id, quantity = quantity), err(Display))]
  async fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
    let url = self.endpoint(&["cart", "update", product_id.as_str()])?;
    let request = self.client.patch(url).json(&json!({ "quantity": quantity }));
    self.send("update_quantity", request).await?;
    Ok(())
  }

  #[instrument(name = "HttpCartStore::remove_by_id", skip_all, fields(line_id = %line_id), err(Display))]
  async fn remove_by_id(&self, line_id: &CartLineId) -> Result<(), StoreError> {
    let url = self.endpoint(&["cart", "remove", line_id.as_str()])?;
    self.send("remove_by_id", self.client.delete(url)).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::credentials::StaticCredential;

  fn store(base: &str) -> HttpCartStore {
    HttpCartStore::new(
      HttpStoreConfig {
        base_url: base.to_string(),
        timeout: None,
      },
      Arc::new(StaticCredential::anonymous()),
    )
    .unwrap()
  }

  #[test]
  fn endpoints_append_to_base_path_and_encode_segments() {
    let s = store("http://localhost:8082/api/");
    let url = s.endpoint(&["cart", "add", "sku 1/a", "2"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8082/api/cart/add/sku%201%2Fa/2");

    let s = store("http://localhost:8082");
    assert_eq!(s.endpoint(&["cart"]).unwrap().as_str(), "http://localhost:8082/cart");
  }

  #[test]
  fn rejects_unusable_base_urls() {
    let result = HttpCartStore::new(
      HttpStoreConfig {
        base_url: "not a url".to_string(),
        timeout: None,
      },
      Arc::new(StaticCredential::anonymous()),
    );
    assert!(matches!(result, Err(StoreError::Endpoint(_))));
  }
}
