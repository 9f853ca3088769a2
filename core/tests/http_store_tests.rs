// tests/http_store_tests.rs
mod common;

use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::extract::State;
use axum::Router;
use cartsync::{
  CartError, CartLineId, CartStore, CartSyncManager, CredentialProvider, Decimal, HttpCartStore, HttpStoreConfig,
  ProductRef, SessionCredential, StaticCredential, StoreError,
};
use common::*;
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

/// What the stand-in service saw for one request.
#[derive(Debug, Clone)]
struct Seen {
  method: Method,
  path: String,
  authorization: Option<String>,
  body: String,
}

/// A cart service stand-in: records every request and answers `GET /cart`
/// with `cart_body`. `status` overrides the answer for every request.
struct FakeService {
  seen: Mutex<Vec<Seen>>,
  cart_body: Mutex<String>,
  status: Mutex<Option<StatusCode>>,
}

impl FakeService {
  fn new(cart_body: &str) -> Arc<Self> {
    Arc::new(Self {
      seen: Mutex::new(Vec::new()),
      cart_body: Mutex::new(cart_body.to_string()),
      status: Mutex::new(None),
    })
  }

  fn seen(&self) -> Vec<Seen> {
    self.seen.lock().clone()
  }

  fn last(&self) -> Seen {
    self.seen.lock().last().cloned().expect("no request recorded")
  }
}

async fn answer(
  State(service): State<Arc<FakeService>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
  body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
  let authorization = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  service.seen.lock().push(Seen {
    method: method.clone(),
    path: uri.path().to_string(),
    authorization,
    body,
  });

  let json = [(header::CONTENT_TYPE, "application/json")];
  if let Some(status) = *service.status.lock() {
    return (status, json, r#"{"error":"unavailable"}"#.to_string());
  }
  if method == Method::GET {
    return (StatusCode::OK, json, service.cart_body.lock().clone());
  }
  (StatusCode::OK, json, "{}".to_string())
}

async fn spawn_service(service: Arc<FakeService>) -> String {
  let app = Router::new().fallback(answer).with_state(service);
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{}", addr)
}

fn http_store(base_url: String, credentials: Arc<dyn CredentialProvider>) -> HttpCartStore {
  HttpCartStore::new(
    HttpStoreConfig {
      base_url,
      timeout: Some(Duration::from_secs(5)),
    },
    credentials,
  )
  .unwrap()
}

const TWO_ROWS: &str = r#"[
  {"id": 7, "productId": "sku-1", "productName": "Foxtail millet", "hasImage": true, "imageUrl": "/img/sku-1.png", "quantity": 2, "price": 100},
  {"id": "8", "productId": 42, "quantity": 1, "price": "49.50"}
]"#;

#[tokio::test]
#[serial]
async fn test_fetch_cart_reads_rows_with_mixed_id_types() {
  setup_tracing();
  let service = FakeService::new(TWO_ROWS);
  let store = http_store(spawn_service(service.clone()).await, Arc::new(StaticCredential::anonymous()));

  let rows = store.fetch_cart().await.unwrap();

  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].id, Some(CartLineId::new("7")));
  assert_eq!(rows[0].product_id, Some(pid("sku-1")));
  assert_eq!(rows[0].has_image, Some(true));
  assert_eq!(rows[1].product_id, Some(pid("42")));
  assert_eq!(rows[1].price, Some(Decimal::new(4950, 2)));

  let seen = service.last();
  assert_eq!(seen.method, Method::GET);
  assert_eq!(seen.path, "/cart");
}

#[tokio::test]
#[serial]
async fn test_requests_carry_bearer_token_only_when_present() {
  setup_tracing();
  let service = FakeService::new("[]");
  let base = spawn_service(service.clone()).await;

  let authed = http_store(base.clone(), Arc::new(StaticCredential::new("tok-123")));
  authed.fetch_cart().await.unwrap();
  assert_eq!(service.last().authorization.as_deref(), Some("Bearer tok-123"));

  let anonymous = http_store(base, Arc::new(StaticCredential::anonymous()));
  anonymous.fetch_cart().await.unwrap();
  assert_eq!(service.last().authorization, None);
}

#[tokio::test]
#[serial]
async fn test_session_credential_is_read_per_request() {
  setup_tracing();
  let service = FakeService::new("[]");
  let session = Arc::new(SessionCredential::new(None));
  let store = http_store(spawn_service(service.clone()).await, session.clone());

  store.fetch_cart().await.unwrap();
  session.set("fresh-token");
  store.fetch_cart().await.unwrap();
  session.clear();
  store.fetch_cart().await.unwrap();

  let auth: Vec<Option<String>> = service.seen().into_iter().map(|s| s.authorization).collect();
  assert_eq!(auth, vec![None, Some("Bearer fresh-token".to_string()), None]);
}

#[tokio::test]
#[serial]
async fn test_mutations_use_service_routes() {
  setup_tracing();
  let service = FakeService::new("[]");
  let store = http_store(spawn_service(service.clone()).await, Arc::new(StaticCredential::new("t")));

  store.add_item(&pid("sku-1"), 2).await.unwrap();
  store.update_quantity(&pid("sku-1"), 3).await.unwrap();
  store.remove_by_id(&CartLineId::new("7")).await.unwrap();

  let seen = service.seen();
  assert_eq!(seen.len(), 3);

  assert_eq!(seen[0].method, Method::POST);
  assert_eq!(seen[0].path, "/cart/add/sku-1/2");

  assert_eq!(seen[1].method, Method::PATCH);
  assert_eq!(seen[1].path, "/cart/update/sku-1");
  let body: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
  assert_eq!(body, serde_json::json!({ "quantity": 3 }));

  assert_eq!(seen[2].method, Method::DELETE);
  assert_eq!(seen[2].path, "/cart/remove/7");
}

#[tokio::test]
#[serial]
async fn test_non_success_status_is_rejected() {
  setup_tracing();
  let service = FakeService::new("[]");
  *service.status.lock() = Some(StatusCode::INTERNAL_SERVER_ERROR);
  let store = http_store(spawn_service(service.clone()).await, Arc::new(StaticCredential::anonymous()));

  let err = store.update_quantity(&pid("sku-1"), 1).await.unwrap_err();
  match err {
    StoreError::Rejected {
      operation,
      status,
      body,
    } => {
      assert_eq!(operation, "update_quantity");
      assert_eq!(status, 500);
      assert!(body.contains("unavailable"));
    }
    other => panic!("unexpected error: {:?}", other),
  }

  *service.status.lock() = Some(StatusCode::UNAUTHORIZED);
  let err = store.fetch_cart().await.unwrap_err();
  assert!(err.is_unauthorized());
}

#[tokio::test]
#[serial]
async fn test_non_list_payload_reads_as_empty_cart() {
  setup_tracing();
  let service = FakeService::new(r#"{"message": "no cart yet"}"#);
  let store = http_store(spawn_service(service).await, Arc::new(StaticCredential::anonymous()));

  assert!(store.fetch_cart().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_unreachable_service_is_a_transport_error() {
  setup_tracing();
  // Bind then drop, so nothing listens on the port.
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let store = http_store(format!("http://{}", addr), Arc::new(StaticCredential::anonymous()));
  let manager = CartSyncManager::new(Arc::new(store));
  let err = manager.try_load_initial().await.unwrap_err();

  assert!(matches!(
    err,
    CartError::InitialLoadFailed {
      source: StoreError::Transport(_)
    }
  ));
  assert!(manager.snapshot().is_empty());
}

#[tokio::test]
#[serial]
async fn test_manager_over_http_reconciles_from_service() {
  setup_tracing();
  let service = FakeService::new(TWO_ROWS);
  let store = http_store(spawn_service(service.clone()).await, Arc::new(StaticCredential::new("t")));
  let manager = CartSyncManager::new(Arc::new(store));
  manager.try_load_initial().await.unwrap();

  assert_eq!(
    quantities(&manager.snapshot()),
    vec![("sku-1".to_string(), 2), ("42".to_string(), 1)]
  );

  *service.cart_body.lock() = r#"[{"id": 7, "productId": "sku-1", "quantity": 3, "price": 100}]"#.to_string();
  manager.add(&ProductRef::new("sku-1"), 1).await.unwrap();

  let paths: Vec<(Method, String)> = service.seen().into_iter().skip(1).map(|s| (s.method, s.path)).collect();
  assert_eq!(
    paths,
    vec![
      (Method::POST, "/cart/add/sku-1/1".to_string()),
      (Method::GET, "/cart".to_string())
    ]
  );
  assert_eq!(quantities(&manager.snapshot()), vec![("sku-1".to_string(), 3)]);
}
