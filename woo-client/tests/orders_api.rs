// woo-client/tests/orders_api.rs
// 远程订单接口集成测试 (wiremock)

use chrono::Utc;
use shared::models::CustomerSnapshot;
use shared::order::{DeliveryDetails, LineItem, Order, OrderStatus, PaymentStatus};
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use woo_client::{ClientError, CustomerRemote, OrderRemote, WooConfig, WooCustomers, WooOrders};

fn config(server: &MockServer) -> WooConfig {
    WooConfig::new(server.uri()).with_credentials("ck_test", "cs_test")
}

fn orders_api(server: &MockServer) -> WooOrders {
    WooOrders::new(config(server).build_client().unwrap())
}

fn remote_order(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "status": "processing",
        "customer_id": 42,
        "payment_method": "cod",
        "shipping_total": "60.00",
        "discount_total": "0.00",
        "date_created_gmt": "2024-05-01T10:00:00",
        "shipping": {"first_name": "Rahim", "last_name": "Uddin", "address_1": "House 12", "city": "Dhaka", "phone": "017"},
        "line_items": [{"product_id": 11, "name": "Milk", "quantity": 1, "subtotal": "90.00"}]
    })
}

fn local_order() -> Order {
    let items = vec![LineItem {
        product_id: 11,
        name: "Milk".into(),
        quantity: 2,
        unit_price: 90.0,
        selected_attributes: BTreeMap::new(),
        images: vec![],
    }];
    let delivery = DeliveryDetails {
        name: "Rahim Uddin".into(),
        phone: "017".into(),
        address: "House 12".into(),
        city: "Dhaka".into(),
        ..Default::default()
    };
    Order::place("ORD-1", "u1", items, delivery, 60.0, Utc::now()).unwrap()
}

fn customer() -> CustomerSnapshot {
    CustomerSnapshot {
        remote_customer_id: Some(42),
        first_name: "Rahim".into(),
        last_name: "Uddin".into(),
        email: "rahim@example.com".into(),
        phone: "017".into(),
    }
}

#[tokio::test]
async fn test_pull_follows_pages_until_short_page() {
    let server = MockServer::start().await;
    let first: Vec<_> = (1..=100).map(remote_order).collect();
    let second = vec![remote_order(101)];

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(second))
        .expect(1)
        .mount(&server)
        .await;

    let pulled = orders_api(&server).pull(42).await.unwrap();
    assert_eq!(pulled.rejected, 0);
    let orders = pulled.orders;
    assert_eq!(orders.len(), 101);
    assert_eq!(orders[0].id, "wc-1");
    assert_eq!(orders[100].remote_id, Some(101));
    assert_eq!(orders[0].status, OrderStatus::Processing);
}

#[tokio::test]
async fn test_requests_carry_oauth_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(query_param("customer", "42"))
        .and(query_param("per_page", "100"))
        .and(query_param("oauth_consumer_key", "ck_test"))
        .and(query_param("oauth_signature_method", "HMAC-SHA1"))
        .and(query_param("oauth_version", "1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let pulled = orders_api(&server).pull(42).await.unwrap();
    assert!(pulled.orders.is_empty());

    let requests = server.received_requests().await.unwrap();
    let keys: Vec<String> = requests[0]
        .url
        .query_pairs()
        .map(|(k, _)| k.into_owned())
        .collect();
    assert_eq!(keys.last().map(String::as_str), Some("oauth_signature"));
    assert!(keys.iter().any(|k| k == "oauth_nonce"));
    assert!(keys.iter().any(|k| k == "oauth_timestamp"));
}

#[tokio::test]
async fn test_pull_skips_unexpected_records() {
    let server = MockServer::start().await;
    let mut completed = remote_order(8);
    completed["status"] = serde_json::json!("completed");
    // status added by a shipping plugin
    let mut shipped = remote_order(9);
    shipped["status"] = serde_json::json!("shipped");
    let mut bad_money = remote_order(10);
    bad_money["shipping_total"] = serde_json::json!("sixty");
    let page = vec![remote_order(7), completed, shipped, bad_money];

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .mount(&server)
        .await;

    let pulled = orders_api(&server).pull(42).await.unwrap();
    assert_eq!(pulled.rejected, 2);
    let ids: Vec<Option<u64>> = pulled.orders.iter().map(|o| o.remote_id).collect();
    assert_eq!(ids, vec![Some(7), Some(8)]);
    assert_eq!(pulled.orders[1].status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_push_returns_remote_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(body_partial_json(serde_json::json!({
            "customer_id": 42,
            "status": "pending",
            "set_paid": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote_order(555)))
        .expect(1)
        .mount(&server)
        .await;

    let remote_id = orders_api(&server)
        .push(&local_order(), &customer())
        .await
        .unwrap();
    assert_eq!(remote_id, 555);
}

#[tokio::test]
async fn test_push_without_customer_id_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote_order(1)))
        .expect(0)
        .mount(&server)
        .await;

    let mut snapshot = customer();
    snapshot.remote_customer_id = None;
    let err = orders_api(&server)
        .push(&local_order(), &snapshot)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_update_status_puts_mapped_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/orders/555"))
        .and(body_partial_json(serde_json::json!({
            "status": "completed",
            "set_paid": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_order(555)))
        .expect(1)
        .mount(&server)
        .await;

    orders_api(&server)
        .update_status(555, OrderStatus::Delivered, PaymentStatus::Paid)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_errors_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let api = orders_api(&server);
    let err = api
        .update_status(1, OrderStatus::Cancelled, PaymentStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    let err = api.pull(42).await.unwrap_err();
    assert!(matches!(err, ClientError::Remote { status: 503, .. }));
}

#[tokio::test]
async fn test_missing_credentials_fail_only_the_call() {
    let api = WooOrders::new(WooConfig::default().build_client().unwrap());
    let err = api.pull(42).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConfigured("base URL")));
}

#[tokio::test]
async fn test_customer_ensure_uses_existing_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/customers"))
        .and(query_param("email", "rahim@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 77, "email": "Rahim@Example.com", "first_name": "Rahim", "last_name": "Uddin"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let customers = WooCustomers::new(config(&server).build_client().unwrap());
    let mut snapshot = customer();
    snapshot.remote_customer_id = None;
    let linked = customers.ensure(&snapshot).await.unwrap();
    assert_eq!(linked.remote_customer_id, Some(77));
}

#[tokio::test]
async fn test_customer_ensure_creates_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/customers"))
        .and(body_partial_json(serde_json::json!({"email": "rahim@example.com"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!(
            {"id": 88, "email": "rahim@example.com"}
        )))
        .expect(1)
        .mount(&server)
        .await;

    let customers = WooCustomers::new(config(&server).build_client().unwrap());
    let mut snapshot = customer();
    snapshot.remote_customer_id = None;
    let linked = customers.ensure(&snapshot).await.unwrap();
    assert_eq!(linked.remote_customer_id, Some(88));
    assert_eq!(linked.email, "rahim@example.com");
}
