//! Order routes end to end over the in-memory client.

use http::StatusCode;
use serde_json::{json, Value};
use storefront_core::{ErrorKind, Order, OrderStatus};
use storefront_test::{CreateUserMode, Failure, TestApp, USER_TOKEN};
use uuid::Uuid;

fn order(email: &str) -> Value {
    json!({
        "full_name": "Ada Lovelace",
        "email": email,
        "phone": "+44 20 0000 0000",
        "address": "12 St James's Square",
        "items": [{"product_slug": "engine", "quantity": 2, "price": 10.5}]
    })
}

async fn place(app: &TestApp, token: Option<&str>, email: &str) -> Order {
    let mut request = app.client().post("/api/order").json(&order(email));
    if let Some(token) = token {
        request = request.bearer_token(token);
    }
    let response = request.send().await;
    response.assert_status(StatusCode::CREATED);
    response.data().unwrap()
}

#[tokio::test]
async fn test_guest_order_provisions_one_user() {
    let app = TestApp::new();
    let created = place(&app, None, "ada@example.com").await;

    assert_eq!(app.identity().create_user_calls(), 1);
    assert_eq!(app.identity().parse_claims_calls(), 0);
    assert_eq!(created.user_id, app.identity().user_id("ada@example.com"));
    assert_eq!(created.status, OrderStatus::Created);
    assert!((created.total_amount - 21.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_token_owner_skips_guest_flow() {
    let app = TestApp::new();
    let created = place(&app, Some(USER_TOKEN), "ada@example.com").await;

    assert_eq!(app.identity().create_user_calls(), 0);
    assert_eq!(created.user_id, Some(Uuid::parse_str(TestApp::USER_ID).unwrap()));
}

#[tokio::test]
async fn test_bad_subject_is_400_without_guest() {
    let app = TestApp::new();
    app.identity().register_token("odd-token", "not-a-uuid");

    let response = app
        .client()
        .post("/api/order")
        .bearer_token("odd-token")
        .json(&order("ada@example.com"))
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.identity().create_user_calls(), 0);
    assert!(app.controller().calls("create_order").is_empty());

    let unknown = app
        .client()
        .post("/api/order")
        .bearer_token("no-such-token")
        .json(&order("ada@example.com"))
        .send()
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nil_subject_provisions_guest() {
    let app = TestApp::new();
    app.identity().register_token("nil-token", &Uuid::nil().to_string());

    place(&app, Some("nil-token"), "ada@example.com").await;
    assert_eq!(app.identity().create_user_calls(), 1);
}

#[tokio::test]
async fn test_guest_provisioning_failures() {
    let app = TestApp::new();

    app.identity().set_create_user_mode(CreateUserMode::Fail);
    let failed = app.client().post("/api/order").json(&order("a@example.com")).send().await;
    failed.assert_status(StatusCode::BAD_REQUEST);

    app.identity().set_create_user_mode(CreateUserMode::Malformed);
    let malformed = app.client().post("/api/order").json(&order("a@example.com")).send().await;
    malformed.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(malformed.error_message().unwrap(), "internal error");

    assert!(app.controller().calls("create_order").is_empty());
}

#[tokio::test]
async fn test_invalid_order_skips_identity_and_controller() {
    let app = TestApp::new();
    let response = app
        .client()
        .post("/api/order")
        .json(&json!({"full_name": "Ada", "email": "nope", "items": []}))
        .send()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.identity().create_user_calls(), 0);
    assert_eq!(app.controller().total_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_guests_get_distinct_orders() {
    let app = TestApp::new();
    let (first, second) = tokio::join!(
        place(&app, None, "one@example.com"),
        place(&app, None, "two@example.com"),
    );

    assert_ne!(first.id, second.id);
    assert_ne!(first.user_id, second.user_id);
    assert_eq!(app.identity().create_user_calls(), 2);
}

#[tokio::test]
async fn test_malformed_id_never_reaches_controller() {
    let app = TestApp::new();
    let client = app.client();

    for path in ["/api/order/abc", "/api/order/-1", "/api/order/12/x"] {
        client
            .get(path)
            .bearer_token(USER_TOKEN)
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        client
            .put(path)
            .bearer_token(USER_TOKEN)
            .json(&order("ada@example.com"))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        client
            .delete(path)
            .bearer_token(USER_TOKEN)
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.controller().total_calls(), 0);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = TestApp::new();
    let client = app.client();
    let created = place(&app, Some(USER_TOKEN), "ada@example.com").await;
    let path = format!("/api/order/{}", created.id);

    let fetched = client.get(&path).bearer_token(USER_TOKEN).send().await;
    fetched.assert_status(StatusCode::OK);
    assert_eq!(fetched.data::<Order>().unwrap().id, created.id);

    let updated = client
        .put(&path)
        .bearer_token(USER_TOKEN)
        .json(&order("lovelace@example.com"))
        .send()
        .await;
    updated.assert_status(StatusCode::OK);
    assert_eq!(updated.data::<String>().unwrap(), "OK");

    client
        .delete(&path)
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::OK);

    let after_cancel = client
        .put(&path)
        .bearer_token(USER_TOKEN)
        .json(&order("ada@example.com"))
        .send()
        .await;
    after_cancel.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(after_cancel.error_message().unwrap(), "internal error");
}

#[tokio::test]
async fn test_missing_order_is_404() {
    let app = TestApp::new();
    app.client()
        .get("/api/order/999")
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_orders() {
    let app = TestApp::new();
    place(&app, Some(USER_TOKEN), "ada@example.com").await;
    place(&app, None, "guest@example.com").await;

    let mine = app
        .client()
        .get("/api/order/me")
        .bearer_token(USER_TOKEN)
        .send()
        .await;
    mine.assert_status(StatusCode::OK);
    let orders: Vec<Order> = mine.data().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].email, "ada@example.com");

    app.client()
        .post("/api/order/me")
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_my_orders_with_bad_subject_is_401() {
    let app = TestApp::new();
    app.identity().register_token("odd-token", "not-a-uuid");

    app.client()
        .get("/api/order/me")
        .bearer_token("odd-token")
        .send()
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(app.controller().total_calls(), 0);
}

#[tokio::test]
async fn test_order_listing_needs_auth_and_switches_method() {
    let app = TestApp::new();
    let client = app.client();

    client.get("/api/order").send().await.assert_status(StatusCode::UNAUTHORIZED);
    client
        .get("/api/order/")
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::OK);
    client
        .put("/api/order")
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    client
        .post("/api/order/1")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_listing_filters_reach_controller() {
    let app = TestApp::new();
    place(&app, Some(USER_TOKEN), "ada@example.com").await;
    place(&app, Some(USER_TOKEN), "bob@example.com").await;

    let response = app
        .client()
        .get("/api/order?email=bob@example.com&page=1&size=5")
        .bearer_token(USER_TOKEN)
        .send()
        .await;
    response.assert_status(StatusCode::OK);
    let body = response.envelope().unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["email"], "bob@example.com");

    let calls = app.controller().calls("list_orders");
    assert_eq!((calls[0].page, calls[0].size), (Some(1), Some(5)));
}

#[tokio::test]
async fn test_listings_fall_back_to_default_paging() {
    let app = TestApp::new();
    place(&app, Some(USER_TOKEN), "ada@example.com").await;
    place(&app, Some(USER_TOKEN), "bob@example.com").await;

    let all = app
        .client()
        .get("/api/order?page=abc&size=x&sort=-id")
        .bearer_token(USER_TOKEN)
        .send()
        .await;
    all.assert_status(StatusCode::OK);
    let orders: Vec<Order> = all.data().unwrap();
    assert_eq!(orders[0].email, "bob@example.com");

    app.client()
        .get("/api/order/me?page=abc&size=x")
        .bearer_token(USER_TOKEN)
        .send()
        .await
        .assert_status(StatusCode::OK);

    let listed = app.controller().calls("list_orders");
    assert_eq!((listed[0].page, listed[0].size), (Some(1), Some(40)));
    assert_eq!(listed[0].sort.as_deref(), Some("-id"));
    let mine = app.controller().calls("list_user_orders");
    assert_eq!((mine[0].page, mine[0].size), (Some(1), Some(40)));
}

#[tokio::test]
async fn test_non_bearer_authorization_places_guest_order() {
    let app = TestApp::new();

    let response = app
        .client()
        .post("/api/order")
        .header("authorization", "Basic abc")
        .json(&order("ada@example.com"))
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(app.identity().create_user_calls(), 1);
    assert_eq!(app.identity().parse_claims_calls(), 0);
    let created: Order = response.data().unwrap();
    assert_eq!(created.user_id, app.identity().user_id("ada@example.com"));
}

#[tokio::test]
async fn test_create_order_conflict_surfaces() {
    let app = TestApp::new();
    app.controller()
        .fail("create_order", Failure::Kind(ErrorKind::AlreadyExists));

    app.client()
        .post("/api/order")
        .bearer_token(USER_TOKEN)
        .json(&order("ada@example.com"))
        .send()
        .await
        .assert_status(StatusCode::CONFLICT);
}
