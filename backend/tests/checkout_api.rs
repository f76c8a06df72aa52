use axum::http::{Method, StatusCode};
use bliss_backend::{models::user::UserRole, repositories::ProductRepository};
use serde_json::{json, Value};

mod support;

use support::{dec, decimal_field, test_app};

fn shipping_details() -> Value {
    json!({
        "shipping_address": "12 Rose Lane, Springfield",
        "delivery_time": "Weekdays 9am-12pm",
        "payment_method": "card",
        "card_holder": "Glow Buyer",
        "card_number": "4111 1111 1111 1111",
        "card_expiry": "12/30"
    })
}

#[tokio::test]
async fn register_cart_init_update_finalize_round_trip() {
    let app = test_app();
    let staff = app.seed_user("catalogue", UserRole::Staff, 0).await;
    let serum = app.seed_product(staff.id, "Vitamin C Serum", "24.00").await;
    let cream = app
        .seed_product_with_sizes(staff.id, "Night Cream", "30.00", &[("50ml", "30.00"), ("100ml", "52.50")])
        .await;
    let large = cream.sizes.iter().find(|s| s.size == "100ml").unwrap().id;

    let (status, body) = app
        .post(
            "/User/register",
            None,
            json!({
                "username": "glowbuyer",
                "email": "Glow@Example.com",
                "password": "Sunscreen-Daily-1"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/api/Cart/items",
            Some(&token),
            json!({ "product_id": serum.id, "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, cart) = app
        .post(
            "/api/Cart/items",
            Some(&token),
            json!({ "product_id": cream.id, "product_size_id": large }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(decimal_field(&cart, "subtotal"), dec("100.50"));

    // Prices move after the items were carted; the snapshot takes the new price.
    let mut repriced = app.repos.products.find_by_id(serum.id).await.unwrap().unwrap();
    repriced.price = dec("26.00");
    app.repos.products.update(&repriced).await.unwrap();

    let (status, transaction) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["is_finalized"], json!(false));
    let items = transaction["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let serum_line = items
        .iter()
        .find(|item| item["product_id"] == json!(serum.id))
        .unwrap();
    assert_eq!(decimal_field(serum_line, "price"), dec("26.00"));
    assert_eq!(serum_line["quantity"], json!(2));
    let cream_line = items
        .iter()
        .find(|item| item["product_id"] == json!(cream.id))
        .unwrap();
    assert_eq!(decimal_field(cream_line, "price"), dec("52.50"));
    assert_eq!(cream_line["product_name"], json!("Night Cream (100ml)"));

    let (status, updated) = app
        .put("/api/Transaction", Some(&token), shipping_details())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["shipping_address"], json!("12 Rose Lane, Springfield"));
    assert_eq!(updated["card_number"], json!("**** **** **** 1111"));
    assert!(!updated.to_string().contains("4111 1111"));

    let (status, finalized) = app
        .request(Method::POST, "/api/Transaction/finalize", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finalized["is_finalized"], json!(true));
    assert!(finalized["finalized_at"].is_string());

    let (status, cart) = app.get("/api/Cart", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (status, _) = app.get("/api/Transaction/current", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, history) = app.get("/api/Transaction", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn init_with_empty_cart_is_rejected_and_creates_nothing() {
    let app = test_app();
    let user = app.seed_user("emptycart", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cart is empty"));

    let (status, history) = app.get("/api/Transaction", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_init_replaces_the_open_transaction() {
    let app = test_app();
    let staff = app.seed_user("stock", UserRole::Staff, 0).await;
    let toner = app.seed_product(staff.id, "Toner", "12.00").await;
    let user = app.seed_user("twice", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    app.post("/api/Cart/items", Some(&token), json!({ "product_id": toner.id }))
        .await;
    let (_, first) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    let (status, second) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(first["id"], second["id"]);

    let (_, history) = app.get("/api/Transaction", Some(&token)).await;
    let open: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["is_finalized"] == json!(false))
        .collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["id"], second["id"]);
}

#[tokio::test]
async fn init_after_emptying_the_cart_discards_the_open_transaction() {
    let app = test_app();
    let staff = app.seed_user("shelf", UserRole::Staff, 0).await;
    let mask = app.seed_product(staff.id, "Clay Mask", "16.00").await;
    let user = app.seed_user("changedmind", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    let (_, cart) = app
        .post("/api/Cart/items", Some(&token), json!({ "product_id": mask.id }))
        .await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let (status, _) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.delete(&format!("/api/Cart/items/{}", item_id), Some(&token))
        .await;
    let (status, body) = app
        .request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cart is empty"));

    let (status, _) = app.get("/api/Transaction/current", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .request(Method::POST, "/api/Transaction/finalize", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, history) = app.get("/api/Transaction", Some(&token)).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_and_finalize_require_an_open_transaction() {
    let app = test_app();
    let user = app.seed_user("notyet", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .put("/api/Transaction", Some(&token), shipping_details())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("No open transaction"));

    let (status, _) = app
        .request(Method::POST, "/api/Transaction/finalize", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_rejects_invalid_card_number() {
    let app = test_app();
    let staff = app.seed_user("cards", UserRole::Staff, 0).await;
    let mask = app.seed_product(staff.id, "Clay Mask", "18.00").await;
    let user = app.seed_user("badcard", UserRole::Client, 0).await;
    let token = app.token_for(&user);
    app.post("/api/Cart/items", Some(&token), json!({ "product_id": mask.id }))
        .await;
    app.request(Method::POST, "/api/Transaction/init", Some(&token), None)
        .await;

    let mut details = shipping_details();
    details["card_number"] = json!("1234");
    let (status, body) = app.put("/api/Transaction", Some(&token), details).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let app = test_app();
    let staff = app.seed_user("shelf", UserRole::Staff, 0).await;
    let balm = app.seed_product(staff.id, "Lip Balm", "5.00").await;
    let alice = app.seed_user("alice", UserRole::Client, 0).await;
    let bob = app.seed_user("bob", UserRole::Client, 0).await;
    let alice_token = app.token_for(&alice);
    let bob_token = app.token_for(&bob);

    let (_, cart) = app
        .post("/api/Cart/items", Some(&alice_token), json!({ "product_id": balm.id }))
        .await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .put(
            &format!("/api/Cart/items/{}", item_id),
            Some(&bob_token),
            json!({ "quantity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .delete(&format!("/api/Cart/items/{}", item_id), Some(&bob_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, bob_cart) = app.get("/api/Cart", Some(&bob_token)).await;
    assert!(bob_cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn adding_the_same_line_twice_increments_quantity() {
    let app = test_app();
    let staff = app.seed_user("lines", UserRole::Staff, 0).await;
    let oil = app.seed_product(staff.id, "Cleansing Oil", "21.00").await;
    let user = app.seed_user("repeat", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    app.post("/api/Cart/items", Some(&token), json!({ "product_id": oil.id }))
        .await;
    let (_, cart) = app
        .post(
            "/api/Cart/items",
            Some(&token),
            json!({ "product_id": oil.id, "quantity": 2 }),
        )
        .await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(3));

    let item_id = items[0]["id"].as_i64().unwrap();
    let (status, cart) = app
        .put(
            &format!("/api/Cart/items/{}", item_id),
            Some(&token),
            json!({ "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], json!(1));

    let (status, cart) = app
        .delete(&format!("/api/Cart/items/{}", item_id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn adding_an_unknown_product_is_not_found() {
    let app = test_app();
    let user = app.seed_user("ghost", UserRole::Client, 0).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .post("/api/Cart/items", Some(&token), json!({ "product_id": 9999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Product not found"));
}
