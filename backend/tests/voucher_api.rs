use axum::http::{Method, StatusCode};
use bliss_backend::{
    models::{user::UserRole, voucher::VoucherStatus},
    repositories::{UserRepository, VoucherRepository},
};
use serde_json::json;

mod support;

use support::test_app;

#[tokio::test]
async fn redeeming_the_last_unit_marks_voucher_redeemed_and_deducts_points() {
    let app = test_app();
    let voucher = app.seed_voucher("Glow Gift Card", 40, 1).await;
    let user = app.seed_user("collector", UserRole::Client, 100).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/Voucher/{}/redeem", voucher.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["voucher"]["quantity"], json!(0));
    assert_eq!(body["voucher"]["status"], json!("redeemed"));
    assert_eq!(body["remaining_points"], json!(60));
    let code = body["user_voucher"]["code"].as_str().unwrap();
    assert_eq!(code.len(), 5);
    assert!(code[..2].chars().all(|c| c.is_ascii_uppercase()));
    assert!(code[2..].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(body["user_voucher"]["is_used"], json!(false));

    let stored = app.repos.vouchers.find_by_id(voucher.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 0);
    assert_eq!(stored.status, VoucherStatus::Redeemed);
    let stored_user = app.repos.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored_user.reward_points, 60);

    let (_, claims) = app.get("/UserVoucher", Some(&token)).await;
    assert_eq!(claims.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn redeeming_a_sold_out_voucher_is_rejected() {
    let app = test_app();
    let voucher = app.seed_voucher("Sold Out", 10, 0).await;
    let user = app.seed_user("latecomer", UserRole::Client, 100).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/Voucher/{}/redeem", voucher.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Voucher is fully redeemed"));

    let stored_user = app.repos.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored_user.reward_points, 100);
}

#[tokio::test]
async fn redeeming_without_enough_points_is_rejected() {
    let app = test_app();
    let voucher = app.seed_voucher("Pricey", 500, 3).await;
    let user = app.seed_user("saver", UserRole::Client, 20).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/Voucher/{}/redeem", voucher.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Insufficient reward points"));

    let stored = app.repos.vouchers.find_by_id(voucher.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 3);
}

#[tokio::test]
async fn redeeming_unknown_voucher_is_not_found() {
    let app = test_app();
    let user = app.seed_user("lost", UserRole::Client, 100).await;
    let token = app.token_for(&user);

    let (status, _) = app
        .request(Method::POST, "/Voucher/4242/redeem", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_redemptions_issue_distinct_codes() {
    let app = test_app();
    let voucher = app.seed_voucher("Bulk", 1, 10).await;
    let user = app.seed_user("hoarder", UserRole::Client, 10).await;
    let token = app.token_for(&user);

    let mut codes = Vec::new();
    for _ in 0..5 {
        let (status, body) = app
            .request(
                Method::POST,
                &format!("/Voucher/{}/redeem", voucher.id),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        codes.push(body["user_voucher"]["code"].as_str().unwrap().to_string());
    }
    let mut unique = codes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), codes.len());
}

#[tokio::test]
async fn claims_are_private_and_single_use() {
    let app = test_app();
    let voucher = app.seed_voucher("Single Use", 5, 5).await;
    let owner = app.seed_user("owner", UserRole::Client, 50).await;
    let other = app.seed_user("snoop", UserRole::Client, 0).await;
    let owner_token = app.token_for(&owner);
    let other_token = app.token_for(&other);

    let (_, body) = app
        .request(
            Method::POST,
            &format!("/Voucher/{}/redeem", voucher.id),
            Some(&owner_token),
            None,
        )
        .await;
    let claim_id = body["user_voucher"]["id"].as_i64().unwrap();

    let (status, _) = app
        .get(&format!("/UserVoucher/{}", claim_id), Some(&other_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, used) = app
        .request(
            Method::POST,
            &format!("/UserVoucher/{}/use", claim_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(used["is_used"], json!(true));

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/UserVoucher/{}/use", claim_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Voucher has already been used"));
}

#[tokio::test]
async fn voucher_management_is_staff_only_but_listing_is_public() {
    let app = test_app();
    let client = app.seed_user("shopper", UserRole::Client, 0).await;
    let staff = app.seed_user("merch", UserRole::Staff, 0).await;
    let payload = json!({
        "name": "Free Sample",
        "description": "A travel-size cleanser",
        "kind": "item",
        "item_name": "Travel Cleanser",
        "cost": 15,
        "quantity": 25,
        "valid_from": "2020-01-01T00:00:00Z",
        "valid_till": "2099-01-01T00:00:00Z"
    });

    let (status, _) = app
        .post("/Voucher", Some(&app.token_for(&client)), payload.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .post("/Voucher", Some(&app.token_for(&staff)), payload)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["kind"], json!("item"));
    assert_eq!(created["status"], json!("active"));

    let (status, listed) = app.get("/Voucher?search=sample", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .get(&format!("/Voucher/{}", created["id"]), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn inverted_validity_window_is_rejected() {
    let app = test_app();
    let staff = app.seed_user("planner", UserRole::Staff, 0).await;

    let (status, _) = app
        .post(
            "/Voucher",
            Some(&app.token_for(&staff)),
            json!({
                "name": "Backwards",
                "kind": "discount",
                "percent": "10",
                "cost": 5,
                "quantity": 5,
                "valid_from": "2030-01-01T00:00:00Z",
                "valid_till": "2029-01-01T00:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
