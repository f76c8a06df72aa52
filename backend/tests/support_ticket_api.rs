use axum::http::StatusCode;
use bliss_backend::models::user::UserRole;
use serde_json::json;

mod support;

use support::test_app;

#[tokio::test]
async fn ticket_lifecycle_between_customer_and_staff() {
    let app = test_app();
    let customer = app.seed_user("customer", UserRole::Client, 0).await;
    let agent = app.seed_user("agent", UserRole::Staff, 0).await;
    let customer_token = app.token_for(&customer);
    let agent_token = app.token_for(&agent);

    let (status, ticket) = app
        .post(
            "/SupportTicket",
            Some(&customer_token),
            json!({ "title": "Damaged bottle", "description": "The pump arrived cracked" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["status"], json!("open"));
    let uri = format!("/SupportTicket/{}", ticket["id"]);

    // Customers cannot triage their own tickets.
    let (status, _) = app
        .put(&uri, Some(&customer_token), json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .put(
            &uri,
            Some(&agent_token),
            json!({ "status": "in_progress", "assigned_to": agent.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], json!("in_progress"));
    assert_eq!(updated["assigned_to"], json!(agent.id));

    let (status, _) = app
        .put(&uri, Some(&agent_token), json!({ "title": "Rewritten" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/Chat",
            Some(&customer_token),
            json!({ "ticket_id": ticket["id"], "message": "Any update?" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/Chat",
            Some(&agent_token),
            json!({ "ticket_id": ticket["id"], "message": "A replacement is on its way" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, chats) = app
        .get(&format!("/Chat?ticket_id={}", ticket["id"]), Some(&customer_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let chats = chats.as_array().unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0]["sender_id"], json!(customer.id));
    assert_eq!(chats[1]["sender_id"], json!(agent.id));

    app.put(&uri, Some(&agent_token), json!({ "status": "closed" }))
        .await;
    let (status, body) = app
        .post(
            "/Chat",
            Some(&customer_token),
            json!({ "ticket_id": ticket["id"], "message": "Thanks!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Ticket is closed"));
}

#[tokio::test]
async fn tickets_and_chats_are_hidden_from_other_customers() {
    let app = test_app();
    let owner = app.seed_user("owner", UserRole::Client, 0).await;
    let stranger = app.seed_user("stranger", UserRole::Client, 0).await;
    let staff = app.seed_user("desk", UserRole::Staff, 0).await;
    let owner_token = app.token_for(&owner);
    let stranger_token = app.token_for(&stranger);

    let (_, ticket) = app
        .post(
            "/SupportTicket",
            Some(&owner_token),
            json!({ "title": "Refund", "description": "Wrong shade" }),
        )
        .await;
    let uri = format!("/SupportTicket/{}", ticket["id"]);

    let (status, _) = app.get(&uri, Some(&stranger_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .get(&format!("/Chat?ticket_id={}", ticket["id"]), Some(&stranger_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post(
            "/Chat",
            Some(&stranger_token),
            json!({ "ticket_id": ticket["id"], "message": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, mine) = app.get("/SupportTicket", Some(&stranger_token)).await;
    assert!(mine.as_array().unwrap().is_empty());
    let (_, all) = app.get("/SupportTicket", Some(&app.token_for(&staff))).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    // Staff can read but only the owner or an admin may delete.
    let (status, _) = app.delete(&uri, Some(&app.token_for(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&owner_token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn tickets_can_only_be_assigned_to_staff() {
    let app = test_app();
    let owner = app.seed_user("asker", UserRole::Client, 0).await;
    let other_client = app.seed_user("bystander", UserRole::Client, 0).await;
    let admin = app.seed_user("chief", UserRole::Admin, 0).await;

    let (_, ticket) = app
        .post(
            "/SupportTicket",
            Some(&app.token_for(&owner)),
            json!({ "title": "Question", "description": "Is this vegan?" }),
        )
        .await;

    let (status, body) = app
        .put(
            &format!("/SupportTicket/{}", ticket["id"]),
            Some(&app.token_for(&admin)),
            json!({ "assigned_to": other_client.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Tickets can only be assigned to staff"));
}
