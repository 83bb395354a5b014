use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use gavel_api::auth::{AppState, AppStateInner};
use gavel_api::clock::FixedClock;
use gavel_api::routes::api_router;
use gavel_db::Database;

/// 2026-01-01T00:00:00Z — every server in this suite runs with its clock
/// pinned here.
const NOW: i64 = 1_767_225_600;

fn now() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(NOW, 0).unwrap()
}

async fn spawn_server() -> (SocketAddr, Client) {
    let db = Database::open_in_memory().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db,
        clock: Arc::new(FixedClock(now())),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api_router(state)).await.unwrap();
    });

    (addr, Client::new())
}

async fn register(client: &Client, addr: SocketAddr, username: &str) -> Value {
    let res = client
        .post(format!("http://{addr}/api/auth/register/"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "pw123456",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_item(
    client: &Client,
    addr: SocketAddr,
    token: &str,
    title: &str,
    starting_bid: &str,
    ends_in_secs: i64,
) -> Value {
    let end_time = (now() + Duration::seconds(ends_in_secs)).to_rfc3339();
    let res = client
        .post(format!("http://{addr}/api/items/"))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "starting_bid": starting_bid,
            "end_time": end_time,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn register_then_login_reuses_the_token() {
    let (addr, client) = spawn_server().await;

    let body = register(&client, addr, "alice").await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["profile"]["username"], "alice");

    // Second registration under the same username is refused outright.
    let res = client
        .post(format!("http://{addr}/api/auth/register/"))
        .json(&json!({"username": "alice", "email": "a@b.c", "password": "other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "Username already exists");

    // Logging in hands back the registration token, not a fresh one.
    for _ in 0..2 {
        let res = client
            .post(format!("http://{addr}/api/auth/login/"))
            .json(&json!({"username": "alice", "password": "pw123456"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["token"].as_str().unwrap(), token);
        assert_eq!(body["profile"]["username"], "alice");
    }

    let res = client
        .post(format!("http://{addr}/api/auth/login/"))
        .json(&json!({"username": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("http://{addr}/api/auth/login/"))
        .json(&json!({"username": "alice", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_requires_a_token() {
    let (addr, client) = spawn_server().await;

    let res = client
        .get(format!("http://{addr}/api/auth/user/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = register(&client, addr, "alice").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .get(format!("http://{addr}/api/auth/user/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["profile"]["username"], "alice");

    let res = client
        .get(format!("http://{addr}/api/auth/user/"))
        .bearer_auth("0000000000000000000000000000000000000000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bidding_on_a_vase() {
    let (addr, client) = spawn_server().await;

    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;
    let alice_token = alice["token"].as_str().unwrap();
    let bob_token = bob["token"].as_str().unwrap();

    let item = create_item(&client, addr, alice_token, "Vase", "10.00", 3600).await;
    let item_id = item["id"].as_str().unwrap();
    assert_eq!(item["current_bid"], "10.00");
    assert_eq!(item["num_bids"], 0);
    assert_eq!(item["time_left"], "1:00:00");
    assert_eq!(item["owner"]["username"], "alice");

    let res = client
        .post(format!("http://{addr}/api/bids/"))
        .bearer_auth(bob_token)
        .json(&json!({"item_id": item_id, "bid_amount": "15.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let bid: Value = res.json().await.unwrap();
    assert_eq!(bid["bid_amount"], "15.00");
    assert_eq!(bid["bidder"]["username"], "bob");
    assert_eq!(bid["item"]["current_bid"], "15.00");

    let res = client
        .get(format!("http://{addr}/api/item/{item_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let detail: Value = res.json().await.unwrap();
    assert_eq!(detail["current_bid"], "15.00");
    assert_eq!(detail["num_bids"], 1);
    assert_ne!(detail["time_left"], "Ended");

    // Lower and equal amounts are accepted as-is; the max still wins.
    let res = client
        .post(format!("http://{addr}/api/bids/"))
        .bearer_auth(bob_token)
        .json(&json!({"item_id": item_id, "bid_amount": "3.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("http://{addr}/api/item/{item_id}/bids/"))
        .send()
        .await
        .unwrap();
    let bids: Value = res.json().await.unwrap();
    assert_eq!(bids.as_array().unwrap().len(), 2);

    let detail: Value = client
        .get(format!("http://{addr}/api/item/{item_id}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["current_bid"], "15.00");
    assert_eq!(detail["num_bids"], 2);
}

#[tokio::test]
async fn bids_reject_unknown_items_and_anonymous_bidders() {
    let (addr, client) = spawn_server().await;
    let alice = register(&client, addr, "alice").await;
    let token = alice["token"].as_str().unwrap();
    let profile_id = alice["profile"]["id"].as_str().unwrap();

    let item = create_item(&client, addr, token, "Vase", "10.00", 3600).await;
    let item_id = item["id"].as_str().unwrap();

    let res = client
        .post(format!("http://{addr}/api/bids/"))
        .bearer_auth(token)
        .json(&json!({
            "item_id": "00000000-0000-0000-0000-000000000001",
            "bid_amount": "5.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // No token and no bidder_id: nothing resolves the acting profile.
    let res = client
        .post(format!("http://{addr}/api/bids/"))
        .json(&json!({"item_id": item_id, "bid_amount": "5.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // An explicit bidder_id works without any token.
    let res = client
        .post(format!("http://{addr}/api/bids/"))
        .json(&json!({"item_id": item_id, "bidder_id": profile_id, "bid_amount": "5.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn ending_soon_keeps_only_the_next_day() {
    let (addr, client) = spawn_server().await;
    let token = register(&client, addr, "alice").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    create_item(&client, addr, &token, "closing", "1.00", 2 * 3600).await;
    create_item(&client, addr, &token, "later", "1.00", 30 * 3600).await;
    create_item(&client, addr, &token, "done", "1.00", -3600).await;

    let res = client
        .get(format!("http://{addr}/api/items/ending-soon/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let soon: Value = res.json().await.unwrap();
    let soon = soon.as_array().unwrap();
    assert_eq!(soon.len(), 1);
    assert_eq!(soon[0]["title"], "closing");

    // Featured excludes the ended auction and honors the page-size cap.
    let featured: Value = client
        .get(format!("http://{addr}/api/items/featured/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(featured.as_array().unwrap().len(), 2);

    let capped: Value = client
        .get(format!("http://{addr}/api/items/featured/?limit=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(capped.as_array().unwrap().len(), 1);

    let done: Value = client
        .get(format!("http://{addr}/api/items/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ended = done
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["title"] == "done")
        .unwrap();
    assert_eq!(ended["time_left"], "Ended");
}

#[tokio::test]
async fn review_ratings_are_bounded_choices() {
    let (addr, client) = spawn_server().await;
    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;
    let alice_profile = alice["profile"]["id"].as_str().unwrap();
    let bob_token = bob["token"].as_str().unwrap();

    for bad in [0, 6, -1] {
        let res = client
            .post(format!("http://{addr}/api/reviews/"))
            .bearer_auth(bob_token)
            .json(&json!({
                "reviewed_profile_id": alice_profile,
                "numerical_rating": bad,
                "feedback": "??",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "rating {bad} accepted");
    }

    for good in [4, 5] {
        let res = client
            .post(format!("http://{addr}/api/reviews/"))
            .bearer_auth(bob_token)
            .json(&json!({
                "reviewed_profile_id": alice_profile,
                "numerical_rating": good,
                "feedback": "smooth sale",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Repeat reviews of the same seller are allowed; the average reflects
    // all of them.
    let profile: Value = client
        .get(format!("http://{addr}/api/profile/{alice_profile}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["average_rating"], 4.5);

    let reviews: Value = client
        .get(format!("http://{addr}/api/profile/{alice_profile}/reviews/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn item_mutation_is_owner_only() {
    let (addr, client) = spawn_server().await;
    let alice_token = register(&client, addr, "alice").await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_token = register(&client, addr, "bob").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let item = create_item(&client, addr, &alice_token, "Vase", "10.00", 3600).await;
    let item_id = item["id"].as_str().unwrap();

    // No token at all: unauthenticated.
    let res = client
        .patch(format!("http://{addr}/api/item/{item_id}/"))
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Another profile: outside the ownership scope, reads as missing.
    let res = client
        .patch(format!("http://{addr}/api/item/{item_id}/"))
        .bearer_auth(&bob_token)
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(format!("http://{addr}/api/item/{item_id}/"))
        .bearer_auth(&alice_token)
        .json(&json!({"title": "Blue Vase"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Blue Vase");
    assert_eq!(updated["starting_bid"], "10.00");

    let res = client
        .delete(format!("http://{addr}/api/item/{item_id}/"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("http://{addr}/api/item/{item_id}/"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("http://{addr}/api/item/{item_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_mutation_is_open_to_anyone() {
    let (addr, client) = spawn_server().await;
    let alice_token = register(&client, addr, "alice").await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_token = register(&client, addr, "bob").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let item = create_item(&client, addr, &alice_token, "Vase", "10.00", 3600).await;
    let item_id = item["id"].as_str().unwrap();

    let res = client
        .post(format!("http://{addr}/api/comments/"))
        .bearer_auth(&bob_token)
        .json(&json!({"item_id": item_id, "text": "is it chipped?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment: Value = res.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();
    assert_eq!(comment["profile"]["username"], "bob");
    assert_eq!(comment["item"]["title"], "Vase");

    // No token, not the author: the generic endpoint mutates it anyway.
    let res = client
        .patch(format!("http://{addr}/api/comment/{comment_id}/"))
        .json(&json!({"text": "edited by a stranger"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let edited: Value = res.json().await.unwrap();
    assert_eq!(edited["text"], "edited by a stranger");

    let listing: Value = client
        .get(format!("http://{addr}/api/item/{item_id}/comments/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let res = client
        .delete(format!("http://{addr}/api/comment/{comment_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("http://{addr}/api/comment/{comment_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_detail_and_items_listing() {
    let (addr, client) = spawn_server().await;
    let alice = register(&client, addr, "alice").await;
    let token = alice["token"].as_str().unwrap();
    let profile_id = alice["profile"]["id"].as_str().unwrap();

    create_item(&client, addr, token, "Vase", "10.00", 3600).await;
    create_item(&client, addr, token, "Lamp", "4.00", 7200).await;

    let items: Value = client
        .get(format!("http://{addr}/api/profile/{profile_id}/items/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.as_array().unwrap().len(), 2);

    let res = client
        .get(format!(
            "http://{addr}/api/profile/00000000-0000-0000-0000-000000000009/items/"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Open partial update refreshes the profile without touching other
    // fields.
    let res = client
        .patch(format!("http://{addr}/api/profile/{profile_id}/"))
        .json(&json!({"bio_text": "potter"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["bio_text"], "potter");
    assert_eq!(updated["username"], "alice");
    assert_eq!(updated["user"]["username"], "alice");
}
