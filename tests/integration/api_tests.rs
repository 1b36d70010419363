//! API integration tests
//!
//! Run against a live server started with a bootstrap administrator:
//!
//! ```sh
//! LIBRIS_AUTH__BOOTSTRAP_ADMIN_USERNAME=admin \
//! LIBRIS_AUTH__BOOTSTRAP_ADMIN_PASSWORD=change-me-1 cargo run
//! cargo test --test api_tests -- --ignored
//! ```

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "change-me-1";

async fn get_token(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/token", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send token request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse token response");
    body["access_token"].as_str().expect("No token in response").to_string()
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// A test world: an admin token, a fresh member and a fresh book
struct Fixture {
    client: Client,
    admin: String,
    member: String,
    member_name: String,
    book_id: String,
    book_title: String,
}

impl Fixture {
    async fn new(total_count: i32) -> Self {
        let client = Client::new();
        let admin = get_token(&client, ADMIN_USERNAME, ADMIN_PASSWORD).await;

        let member_name = unique("member");
        let response = client
            .post(format!("{}/users", BASE_URL))
            .bearer_auth(&admin)
            .json(&json!({ "username": member_name, "password": "password1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let member = get_token(&client, &member_name, "password1").await;

        let book_title = unique("book");
        let response = client
            .post(format!("{}/books", BASE_URL))
            .bearer_auth(&admin)
            .json(&json!({
                "title": book_title,
                "author": "Test Author",
                "category": "Testing",
                "total_count": total_count
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let book: Value = response.json().await.unwrap();

        Self {
            client,
            admin,
            member,
            member_name,
            book_id: book["id"].as_str().unwrap().to_string(),
            book_title,
        }
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}{}", BASE_URL, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .put(format!("{}{}", BASE_URL, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn available(&self) -> i64 {
        let response = self
            .client
            .get(format!("{}/books/{}", BASE_URL, self.book_id))
            .bearer_auth(&self.admin)
            .send()
            .await
            .unwrap();
        let book: Value = response.json().await.unwrap();
        book["available_count"].as_i64().unwrap()
    }

    async fn member_requests_loan(&self) -> Value {
        let (status, loan) = self
            .post(&self.member, "/loans", json!({ "book_title": self.book_title }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        loan
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_token_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/token", BASE_URL))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_member_loan_full_lifecycle() {
    let fx = Fixture::new(2).await;

    let loan = fx.member_requests_loan().await;
    assert_eq!(loan["status"], "PENDING");
    assert_eq!(loan["username"], fx.member_name.as_str());
    assert_eq!(fx.available().await, 2);

    let loan_id = loan["id"].as_str().unwrap();
    let (status, loan) = fx.put(&fx.admin, &format!("/loans/{}/approve", loan_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["status"], "APPROVED");
    assert_eq!(fx.available().await, 1);

    let (status, renewal) = fx
        .post(&fx.member, "/renewals", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(renewal["status"], "PENDING");

    let renewal_id = renewal["id"].as_str().unwrap();
    let (status, renewal) = fx
        .post(&fx.admin, &format!("/renewals/{}/approve", renewal_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewal["status"], "APPROVED");

    let (status, record) = fx
        .post(&fx.member, "/returns", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "PENDING");
    assert_eq!(fx.available().await, 1);

    let record_id = record["id"].as_str().unwrap();
    let (status, record) = fx
        .post(&fx.admin, &format!("/returns/{}/approve", record_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "APPROVED");
    assert_eq!(fx.available().await, 2);
}

#[tokio::test]
#[ignore]
async fn test_librarian_loan_is_approved_immediately() {
    let fx = Fixture::new(1).await;

    let (status, loan) = fx
        .post(
            &fx.admin,
            "/loans",
            json!({ "username": fx.member_name, "book_title": fx.book_title }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "APPROVED");
    assert_eq!(fx.available().await, 0);

    let (status, record) = fx
        .post(&fx.admin, "/returns", json!({ "loan_id": loan["id"] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "APPROVED");
    assert_eq!(fx.available().await, 1);
}

#[tokio::test]
#[ignore]
async fn test_approval_without_stock_is_rejected() {
    let fx = Fixture::new(1).await;

    let loan = fx.member_requests_loan().await;

    let (status, _) = fx
        .post(
            &fx.admin,
            "/loans",
            json!({ "username": ADMIN_USERNAME, "book_title": fx.book_title }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fx.available().await, 0);

    let (status, body) = fx
        .put(&fx.admin, &format!("/loans/{}/approve", loan["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "OutOfStock");
    assert_eq!(fx.available().await, 0);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_requests_conflict() {
    let fx = Fixture::new(3).await;

    let loan = fx.member_requests_loan().await;
    let (status, _) = fx
        .post(&fx.member, "/loans", json!({ "book_title": fx.book_title }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let loan_id = loan["id"].as_str().unwrap();
    fx.put(&fx.admin, &format!("/loans/{}/approve", loan_id)).await;

    let (status, _) = fx
        .post(&fx.member, "/renewals", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx
        .post(&fx.admin, "/renewals", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, _) = fx
        .post(&fx.member, "/returns", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = fx
        .post(&fx.member, "/returns", json!({ "loan_id": loan_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_touch_other_loans() {
    let fx = Fixture::new(2).await;

    let (status, loan) = fx
        .post(
            &fx.admin,
            "/loans",
            json!({ "username": ADMIN_USERNAME, "book_title": fx.book_title }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = fx
        .post(&fx.member, "/renewals", json!({ "loan_id": loan["id"] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx
        .post(&fx.member, "/returns", json!({ "loan_id": loan["id"] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The rejected return must not have closed the loan
    let response = fx
        .client
        .get(format!("{}/loans/{}", BASE_URL, loan["id"].as_str().unwrap()))
        .bearer_auth(&fx.admin)
        .send()
        .await
        .unwrap();
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "APPROVED");
}

#[tokio::test]
#[ignore]
async fn test_unknown_book_is_not_found() {
    let fx = Fixture::new(1).await;

    let (status, body) = fx
        .post(&fx.member, "/loans", json!({ "book_title": unique("missing") }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
#[ignore]
async fn test_loan_for_unknown_borrower_is_not_found() {
    let fx = Fixture::new(1).await;

    let (status, body) = fx
        .post(
            &fx.admin,
            "/loans",
            json!({ "username": unique("ghost"), "book_title": fx.book_title }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    assert_eq!(fx.available().await, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_approvals_never_oversell() {
    let fx = Fixture::new(1).await;

    let mut loan_ids = Vec::new();
    for _ in 0..4 {
        let name = unique("racer");
        fx.post(&fx.admin, "/users", json!({ "username": name, "password": "password1" }))
            .await;
        let token = get_token(&fx.client, &name, "password1").await;
        let (status, loan) = fx
            .post(&token, "/loans", json!({ "book_title": fx.book_title }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        loan_ids.push(loan["id"].as_str().unwrap().to_string());
    }

    let handles: Vec<_> = loan_ids
        .into_iter()
        .map(|id| {
            let client = fx.client.clone();
            let admin = fx.admin.clone();
            tokio::spawn(async move {
                client
                    .put(format!("{}/loans/{}/approve", BASE_URL, id))
                    .bearer_auth(admin)
                    .send()
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => approved += 1,
            status => assert_eq!(status, StatusCode::CONFLICT),
        }
    }

    assert_eq!(approved, 1);
    assert_eq!(fx.available().await, 0);
}
