//! API integration tests
//!
//! Run against a live server started with a bootstrap staff account
//! `admin`/`admin` and the default JWT secret.

use chrono::{Duration, Local, Utc};
use locallibrary_server::models::UserClaims;
use reqwest::{header::LOCATION, redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn client() -> Client {
    // Redirects are asserted, not followed
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Helper to get a staff token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Token for an account without any permission
fn reader_token() -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "reader".into(),
        user_id: i32::MAX,
        is_staff: false,
        permissions: vec![],
        exp: now + 600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("No Location header")
        .to_string()
}

/// Trailing numeric id of a redirect target
fn id_from_location(location: &str) -> i64 {
    location
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("No id in Location")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
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
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_home_counts_visits_per_session() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let first: Value = client
        .get(BASE_URL)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(first["num_visits"], 0);
    assert!(first["num_books"].is_i64());

    let second: Value = client
        .get(BASE_URL)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_my_loans_redirects_anonymous_visitor() {
    let response = client()
        .get(format!("{}/loans/mine", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/api/v1/auth/login?next=%2Fapi%2Fv1%2Floans%2Fmine"
    );
}

#[tokio::test]
#[ignore]
async fn test_all_loans_requires_permission() {
    let client = client();

    let anonymous = client
        .get(format!("{}/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);

    let reader = client
        .get(format!("{}/loans", BASE_URL))
        .bearer_auth(reader_token())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(reader.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_admin_console_requires_staff() {
    let client = client();

    let anonymous = client
        .get(format!("{}/admin/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let reader = client
        .get(format!("{}/admin/books", BASE_URL))
        .bearer_auth(reader_token())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(reader.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_author_create_delete_then_not_found() {
    let client = client();
    let token = get_auth_token(&client).await;

    let blank: Value = client
        .get(format!("{}/authors/create", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(blank["form"]["date_of_death"], "2018-11-11");

    let invalid = client
        .post(format!("{}/authors/create", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "",
            "last_name": "Le Guin",
            "date_of_birth": null,
            "date_of_death": null
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(invalid.status(), StatusCode::OK);
    let body: Value = invalid.json().await.expect("Failed to parse response");
    assert!(body["errors"]["first_name"].is_array());

    let created = client
        .post(format!("{}/authors/create", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Ursula",
            "last_name": "Le Guin",
            "date_of_birth": "1929-10-21",
            "date_of_death": "2018-01-22"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let author_url = location(&created);
    let author_id = id_from_location(&author_url);

    let detail = client
        .get(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(detail.status(), StatusCode::OK);

    let deleted = client
        .post(format!("{}/authors/{}/delete", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&deleted), "/api/v1/authors");

    let gone = client
        .get(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_renew_flow_and_loan_ordering() {
    let client = client();
    let token = get_auth_token(&client).await;
    let today = Local::now().date_naive();

    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let user_id = me["id"].as_i64().expect("No user id");

    let created = client
        .post(format!("{}/books/create", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "The Dispossessed",
            "author_id": null,
            "summary": "",
            "isbn": "9780061054884",
            "language_id": null,
            "genre_ids": []
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let book_id = id_from_location(&location(&created));

    // Two loans, the later one created first
    let mut copies = Vec::new();
    for offset in [10, 2] {
        let copy: Value = client
            .post(format!("{}/admin/bookinstances", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({
                "book_id": book_id,
                "imprint": "Harper, 1974",
                "status": "on_loan",
                "due_back": (today + Duration::days(offset)).to_string(),
                "borrower_id": user_id
            }))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        copies.push(copy["id"].as_str().expect("No copy id").to_string());
    }

    let mine: Value = client
        .get(format!("{}/loans/mine", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let dates: Vec<&str> = mine["items"]
        .as_array()
        .expect("No items")
        .iter()
        .filter_map(|l| l["due_back"].as_str())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let renew_url = format!("{}/bookinstances/{}/renew", BASE_URL, copies[0]);

    let form: Value = client
        .get(&renew_url)
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(form["renewal_date"], (today + Duration::weeks(3)).to_string());

    let past = client
        .post(&renew_url)
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": (today - Duration::days(1)).to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(past.status(), StatusCode::OK);
    let body: Value = past.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"]["renewal_date"][0], "Invalid date - renewal in past");

    let renewed_until = (today + Duration::weeks(3)).to_string();
    let renewed = client
        .post(&renew_url)
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": renewed_until }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(renewed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&renewed), "/api/v1/loans");

    let detail: Value = client
        .get(format!("{}/admin/bookinstances/{}", BASE_URL, copies[0]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(detail["availability"]["due_back"], renewed_until);

    // A book with copies cannot be deleted
    let refused = client
        .post(format!("{}/books/{}/delete", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(refused.status(), StatusCode::CONFLICT);

    for copy in &copies {
        let response = client
            .delete(format!("{}/admin/bookinstances/{}", BASE_URL, copy))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let deleted = client
        .post(format!("{}/books/{}/delete", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
}
