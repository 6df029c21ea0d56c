//! Integration tests: the full router driven in-process against the
//! in-memory adapters.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use api_lib::adapters::memory::{InMemoryStorage, InMemoryStore};
use api_lib::config::Config;
use api_lib::web::state::AppState;
use gramseva_core::catalog::ServiceCategory;
use gramseva_core::domain::{NewProfile, NewProvider, NewReview, UserRole};
use gramseva_core::ports::StoreService;

fn test_app() -> (Router, InMemoryStore, InMemoryStorage) {
    let store = InMemoryStore::new();
    let storage = InMemoryStorage::new();
    let state = Arc::new(AppState::new(
        Arc::new(store.clone()),
        Arc::new(storage.clone()),
        Config::for_tests(),
    ));
    (api_lib::web::app_router(state), store, storage)
}

async fn body_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response.into_body()).await)
}

/// Signs a user up over HTTP and returns (user_id, session cookie).
async fn signup(app: &Router, email: &str, phone: &str, role: &str) -> (Uuid, String) {
    let body = json!({
        "email": email,
        "password": "secret123",
        "full_name": format!("User {phone}"),
        "phone": phone,
        "role": role,
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/signup", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let profile = body_json(response.into_body()).await;
    let user_id = profile["id"].as_str().unwrap().parse().unwrap();
    (user_id, cookie)
}

fn new_provider(category: ServiceCategory) -> NewProvider {
    NewProvider {
        service_category: category,
        specific_services: vec!["Plumbing".to_string()],
        experience_years: 3,
        price_min: Some(200),
        price_max: Some(800),
        service_area: vec!["Rampur".to_string()],
        about: Some("Reliable work".to_string()),
        profile_photo_url: None,
        work_photos: vec![],
        aadhaar_number: None,
        is_available: true,
    }
}

/// Seeds an owner profile and provider record directly through the store.
async fn seed_provider(store: &InMemoryStore, n: usize, payload: NewProvider) -> (Uuid, Uuid) {
    let profile = store
        .create_user(
            &format!("owner{n}@example.com"),
            "not-a-real-hash",
            NewProfile {
                full_name: format!("Owner {n}"),
                phone: format!("90000000{n:02}"),
                whatsapp_number: None,
                village: Some("Rampur".to_string()),
                block: None,
                district: None,
                role: UserRole::Provider,
            },
        )
        .await
        .unwrap();
    let provider = store.create_provider(profile.id, payload).await.unwrap();
    (profile.id, provider.id)
}

//=========================================================================================
// Directory
//=========================================================================================

#[tokio::test]
async fn directory_filters_by_category_and_availability() {
    let (app, store, _) = test_app();
    seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    seed_provider(&store, 2, new_provider(ServiceCategory::Agriculture)).await;
    let mut off = new_provider(ServiceCategory::HomeRepair);
    off.is_available = false;
    seed_provider(&store, 3, off).await;

    let (status, body) =
        send(&app, get_request("/providers?category=home_repair&available=true", None)).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["service_category"], "home_repair");
    assert_eq!(providers[0]["profile"]["full_name"], "Owner 1");
}

#[tokio::test]
async fn directory_paginates_with_ceiling_total_pages() {
    let (app, store, _) = test_app();
    let mut seeded = Vec::new();
    for n in 0..25 {
        let (_, id) = seed_provider(&store, n, new_provider(ServiceCategory::HomeRepair)).await;
        seeded.push(id.to_string());
    }

    // All rating_avg are equal, so the stable rating sort keeps insertion
    // order and page 2 holds items 13..=24.
    let (status, body) = send(&app, get_request("/providers?page=2&limit=12", None)).await;
    assert_eq!(status, StatusCode::OK);
    let page_ids: Vec<&str> = body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(page_ids, seeded[12..24].iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 12);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["totalPages"], 3);

    // The last page holds the remainder.
    let (_, body) = send(&app, get_request("/providers?page=3&limit=12", None)).await;
    assert_eq!(body["providers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn directory_sorts_by_rating_descending_by_default() {
    let (app, store, _) = test_app();
    let (_, low) = seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, high) = seed_provider(&store, 2, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, mid) = seed_provider(&store, 3, new_provider(ServiceCategory::HomeRepair)).await;
    let (reviewer, _) = seed_provider(&store, 4, new_provider(ServiceCategory::Agriculture)).await;
    for (provider_id, rating) in [(low, 2), (high, 5), (mid, 4)] {
        store
            .create_review(NewReview {
                customer_id: reviewer,
                provider_id,
                lead_id: None,
                rating,
                comment: None,
            })
            .await
            .unwrap();
    }

    let (_, body) = send(&app, get_request("/providers?category=home_repair", None)).await;
    let ratings: Vec<f64> = body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["rating_avg"].as_f64().unwrap())
        .collect();
    assert_eq!(ratings, vec![5.0, 4.0, 2.0]);
}

#[tokio::test]
async fn unknown_sort_key_preserves_store_order() {
    let (app, store, _) = test_app();
    let (_, first) = seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, second) = seed_provider(&store, 2, new_provider(ServiceCategory::HomeRepair)).await;

    let (status, body) = send(&app, get_request("/providers?sort=cheapest", None)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![first.to_string(), second.to_string()]);
}

#[tokio::test]
async fn malformed_page_params_fall_back_to_defaults() {
    let (app, store, _) = test_app();
    seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;

    let (status, body) = send(&app, get_request("/providers?page=zero&limit=-5", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 12);
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let (app, _, _) = test_app();
    let (status, body) = send(&app, get_request("/providers?category=astrology", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("astrology"));
}

//=========================================================================================
// Provider records
//=========================================================================================

#[tokio::test]
async fn provider_detail_counts_each_fetch_as_a_view() {
    let (app, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;

    let (status, body) = send(&app, get_request(&format!("/providers/{provider_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    // The body carries the pre-increment count.
    assert_eq!(body["provider"]["view_count"], 0);

    let (_, body) = send(&app, get_request(&format!("/providers/{provider_id}"), None)).await;
    assert_eq!(body["provider"]["view_count"], 1);
}

#[tokio::test]
async fn concurrent_views_are_never_lost() {
    let (_, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.increment_view_count(provider_id).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let provider = store.get_provider(provider_id).await.unwrap();
    assert_eq!(provider.view_count, 25);
}

#[tokio::test]
async fn unknown_provider_detail_is_404() {
    let (app, _, _) = test_app();
    let (status, body) =
        send(&app, get_request(&format!("/providers/{}", Uuid::new_v4()), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn owner_can_update_allow_listed_fields() {
    let (app, store, _) = test_app();
    let (_, cookie) = signup(&app, "owner@example.com", "9876543210", "provider").await;
    // Bind the record to the signed-up user through the HTTP surface.
    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/providers",
            Some(&cookie),
            &json!({
                "service_category": "home_repair",
                "service_area": "Rampur, Sitapur",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let provider_id = created["provider"]["id"].as_str().unwrap();
    // Comma-separated service areas are split and trimmed.
    assert_eq!(
        created["provider"]["service_area"],
        json!(["Rampur", "Sitapur"])
    );
    // Defaults apply for omitted fields.
    assert_eq!(created["provider"]["experience_years"], 0);
    assert_eq!(created["provider"]["is_available"], true);

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/providers/{provider_id}"),
            Some(&cookie),
            &json!({ "about": "New description", "price_min": 150 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["provider"]["about"], "New description");
    assert_eq!(updated["provider"]["price_min"], 150);

    let row = store
        .get_provider(provider_id.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(row.about.as_deref(), Some("New description"));
}

#[tokio::test]
async fn non_owner_update_is_forbidden_and_row_unchanged() {
    let (app, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, intruder_cookie) = signup(&app, "other@example.com", "9876543211", "customer").await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/providers/{provider_id}"),
            Some(&intruder_cookie),
            &json!({ "about": "hijacked" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let row = store.get_provider(provider_id).await.unwrap();
    assert_eq!(row.about.as_deref(), Some("Reliable work"));
}

//=========================================================================================
// Reviews
//=========================================================================================

#[tokio::test]
async fn concurrent_reviews_keep_the_aggregate_consistent() {
    let (_, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (customer_id, _) =
        seed_provider(&store, 2, new_provider(ServiceCategory::Agriculture)).await;

    // Many writers racing on the same provider: the count must equal the
    // true row count and the mean must match, whatever the interleaving.
    let ratings = [5, 4, 3, 5, 4, 3, 5, 4, 3, 2, 1, 1];
    let mut handles = Vec::new();
    for rating in ratings {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_review(NewReview {
                    customer_id,
                    provider_id,
                    lead_id: None,
                    rating,
                    comment: None,
                })
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let expected_avg = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
    let provider = store.get_provider(provider_id).await.unwrap();
    assert_eq!(provider.rating_count, ratings.len() as i64);
    assert!((provider.rating_avg - expected_avg).abs() < f64::EPSILON);
    assert_eq!(
        store
            .reviews_for_provider(provider_id)
            .await
            .unwrap()
            .len(),
        ratings.len()
    );
}

#[tokio::test]
async fn review_rating_out_of_range_is_rejected() {
    let (app, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, cookie) = signup(&app, "reviewer@example.com", "9876543212", "customer").await;

    for rating in [0, 6] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/reviews",
                Some(&cookie),
                &json!({ "provider_id": provider_id, "rating": rating }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("between 1 and 5"));
    }
}

#[tokio::test]
async fn review_listing_requires_provider_id() {
    let (app, _, _) = test_app();
    let (status, body) = send(&app, get_request("/reviews", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("provider_id"));
}

#[tokio::test]
async fn reviews_list_newest_first_with_author_names() {
    let (app, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, cookie) = signup(&app, "reviewer@example.com", "9876543212", "customer").await;

    for (rating, comment) in [(5, "great"), (3, "okay")] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/reviews",
                Some(&cookie),
                &json!({ "provider_id": provider_id, "rating": rating, "comment": comment }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) =
        send(&app, get_request(&format!("/reviews?provider_id={provider_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["author_name"], "User 9876543212");
    // Aggregate reflects both rows.
    let provider = store.get_provider(provider_id).await.unwrap();
    assert_eq!(provider.rating_count, 2);
    assert!((provider.rating_avg - 4.0).abs() < f64::EPSILON);
}

//=========================================================================================
// Contacts
//=========================================================================================

#[tokio::test]
async fn repeat_contacts_are_distinct_and_visible_to_both_parties() {
    let (app, store, _) = test_app();
    let (owner_id, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, customer_cookie) = signup(&app, "cust@example.com", "9876543213", "customer").await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/contacts",
                Some(&customer_cookie),
                &json!({ "provider_id": provider_id, "service_type": "Plumbing" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contact"]["status"], "new");
        // Method defaults to whatsapp when omitted.
        assert_eq!(body["contact"]["contact_method"], "whatsapp");
    }

    // Customer side: outreach with the provider summary.
    let (status, body) = send(&app, get_request("/contacts", Some(&customer_cookie))).await;
    assert_eq!(status, StatusCode::OK);
    let outreach = body["contacts"].as_array().unwrap();
    assert_eq!(outreach.len(), 2);
    assert_eq!(outreach[0]["provider"]["full_name"], "Owner 1");

    // Provider side: leads keyed by the provider record, with customer
    // public fields.
    let leads = store.leads_for_provider(provider_id).await.unwrap();
    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].customer.full_name, "User 9876543213");
    assert_ne!(leads[0].contact.id, leads[1].contact.id);
    // The owner's user id never matches lead rows directly.
    assert!(store.leads_for_provider(owner_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn provider_without_record_has_no_leads() {
    let (app, _, _) = test_app();
    let (_, cookie) = signup(&app, "newprov@example.com", "9876543214", "provider").await;

    let (status, body) = send(&app, get_request("/contacts", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contacts"], json!([]));
}

//=========================================================================================
// Saved providers
//=========================================================================================

#[tokio::test]
async fn saving_is_idempotent_and_removal_is_tolerant() {
    let (app, store, _) = test_app();
    let (_, provider_id) =
        seed_provider(&store, 1, new_provider(ServiceCategory::HomeRepair)).await;
    let (_, cookie) = signup(&app, "saver@example.com", "9876543215", "customer").await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/saved",
                Some(&cookie),
                &json!({ "provider_id": provider_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, body) = send(&app, get_request("/saved", Some(&cookie))).await;
    assert_eq!(body["providers"].as_array().unwrap().len(), 1);

    // Removing an absent pair still succeeds.
    for _ in 0..2 {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/saved/{provider_id}"))
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, body) = send(&app, get_request("/saved", Some(&cookie))).await;
    assert_eq!(body["providers"], json!([]));
}

#[tokio::test]
async fn zero_saved_returns_an_empty_list() {
    let (app, _, _) = test_app();
    let (_, cookie) = signup(&app, "empty@example.com", "9876543216", "customer").await;
    let (status, body) = send(&app, get_request("/saved", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providers"], json!([]));
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn protected_routes_reject_missing_sessions() {
    let (app, _, _) = test_app();
    for request in [
        json_request("POST", "/reviews", None, &json!({"provider_id": Uuid::new_v4(), "rating": 5})),
        json_request("POST", "/contacts", None, &json!({})),
        get_request("/saved", None),
        get_request("/contacts", None),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn signup_then_login_opens_a_fresh_session() {
    let (app, _, _) = test_app();
    signup(&app, "person@example.com", "9876543217", "customer").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "email": "person@example.com", "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // The fresh session works against a protected route.
    let (status, _) = send(&app, get_request("/saved", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);

    // Wrong password is a non-identifying 401.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "email": "person@example.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn phone_only_login_gets_guidance() {
    let (app, _, _) = test_app();
    signup(&app, "person@example.com", "9876543218", "customer").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/auth/login", None, &json!({ "phone": "9876543218" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn session_lookup_reports_the_signed_in_profile_or_null() {
    let (app, _, _) = test_app();

    // Signed out: 200 with a null user, not a 401.
    let (status, body) = send(&app, get_request("/auth/session", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": null }));

    let (user_id, cookie) = signup(&app, "who@example.com", "9876543220", "customer").await;
    let (status, body) = send(&app, get_request("/auth/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.to_string());
    assert_eq!(body["user"]["full_name"], "User 9876543220");

    // A stale cookie degrades back to null after logout.
    let (status, _) = send(
        &app,
        json_request("POST", "/auth/logout", Some(&cookie), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, get_request("/auth/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": null }));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (app, _, _) = test_app();
    let (_, cookie) = signup(&app, "bye@example.com", "9876543219", "customer").await;

    let (status, _) = send(
        &app,
        json_request("POST", "/auth/logout", Some(&cookie), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_request("/saved", Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_invalid_phone() {
    let (app, _, _) = test_app();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            &json!({
                "email": "bad@example.com",
                "password": "secret123",
                "full_name": "Bad Phone",
                "phone": "12345",
                "role": "customer",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("10-digit"));
}

//=========================================================================================
// Upload
//=========================================================================================

fn multipart_request(
    file_name: &str,
    content_type: &str,
    payload: &[u8],
    bucket: &str,
    user_id: &str,
    folder: Option<&str>,
) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(b"\r\n");
    let mut text_field = |name: &str, value: &str| {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    };
    text_field("bucket", bucket);
    text_field("userId", user_id);
    if let Some(folder) = folder {
        text_field("folder", folder);
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_stores_under_a_user_scoped_key() {
    let (app, _, storage) = test_app();
    let user_id = Uuid::new_v4().to_string();
    let request =
        multipart_request("photo.PNG", "image/png", b"fakepng", "work-photos", &user_id, Some("jobs"));

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with(&format!("{user_id}/jobs/")));
    assert!(path.ends_with(".png"));
    assert_eq!(body["url"], format!("memory://work-photos/{path}"));
    assert_eq!(storage.object_count().await, 1);
}

#[tokio::test]
async fn upload_rejects_disallowed_types_and_buckets() {
    let (app, _, storage) = test_app();

    let request = multipart_request("doc.pdf", "application/pdf", b"%PDF", "work-photos", "u1", None);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("doc.pdf"));

    let request = multipart_request("a.png", "image/png", b"x", "secrets", "u1", None);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("secrets"));

    assert_eq!(storage.object_count().await, 0);
}
