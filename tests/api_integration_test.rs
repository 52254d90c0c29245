use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use medtrack_backend::config::AppConfig;
use medtrack_backend::entities::activities;
use medtrack_backend::infrastructure::database;
use medtrack_backend::utils::auth::create_jwt;
use medtrack_backend::{AppState, create_app};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    let app = create_app(AppState::new(db.clone(), AppConfig::default()));
    (app, db)
}

fn bearer(user: &str) -> String {
    // AppConfig::default() signs with "secret"
    format!("Bearer {}", create_jwt(user, "secret").unwrap())
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", bearer(user));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_medication(app: &Router, user: &str, name: &str) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/medications",
        Some(user),
        Some(json!({
            "name": name,
            "dosage": "10mg",
            "frequency": "daily",
            "timeOfDay": ["morning", "evening"],
            "startDate": "2026-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_prescription(app: &Router, user: &str, medication_id: &str, refills: Value) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/prescriptions",
        Some(user),
        Some(json!({
            "medication": medication_id,
            "doctor": "Dr. Acula",
            "refills": refills
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_reminder(app: &Router, user: &str, medication_id: &str, scheduled: DateTime<Utc>) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/reminders",
        Some(user),
        Some(json!({
            "medication": medication_id,
            "scheduledTime": scheduled.to_rfc3339()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn health_check_works() {
    let (app, _db) = setup_app().await;
    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _db) = setup_app().await;
    let (status, body) = request(&app, "GET", "/api/medications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let (app, _db) = setup_app().await;
    let req = Request::builder()
        .method("GET")
        .uri("/api/medications")
        .header("Authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn medication_crud_with_audit_trail() {
    let (app, _db) = setup_app().await;

    let created = create_medication(&app, "user_1", "Aspirin").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["name"], "Aspirin");
    assert_eq!(created["active"], true);
    assert_eq!(created["timeOfDay"], json!(["morning", "evening"]));

    let (status, fetched) =
        request(&app, "GET", &format!("/api/medications/{}", id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], json!(id));

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/medications/{}", id),
        Some("user_1"),
        Some(json!({ "name": "Ibuprofen", "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ibuprofen");
    assert_eq!(updated["active"], false);

    let (status, deleted) =
        request(&app, "DELETE", &format!("/api/medications/{}", id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Medication deleted");

    let (status, _) =
        request(&app, "GET", &format!("/api/medications/{}", id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Every mutation left an audit row
    let (status, activities) =
        request(&app, "GET", "/api/activities", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = activities["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"medication_added"));
    assert!(types.contains(&"medication_modified"));
    assert!(types.contains(&"medication_deleted"));
}

#[tokio::test]
async fn spoofed_user_field_is_ignored_on_create() {
    let (app, _db) = setup_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/medications",
        Some("real_user"),
        Some(json!({
            "user": "victim_user",
            "name": "Aspirin",
            "dosage": "10mg",
            "frequency": "daily",
            "startDate": "2026-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "real_user");

    let (_, list) = request(&app, "GET", "/api/medications", Some("victim_user"), None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn cross_user_access_is_indistinguishable_from_missing() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rx = create_prescription(&app, "user_1", &med_id, json!({"total": 1, "remaining": 1})).await;
    let rx_id = rx["id"].as_str().unwrap().to_string();
    let rem = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    let rem_id = rem["id"].as_str().unwrap().to_string();

    for (method, uri, body) in [
        ("GET", format!("/api/medications/{}", med_id), None),
        ("PUT", format!("/api/medications/{}", med_id), Some(json!({"name": "X"}))),
        ("DELETE", format!("/api/medications/{}", med_id), None),
        ("GET", format!("/api/prescriptions/{}", rx_id), None),
        ("POST", format!("/api/prescriptions/{}/refill", rx_id), None),
        ("DELETE", format!("/api/prescriptions/{}", rx_id), None),
        ("GET", format!("/api/reminders/{}", rem_id), None),
        ("PUT", format!("/api/reminders/{}/complete", rem_id), None),
        ("DELETE", format!("/api/reminders/{}", rem_id), None),
    ] {
        let (status, body) = request(&app, method, &uri, Some("user_2"), body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        // Same generic message as a genuinely absent record
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    // Nothing was modified for the real owner
    let (status, fetched) =
        request(&app, "GET", &format!("/api/medications/{}", med_id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Aspirin");
}

#[tokio::test]
async fn refill_clamps_at_total() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rx = create_prescription(&app, "user_1", &med_id, json!({"total": 3, "remaining": 0})).await;
    let rx_id = rx["id"].as_str().unwrap().to_string();
    let uri = format!("/api/prescriptions/{}/refill", rx_id);

    for expected in [1, 2, 3, 3] {
        let (status, body) = request(&app, "POST", &uri, Some("user_1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refills"]["remaining"], expected);
        assert_eq!(body["refills"]["total"], 3);
    }

    // Each refill (including the clamped one) wrote an audit row, and the
    // prescription reference reads back as a full record
    let (_, page) = request(
        &app,
        "GET",
        "/api/activities/by-type/prescription_filled",
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(page["total"], 4);
    assert_eq!(page["activities"][0]["prescription"]["id"], json!(rx_id));
    assert_eq!(page["activities"][0]["prescription"]["doctor"], "Dr. Acula");
}

#[tokio::test]
async fn direct_update_may_exceed_total_until_next_refill() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rx = create_prescription(&app, "user_1", &med_id, json!({"total": 3, "remaining": 1})).await;
    let rx_id = rx["id"].as_str().unwrap().to_string();

    // A direct update is not clamped; the stored count may exceed the total
    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/prescriptions/{}", rx_id),
        Some("user_1"),
        Some(json!({"refills": {"total": 3, "remaining": 5}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["refills"]["remaining"], 5);
    assert_eq!(updated["refills"]["total"], 3);

    // The next refill brings the count back within bounds
    let (status, refilled) = request(
        &app,
        "POST",
        &format!("/api/prescriptions/{}/refill", rx_id),
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refilled["refills"]["remaining"], 3);
}

#[tokio::test]
async fn snooze_requires_duration_and_sets_snoozed_until() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rem = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    let rem_id = rem["id"].as_str().unwrap().to_string();
    let uri = format!("/api/reminders/{}/snooze", rem_id);

    // Missing duration is a 400 and leaves the reminder untouched
    let (status, _) = request(&app, "PUT", &uri, Some("user_1"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) =
        request(&app, "PUT", &uri, Some("user_1"), Some(json!({"snoozeDuration": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, fetched) =
        request(&app, "GET", &format!("/api/reminders/{}", rem_id), Some("user_1"), None).await;
    assert_eq!(fetched["status"], "pending");

    let before = Utc::now();
    let (status, snoozed) =
        request(&app, "PUT", &uri, Some("user_1"), Some(json!({"snoozeDuration": 30}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snoozed["status"], "snoozed");

    let until: DateTime<Utc> = snoozed["snoozedUntil"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let offset = until - before;
    assert!(offset >= Duration::minutes(30));
    assert!(offset < Duration::minutes(31));
}

#[tokio::test]
async fn complete_and_miss_transitions_log_activities() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();

    let taken = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    let (status, completed) = request(
        &app,
        "PUT",
        &format!("/api/reminders/{}/complete", taken["id"].as_str().unwrap()),
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completedAt"].is_string());

    let skipped = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    let (status, missed) = request(
        &app,
        "PUT",
        &format!("/api/reminders/{}/miss", skipped["id"].as_str().unwrap()),
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missed["status"], "missed");
    assert!(missed["completedAt"].is_null());

    let (_, taken_page) = request(
        &app,
        "GET",
        "/api/activities/by-type/medication_taken",
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(taken_page["total"], 1);
    let (_, skipped_page) = request(
        &app,
        "GET",
        "/api/activities/by-type/medication_skipped",
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(skipped_page["total"], 1);
}

#[tokio::test]
async fn completing_again_refreshes_completed_at() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rem = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    let uri = format!("/api/reminders/{}/complete", rem["id"].as_str().unwrap());

    let (status, first) = request(&app, "PUT", &uri, Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let first_at: DateTime<Utc> = first["completedAt"].as_str().unwrap().parse().unwrap();

    // No transition guard: a second complete overwrites the timestamp
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let (status, second) = request(&app, "PUT", &uri, Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "completed");
    let second_at: DateTime<Utc> = second["completedAt"].as_str().unwrap().parse().unwrap();
    assert!(second_at > first_at);

    // ...and writes a second audit row
    let (_, page) = request(
        &app,
        "GET",
        "/api/activities/by-type/medication_taken",
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn snooze_does_not_write_an_activity() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rem = create_reminder(&app, "user_1", &med_id, Utc::now()).await;

    let (_, before) = request(&app, "GET", "/api/activities", Some("user_1"), None).await;
    let count_before = before["total"].as_u64().unwrap();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/reminders/{}/snooze", rem["id"].as_str().unwrap()),
        Some("user_1"),
        Some(json!({"snoozeDuration": 15})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = request(&app, "GET", "/api/activities", Some("user_1"), None).await;
    assert_eq!(after["total"].as_u64().unwrap(), count_before);
}

#[tokio::test]
async fn today_excludes_other_days_and_settled_statuses() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();

    // Scheduled yesterday, still pending: out of the window
    create_reminder(&app, "user_1", &med_id, Utc::now() - Duration::days(1)).await;

    // Scheduled today but completed: excluded regardless of date
    let done = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    request(
        &app,
        "PUT",
        &format!("/api/reminders/{}/complete", done["id"].as_str().unwrap()),
        Some("user_1"),
        None,
    )
    .await;

    // Scheduled today and snoozed: included
    let upcoming = create_reminder(&app, "user_1", &med_id, Utc::now()).await;
    request(
        &app,
        "PUT",
        &format!("/api/reminders/{}/snooze", upcoming["id"].as_str().unwrap()),
        Some("user_1"),
        Some(json!({"snoozeDuration": 10})),
    )
    .await;

    let (status, today) = request(&app, "GET", "/api/reminders/today", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = today.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], upcoming["id"]);
    assert_eq!(rows[0]["status"], "snoozed");
    // Populated medication record, not a bare id
    assert_eq!(rows[0]["medication"]["name"], "Aspirin");
}

#[tokio::test]
async fn activity_pagination_math() {
    let (app, db) = setup_app().await;

    // Seed the read-only activity surface directly
    let base = Utc::now();
    for i in 0..45 {
        let when = base - Duration::seconds(i);
        activities::ActiveModel {
            id: Set(format!("activity-{}", i)),
            user: Set("user_1".to_string()),
            activity_type: Set(activities::ActivityType::MedicationTaken),
            medication: Set(None),
            prescription: Set(None),
            details: Set(None),
            timestamp: Set(when),
            created_at: Set(when),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let (status, page1) =
        request(&app, "GET", "/api/activities?page=1&limit=20", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page1["activities"].as_array().unwrap().len(), 20);
    assert_eq!(page1["page"], 1);
    assert_eq!(page1["totalPages"], 3);
    assert_eq!(page1["total"], 45);
    // Newest first
    assert_eq!(page1["activities"][0]["id"], "activity-0");

    let (_, page3) =
        request(&app, "GET", "/api/activities?page=3&limit=20", Some("user_1"), None).await;
    assert_eq!(page3["activities"].as_array().unwrap().len(), 5);
    assert_eq!(page3["page"], 3);

    let (_, recent) =
        request(&app, "GET", "/api/activities/recent?limit=7", Some("user_1"), None).await;
    assert_eq!(recent.as_array().unwrap().len(), 7);

    // Another user sees an empty history
    let (_, other) = request(&app, "GET", "/api/activities", Some("user_2"), None).await;
    assert_eq!(other["total"], 0);
    assert_eq!(other["totalPages"], 0);
}

#[tokio::test]
async fn unknown_activity_type_is_a_bad_request() {
    let (app, _db) = setup_app().await;
    let (status, _) = request(
        &app,
        "GET",
        "/api/activities/by-type/medication_exploded",
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activities_filter_by_medication() {
    let (app, _db) = setup_app().await;

    let med_a = create_medication(&app, "user_1", "Aspirin").await;
    let med_b = create_medication(&app, "user_1", "Ibuprofen").await;
    let id_a = med_a["id"].as_str().unwrap();

    let (status, page) = request(
        &app,
        "GET",
        &format!("/api/activities/by-medication/{}", id_a),
        Some("user_1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["activities"][0]["type"], "medication_added");
    assert_eq!(page["activities"][0]["medication"]["id"], med_a["id"]);
    assert_ne!(page["activities"][0]["medication"]["id"], med_b["id"]);
}

#[tokio::test]
async fn deleting_medication_leaves_dangling_references_readable() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    let rx = create_prescription(&app, "user_1", &med_id, json!({"total": 2, "remaining": 2})).await;
    let rx_id = rx["id"].as_str().unwrap().to_string();
    create_reminder(&app, "user_1", &med_id, Utc::now()).await;

    let (status, _) =
        request(&app, "DELETE", &format!("/api/medications/{}", med_id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);

    // No cascade: both dependents survive and read back with a null medication
    let (status, rx_list) = request(&app, "GET", "/api/prescriptions", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rx_list.as_array().unwrap().len(), 1);
    assert!(rx_list[0]["medication"].is_null());

    let (status, fetched) =
        request(&app, "GET", &format!("/api/prescriptions/{}", rx_id), Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched["medication"].is_null());

    let (status, reminders) = request(&app, "GET", "/api/reminders", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reminders.as_array().unwrap().len(), 1);
    assert!(reminders[0]["medication"].is_null());
}

#[tokio::test]
async fn prescription_listing_populates_and_sorts() {
    let (app, _db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    for _ in 0..7 {
        create_prescription(&app, "user_1", &med_id, json!({"total": 1, "remaining": 1})).await;
    }

    let (status, list) = request(&app, "GET", "/api/prescriptions", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    for row in rows {
        assert_eq!(row["medication"]["name"], "Aspirin");
        assert_eq!(row["status"], "active");
    }

    // Default recent window is 5
    let (_, recent) =
        request(&app, "GET", "/api/prescriptions/recent", Some("user_1"), None).await;
    assert_eq!(recent.as_array().unwrap().len(), 5);

    let (_, recent_two) =
        request(&app, "GET", "/api/prescriptions/recent?limit=2", Some("user_1"), None).await;
    assert_eq!(recent_two.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn zero_recent_limit_falls_back_to_default() {
    let (app, db) = setup_app().await;

    let med = create_medication(&app, "user_1", "Aspirin").await;
    let med_id = med["id"].as_str().unwrap().to_string();
    for _ in 0..7 {
        create_prescription(&app, "user_1", &med_id, json!({"total": 1, "remaining": 1})).await;
    }

    let (status, recent) =
        request(&app, "GET", "/api/prescriptions/recent?limit=0", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 5);

    // Pad the activity history past the default window
    let base = Utc::now() - Duration::hours(1);
    for i in 0..12 {
        activities::ActiveModel {
            id: Set(format!("padding-{}", i)),
            user: Set("user_1".to_string()),
            activity_type: Set(activities::ActivityType::MedicationTaken),
            medication: Set(None),
            prescription: Set(None),
            details: Set(None),
            timestamp: Set(base - Duration::seconds(i)),
            created_at: Set(base - Duration::seconds(i)),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let (status, recent) =
        request(&app, "GET", "/api/activities/recent?limit=0", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let (app, _db) = setup_app().await;

    // Missing required field
    let (status, _) = request(
        &app,
        "POST",
        "/api/medications",
        Some("user_1"),
        Some(json!({"name": "Aspirin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown enum value
    let (status, _) = request(
        &app,
        "POST",
        "/api/medications",
        Some("user_1"),
        Some(json!({
            "name": "Aspirin",
            "dosage": "10mg",
            "frequency": "daily",
            "timeOfDay": ["brunch"],
            "startDate": "2026-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Validator constraint
    let (status, _) = request(
        &app,
        "POST",
        "/api/medications",
        Some("user_1"),
        Some(json!({
            "name": "",
            "dosage": "10mg",
            "frequency": "daily",
            "startDate": "2026-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn error_body_carries_stack_outside_production() {
    let (app, _db) = setup_app().await;
    let (status, body) = request(&app, "GET", "/api/medications/nope", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Medication not found");
    // Development mode includes the debug detail
    assert!(body["stack"].is_string());
}
