//! End-to-end HTTP tests over the in-memory store: login, QR session
//! administration, the scan path, and the fingerprint import endpoint.

use std::sync::Arc;

use actix_web::{App, test, web::Data};
use chrono::NaiveTime;
use serde_json::{Value, json};

use presensi::auth::jwt::generate_access_token;
use presensi::auth::password::hash_password;
use presensi::config::Config;
use presensi::model::schedule::NewWorkSchedule;
use presensi::routes;
use presensi::store::{ScheduleStore, Store, memory::MemoryStore};

const SECRET: &str = "test-secret";
const PEER: &str = "127.0.0.1:8080";

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        tz_offset_minutes: 420,
        rate_login_per_min: 60,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
    }
}

struct Seed {
    store: Arc<MemoryStore>,
    admin_token: String,
    teacher_token: String,
}

/// Store with an every-day default schedule so the tests are independent of
/// the day they run on, plus one admin and one teacher account.
async fn seed() -> Seed {
    let store = MemoryStore::new();
    let schedule = store
        .insert_schedule(NewWorkSchedule {
            name: "Jadwal Reguler".into(),
            start_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            late_tolerance_minutes: 10,
            working_days: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
        .await
        .unwrap();
    store.set_default_schedule(schedule.id).await.unwrap();

    let teacher = store.add_teacher("Siti Rahma", "19780101", Some("FP-1"));
    let admin = store.add_user("admin", &hash_password("admin-pass"), 1, None);
    let guru = store.add_user("siti", &hash_password("guru-pass"), 3, Some(teacher.id));

    let admin_token =
        generate_access_token(admin.id, admin.username.clone(), 1, None, SECRET, 900);
    let teacher_token = generate_access_token(
        guru.id,
        guru.username.clone(),
        3,
        Some(teacher.id),
        SECRET,
        900,
    );

    Seed {
        store: Arc::new(store),
        admin_token,
        teacher_token,
    }
}

macro_rules! app {
    ($seed:expr) => {{
        let config = test_config();
        let store: Arc<dyn Store> = $seed.store.clone();
        test::init_service(
            App::new()
                .app_data(Data::from(store))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

#[actix_web::test]
async fn login_issues_a_token() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(PEER.parse().unwrap())
        .set_json(json!({"username": "admin", "password": "admin-pass"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["access_token"].as_str().unwrap().len() > 20);
    assert_eq!(body["role"], "ADMIN");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(PEER.parse().unwrap())
        .set_json(json!({"username": "admin", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn protected_routes_need_a_bearer_token() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::get()
        .uri("/api/attendance/qr/active")
        .peer_addr(PEER.parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn generate_then_scan_records_attendance() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/generate")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({"type": "CHECK_IN"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let session: Value = test::read_body_json(resp).await;
    let token = session["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/check")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.teacher_token)))
        .set_json(json!({"token": token}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Checked in successfully");
    assert_eq!(body["type"], "CHECK_IN");
    assert!(body["attendance"]["checkInTime"].is_string());
}

#[actix_web::test]
async fn scan_requires_a_teacher_account() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/check")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({"token": "whatever"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn generate_requires_admin_and_a_known_type() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/generate")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.teacher_token)))
        .set_json(json!({"type": "CHECK_IN"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/generate")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({"type": "SIDEWAYS"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid type. Must be CHECK_IN or CHECK_OUT");
}

#[actix_web::test]
async fn auto_generate_returns_both_sessions() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/auto-generate")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(body["schedule"]["name"], "Jadwal Reguler");
}

#[actix_web::test]
async fn active_lists_the_current_session() {
    let seed = seed().await;
    let app = app!(seed);

    // A manually generated session is valid from now, so it must show up.
    let req = test::TestRequest::post()
        .uri("/api/attendance/qr/generate")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({"type": "CHECK_IN"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::get()
        .uri("/api/attendance/qr/active?date=today")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["type"], "CHECK_IN");
}

#[actix_web::test]
async fn active_rejects_a_malformed_date() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::get()
        .uri("/api/attendance/qr/active?date=02-2026")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn fingerprint_import_reports_per_record_results() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/fingerprint/import")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({"logs": [
            {"fingerprint_id": "FP-1", "scanned_at": "2026-02-02T07:05:00+07:00", "raw_type": "IN"},
            {"fingerprint_id": "FP-1", "scanned_at": "2026-02-02T15:02:00+07:00", "raw_type": "OUT"},
            {"fingerprint_id": "FP-1", "scanned_at": "garbage", "raw_type": "IN"}
        ]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["imported"], 2);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["samples"][0]["teacherName"], "Siti Rahma");
    assert_eq!(body["samples"][0]["scheduleUsed"], "Jadwal Reguler");
}

#[actix_web::test]
async fn settings_enforce_special_day_uniqueness() {
    let seed = seed().await;
    let app = app!(seed);

    let day = json!({
        "date": "2026-06-01",
        "name": "Hari Lahir Pancasila",
        "type": "HOLIDAY"
    });
    let req = test::TestRequest::post()
        .uri("/api/settings/special-days")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(day.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::post()
        .uri("/api/settings/special-days")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(day)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn work_schedule_validation_rejects_bad_times() {
    let seed = seed().await;
    let app = app!(seed);

    let req = test::TestRequest::post()
        .uri("/api/settings/work-schedules")
        .peer_addr(PEER.parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {}", seed.admin_token)))
        .set_json(json!({
            "name": "Terbalik",
            "startTime": "15:00",
            "endTime": "07:00",
            "workingDays": ["Mon"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "endTime must be after startTime");
}
