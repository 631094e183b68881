use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::auth::jwt::{create_token, TokenKind};
use crate::auth::roles::Role;
use crate::config::{Config, Environment};
use crate::db::{test_pool, DbPool};
use crate::models::{NewTimetableEntry, SubjectType};
use crate::seeding::seed_defaults;
use crate::services::test_fixtures::campus;
use crate::services::timetable_service::create_entries;
use crate::{build_app, AppState};

struct TestApp {
    router: Router,
    pool: DbPool,
    secret: String,
    _dir: tempfile::TempDir,
}

fn test_app_with(environment: Environment) -> TestApp {
    let (pool, dir) = test_pool();
    seed_defaults(&pool).unwrap();

    let mut config = Config::default();
    config.server.environment = environment;
    config.jwt.secret = "api-test-secret".to_string();
    config.jwt.bcrypt_cost = 4;

    let secret = config.jwt.secret.clone();
    let state = AppState::new(pool.clone(), config).unwrap();
    TestApp {
        router: build_app(state),
        pool,
        secret,
        _dir: dir,
    }
}

fn test_app() -> TestApp {
    test_app_with(Environment::Test)
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Registers and returns the access token.
    async fn register(&self, email: &str, role: Option<&str>) -> String {
        let mut body = json!({ "email": email, "password": "hunter22" });
        if let Some(r) = role {
            body["role"] = json!(r);
        }
        let (status, json) = self
            .call(Method::POST, "/api/auth/register", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["data"]["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_first_user_is_admin_and_second_keeps_requested_role() {
    let app = test_app();

    app.register("first@uni.edu", Some("student")).await;
    let (_, first) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "first@uni.edu", "password": "hunter22"})),
        )
        .await;
    assert_eq!(first["data"]["user"]["role"], "admin");

    let token = app.register("second@uni.edu", Some("teacher")).await;
    let (status, me) = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["role"], "teacher");
    assert_eq!(me["data"]["email"], "second@uni.edu");
    assert!(me["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_wrong_password_returns_no_session() {
    let app = test_app();
    app.register("a@uni.edu", None).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@uni.edu", "password": "wrong-one"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "A@uni.edu", "password": "hunter22"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = app
        .call(
            Method::GET,
            "/api/auth/me",
            body["data"]["access_token"].as_str(),
            None,
        )
        .await;
    assert_eq!(me["data"]["id"], body["data"]["user"]["id"]);
}

#[tokio::test]
async fn test_refresh_issues_access_token_for_same_user() {
    let app = test_app();
    app.register("r@uni.edu", None).await;
    let (_, login) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "r@uni.edu", "password": "hunter22"})),
        )
        .await;
    let refresh = login["data"]["refresh_token"].as_str().unwrap().to_string();
    let access = login["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["data"]["access_token"].as_str().unwrap();
    let (_, me) = app.call(Method::GET, "/api/auth/me", Some(new_access), None).await;
    assert_eq!(me["data"]["id"], login["data"]["user"]["id"]);

    // Cookie fallback
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/refresh")
        .header(header::COOKIE, format!("refresh_token={}", refresh))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A malformed body is rejected even when the cookie would do.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("refresh_token={}", refresh))
        .body(Body::from("{\"refresh_token\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);

    // An access token is not accepted as a refresh token.
    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": access })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::POST, "/api/auth/refresh", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "refresh_token");
}

#[tokio::test]
async fn test_expired_and_missing_tokens_are_rejected() {
    let app = test_app();
    app.register("x@uni.edu", None).await;

    let expired = create_token(
        1,
        "uid",
        "x@uni.edu",
        Role::Admin,
        TokenKind::Access,
        &app.secret,
        chrono::Duration::seconds(-5),
    )
    .unwrap();
    let (status, body) = app
        .call(Method::GET, "/api/departments", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, _) = app.call(Method::GET, "/api/departments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_writes_require_permission() {
    let app = test_app();
    let admin = app.register("admin@uni.edu", None).await;
    let student = app.register("student@uni.edu", None).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/departments",
            Some(&student),
            Some(json!({"name": "Physics"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/departments",
            Some(&admin),
            Some(json!({"name": "Physics"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Physics");

    // Reads only need a session.
    let (status, body) = app
        .call(Method::GET, "/api/departments", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.call(Method::GET, "/api/users", Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validation_and_conflict_envelopes() {
    let app = test_app();
    let admin = app.register("admin@uni.edu", None).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/classes",
            Some(&admin),
            Some(json!({"class_name": "", "semester": 40})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["class_name", "semester"]);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/departments",
            Some(&admin),
            Some(json!({"name": "Maths"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call(
            Method::POST,
            "/api/departments",
            Some(&admin),
            Some(json!({"name": "Maths"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(Method::GET, "/api/departments/999", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .call(Method::PUT, "/api/departments/1", Some(&admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_entries_filtered_by_class_id_alias() {
    let app = test_app();
    let token = app.register("admin@uni.edu", None).await;

    let c = {
        let mut conn = app.pool.get().unwrap();
        let c = campus(&mut conn);
        let row = |class: usize, slot: usize| NewTimetableEntry {
            class_id: c.classes[class].id,
            time_slot_id: c.slots[slot].id,
            subject_id: c.subjects[0].id,
            teacher_id: c.teachers[class].id,
            room_id: c.rooms[class].id,
            entry_type: SubjectType::Theory,
            department_id: Some(c.department.id),
        };
        create_entries(&mut conn, &[row(0, 3), row(1, 0), row(0, 1)]).unwrap();
        c
    };

    let class_id = c.classes[0].id;
    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/timetable-entries?classId={}", class_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["class_id"] == class_id));
    let slots: Vec<i64> = entries
        .iter()
        .map(|e| e["time_slot_id"].as_i64().unwrap())
        .collect();
    assert!(slots[0] < slots[1]);
    assert_eq!(entries[0]["time_slot"]["id"], entries[0]["time_slot_id"]);
}

#[tokio::test]
async fn test_teacher_subject_pair_delete_and_replace_routes() {
    let app = test_app();
    let token = app.register("admin@uni.edu", None).await;
    let c = campus(&mut app.pool.get().unwrap());
    let (t0, t1) = (c.teachers[0].id, c.teachers[1].id);
    let (s0, s1) = (c.subjects[0].id, c.subjects[1].id);

    for (t, s) in [(t0, s0), (t0, s1), (t1, s0)] {
        let (status, _) = app
            .call(
                Method::POST,
                "/api/teacher-subjects",
                Some(&token),
                Some(json!({"teacher_id": t, "subject_id": s})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/teacher-subjects/teacher/{}/subject/{}", t0, s0),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 1);

    let (_, body) = app
        .call(Method::GET, "/api/teacher-subjects", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/teachers/{}/subjects", t0),
            Some(&token),
            Some(json!({"subject_ids": [s0, s0]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/teachers/999/subjects",
            Some(&token),
            Some(json!({"subject_ids": [s0]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_rate_limit_applies_in_production() {
    let app = test_app_with(Environment::Production);
    let body = json!({"email": "nobody@uni.edu", "password": "whatever"});

    for _ in 0..10 {
        let (status, _) = app
            .call(Method::POST, "/api/auth/login", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app
        .call(Method::POST, "/api/auth/login", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = test_app();
    let token = app.register("admin@uni.edu", None).await;
    campus(&mut app.pool.get().unwrap());

    let (status, body) = app
        .call(Method::GET, "/api/dashboard/stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["teachers"], 2);
    assert_eq!(body["data"]["time_slots"], 6);
}

#[tokio::test]
async fn test_hod_writes_stay_inside_own_department() {
    let app = test_app();
    let admin = app.register("admin@uni.edu", None).await;
    let c = campus(&mut app.pool.get().unwrap());
    let (_, body) = app
        .call(
            Method::POST,
            "/api/departments",
            Some(&admin),
            Some(json!({"name": "Physics"})),
        )
        .await;
    let physics = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "hod@uni.edu",
                "password": "hunter22",
                "role": "hod",
                "department_id": c.department.id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let hod = body["data"]["access_token"].as_str().unwrap().to_string();

    let teacher = |emp: &str, dept: i64| {
        json!({"emp_id": emp, "email": format!("{}@uni.edu", emp), "department_id": dept})
    };

    let (status, body) = app
        .call(
            Method::POST,
            "/api/teachers",
            Some(&hod),
            Some(teacher("e900", physics)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/teachers",
            Some(&hod),
            Some(teacher("e901", c.department.id as i64)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Moving an own row into another department is a write there too.
    let class_uri = format!("/api/classes/{}", c.classes[0].id);
    let (status, _) = app
        .call(
            Method::PUT,
            &class_uri,
            Some(&hod),
            Some(json!({"department_id": physics})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .call(Method::PUT, &class_uri, Some(&hod), Some(json!({"section": "B"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["department_id"], c.department.id);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/timetable/generate",
            Some(&hod),
            Some(json!({"department_id": physics})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/teachers",
            Some(&admin),
            Some(teacher("e902", physics)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/teachers?department_id={}", physics),
            Some(&admin),
            None,
        )
        .await;
    let emp_ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["emp_id"].as_str().unwrap())
        .collect();
    assert_eq!(emp_ids, vec!["e902"]);
}

#[tokio::test]
async fn test_refresh_cookie_is_set_on_login_and_removed_on_logout() {
    let app = test_app();
    app.register("c@uni.edu", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "c@uni.edu", "password": "hunter22"}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/api/auth"));

    let pair = set_cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("refresh_token=;"));
    assert!(cleared.contains("Max-Age=0"));
}
