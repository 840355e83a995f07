//! Integration tests for the timetable backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::{Config, PushMode};
use crate::db::{init_database, LocalStore};
use crate::remote::HttpRemoteStore;
use crate::sync::Synchronizer;
use crate::{create_router, AppState};

/// Stand-in for the remote document endpoint: stores the last POST body and
/// serves it back on GET.
#[derive(Clone, Default)]
struct FakeRemote {
    body: Arc<Mutex<Option<String>>>,
    posts: Arc<Mutex<usize>>,
}

impl FakeRemote {
    fn holding(body: Value) -> Self {
        let remote = Self::default();
        *remote.body.lock().unwrap() = Some(body.to_string());
        remote
    }

    fn document(&self) -> Option<Value> {
        let body = self.body.lock().unwrap().clone()?;
        serde_json::from_str(&body).ok()
    }

    fn posts(&self) -> usize {
        *self.posts.lock().unwrap()
    }

    fn replace(&self, body: Value) {
        *self.body.lock().unwrap() = Some(body.to_string());
    }

    async fn spawn(&self) -> String {
        async fn fetch(State(remote): State<FakeRemote>) -> (StatusCode, String) {
            match remote.body.lock().unwrap().clone() {
                Some(body) => (StatusCode::OK, body),
                None => (StatusCode::NOT_FOUND, String::new()),
            }
        }

        async fn store(State(remote): State<FakeRemote>, body: String) -> StatusCode {
            *remote.body.lock().unwrap() = Some(body);
            *remote.posts.lock().unwrap() += 1;
            StatusCode::OK
        }

        let app = Router::new()
            .route("/exec", get(fetch).post(store))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind remote");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/exec", addr)
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    store: LocalStore,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_remote(None).await
    }

    async fn with_remote(remote_url: Option<String>) -> Self {
        Self::with_remote_mode(remote_url, PushMode::FireAndForget).await
    }

    async fn with_remote_mode(remote_url: Option<String>, push_mode: PushMode) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize the local store
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = LocalStore::new(pool);

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            default_remote_url: remote_url,
            push_mode,
            remote_timeout: Some(Duration::from_secs(5)),
        };

        let document = store
            .load_or_seed(config.default_remote_url.as_deref())
            .await
            .expect("Failed to load state");
        let remote = Arc::new(
            HttpRemoteStore::new(config.push_mode, config.remote_timeout).unwrap(),
        );
        let sync = Arc::new(Synchronizer::new(
            document,
            store.clone(),
            remote,
            config.default_remote_url.clone(),
        ));
        sync.reconcile().await;

        let state = AppState {
            sync,
            store: store.clone(),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            store,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and return the session token.
    async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn principal(&self) -> String {
        self.login("1234", "1234").await
    }

    async fn admin(&self) -> String {
        self.login("admin", "password123").await
    }
}

/// Remote that answers every push with a server error and has no data.
async fn spawn_rejecting_remote() -> String {
    let app = Router::new().route(
        "/exec",
        get(|| async { StatusCode::NOT_FOUND }).post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind remote");
    let addr = listener.local_addr().expect("Failed to get addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/exec", addr)
}

/// Poll until the fake remote has received `expected` pushes.
async fn wait_for_posts(remote: &FakeRemote, expected: usize) {
    for _ in 0..100 {
        if remote.posts() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("remote never received {} pushes", expected);
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_router_oneshot_requires_session() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("oneshot.sqlite");
    let pool = init_database(&db_path).await.unwrap();
    let store = LocalStore::new(pool);
    let config = Config::from_lookup(|_| None).unwrap();
    let remote = Arc::new(HttpRemoteStore::new(config.push_mode, None).unwrap());
    let sync = Arc::new(Synchronizer::new(
        store.load_or_seed(None).await.unwrap(),
        store.clone(),
        remote,
        None,
    ));

    let app = create_router(AppState {
        sync,
        store,
        config: Arc::new(config),
    });

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/public/directory")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_missing_and_invalid_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/state"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .get(fixture.url("/api/state"))
        .bearer_auth("not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(fixture.store.get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_state_is_redacted_for_admin() {
    let fixture = TestFixture::new().await;

    let admin = fixture.admin().await;
    let resp = fixture
        .client
        .get(fixture.url("/api/state"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["settings"]["adminPassword"], "");
    assert_eq!(body["data"]["staff"].as_array().unwrap().len(), 2);

    let principal = fixture.principal().await;
    let resp = fixture
        .client
        .get(fixture.url("/api/state"))
        .header("x-session-token", &principal)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["settings"]["adminPassword"], "password123");
}

#[tokio::test]
async fn test_single_active_session() {
    let fixture = TestFixture::new().await;

    let first = fixture.admin().await;
    let second = fixture.principal().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "principal");

    // Logout clears the stored session
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/logout"))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_principal_only_routes() {
    let fixture = TestFixture::new().await;

    let admin = fixture.admin().await;
    let resp = fixture
        .client
        .get(fixture.url("/api/settings"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let principal = fixture.principal().await;
    let resp = fixture
        .client
        .get(fixture.url("/api/settings"))
        .bearer_auth(&principal)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["adminUsername"], "admin");
}

#[tokio::test]
async fn test_registry_crud() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    // Create staff
    let resp = fixture
        .client
        .post(fixture.url("/api/staff"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Priya Nair", "department": "Physics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let staff_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["email"], "priya.nair@institution.edu");
    assert_eq!(body["data"]["isActive"], true);

    // Missing name
    let resp = fixture
        .client
        .post(fixture.url("/api/staff"))
        .bearer_auth(&token)
        .json(&json!({ "department": "Physics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Subjects and classes
    let resp = fixture
        .client
        .post(fixture.url("/api/subjects"))
        .bearer_auth(&token)
        .json(&json!({ "code": "PH101", "name": "Mechanics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/classes"))
        .bearer_auth(&token)
        .json(&json!({ "name": "B.Sc Year 2", "section": "A" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/classes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    // Delete staff
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/staff/{}", staff_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/staff/{}", staff_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/api/staff"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_assignment_conflict_requires_override() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    let first = json!({
        "day": "Monday", "slotId": "1", "classId": "c1",
        "facultyId": "s1", "subjectId": "sub1"
    });
    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["conflicts"].as_array().unwrap().is_empty());

    // Same faculty, same time, another class
    let clash = json!({
        "day": "Monday", "slotId": "1", "classId": "c2",
        "facultyId": "s1", "subjectId": "sub1", "type": "Lab"
    });

    let resp = fixture
        .client
        .post(fixture.url("/api/timetable/check"))
        .bearer_auth(&token)
        .json(&clash)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["conflicts"][0]["type"], "Faculty Conflict");
    assert_eq!(body["data"]["conflicts"][0]["severity"], "High");

    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&clash)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "SCHEDULE_CONFLICT");
    assert_eq!(
        body["error"]["details"]["conflicts"][0]["type"],
        "Faculty Conflict"
    );

    let mut overridden = clash.clone();
    overridden["override"] = json!(true);
    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&overridden)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Viewer schedule shows the session in slot order
    let resp = fixture
        .client
        .get(fixture.url("/api/public/timetable/class/c2?day=Monday"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["session"]["facultyName"], "Dr. Meera Iyer");
    assert_eq!(rows[0]["session"]["type"], "Lab");
    assert_eq!(rows[3]["isBreak"], true);

    let resp = fixture
        .client
        .get(fixture.url("/api/public/timetable/faculty/s1?day=Monday"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"][0]["session"].is_object());
}

#[tokio::test]
async fn test_assignment_validation_and_clear() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    // Lunch is a break
    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&json!({
            "day": "Monday", "slotId": "4", "classId": "c1",
            "facultyId": "s1", "subjectId": "sub1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&json!({
            "day": "Sunday", "slotId": "1", "classId": "c1",
            "facultyId": "s1", "subjectId": "sub1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .put(fixture.url("/api/timetable/assign"))
        .bearer_auth(&token)
        .json(&json!({
            "day": "Tuesday", "slotId": "2", "classId": "c3",
            "facultyId": "s2", "subjectId": "sub2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url("/api/timetable/slot"))
        .bearer_auth(&token)
        .json(&json!({ "day": "Tuesday", "slotId": "2", "classId": "c3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["removed"], 1);
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/state/revision"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let initial = body["data"]["revisionId"].as_u64().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/attendance"))
        .bearer_auth(&token)
        .json(&json!({ "staffId": "s1", "date": "2025-01-06" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_u64().unwrap(), initial + 1);
    assert_eq!(body["data"]["created"], true);

    // A repeat returns the existing record without a write
    let resp = fixture
        .client
        .post(fixture.url("/api/attendance"))
        .bearer_auth(&token)
        .json(&json!({ "staffId": "s1", "date": "2025-01-06" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["created"], false);
    assert_eq!(body["revisionId"].as_u64().unwrap(), initial + 1);

    // Failed writes do not bump the revision
    let resp = fixture
        .client
        .post(fixture.url("/api/attendance"))
        .bearer_auth(&token)
        .json(&json!({ "staffId": "nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_u64().unwrap(), initial + 1);

    let stored = fixture.store.load_state().await.unwrap().unwrap();
    assert_eq!(stored.revision, initial + 1);
    assert_eq!(stored.attendance.len(), 1);
    let marked: Vec<_> = stored
        .logs
        .iter()
        .filter(|log| log.action.starts_with("Marked"))
        .collect();
    assert_eq!(marked.len(), 1);
}

#[tokio::test]
async fn test_leave_workflow() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/leaves"))
        .bearer_auth(&token)
        .json(&json!({ "staffId": "s1", "startDate": "2025-02-03" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "All fields are required.");

    let resp = fixture
        .client
        .post(fixture.url("/api/leaves"))
        .bearer_auth(&token)
        .json(&json!({
            "staffId": "s1", "startDate": "2025-02-03",
            "endDate": "2025-02-05", "reason": "Conference"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let leave_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "Pending");

    let resp = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["pendingLeaves"], 1);
    assert_eq!(body["data"]["staffCount"], 2);

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/leaves/{}/decision", leave_id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "Approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Decided requests stay decided
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/leaves/{}/decision", leave_id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "Rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_substitutions_visible_only_when_approved() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/substitutions/suggest/sub2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], "s2");

    let resp = fixture
        .client
        .post(fixture.url("/api/substitutions"))
        .bearer_auth(&token)
        .json(&json!({
            "date": "2025-02-04", "slotId": "1", "classId": "c1",
            "originalFacultyId": "s1", "substituteFacultyId": "s2",
            "reason": "Leave"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .get(fixture.url("/api/public/substitutions"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    fixture
        .client
        .post(fixture.url(&format!("/api/substitutions/{}/decision", id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "Approved" }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/public/substitutions"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["substituteFacultyId"], "s2");
}

#[tokio::test]
async fn test_sso_follows_toggle_and_allow_list() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/sso"))
        .json(&json!({ "email": "admin@institution.edu" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let principal = fixture.principal().await;
    let resp = fixture
        .client
        .put(fixture.url("/api/settings"))
        .bearer_auth(&principal)
        .json(&json!({
            "googleLoginEnabled": true,
            "approvedEmails": ["dean@institution.edu"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/sso"))
        .json(&json!({ "email": "admin@institution.edu" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/sso"))
        .json(&json!({ "email": "Dean@Institution.edu" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn test_logs_record_actor_newest_first() {
    let fixture = TestFixture::new().await;
    let principal = fixture.principal().await;

    let resp = fixture
        .client
        .put(fixture.url("/api/config"))
        .bearer_auth(&principal)
        .json(&json!({ "academicYear": "2025-26", "term": "Odd Semester" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    fixture
        .client
        .post(fixture.url("/api/classes"))
        .bearer_auth(&principal)
        .json(&json!({ "name": "M.Sc Year 2" }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/logs"))
        .bearer_auth(&principal)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["user"], "Principal");
    assert_eq!(logs[0]["action"], "Added class M.Sc Year 2");

    let resp = fixture
        .client
        .get(fixture.url("/api/public/directory"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["config"]["academicYear"], "2025-26");
    assert!(body["data"].get("settings").is_none());
}

#[tokio::test]
async fn test_empty_remote_is_seeded_at_startup() {
    let remote = FakeRemote::default();
    let url = remote.spawn().await;

    let _fixture = TestFixture::with_remote(Some(url)).await;

    assert_eq!(remote.posts(), 1);
    let seeded = remote.document().unwrap();
    assert_eq!(seeded["staff"].as_array().unwrap().len(), 2);
    assert_eq!(seeded["config"]["term"], "Even Semester");
}

#[tokio::test]
async fn test_invalid_remote_payload_is_replaced_by_local() {
    let remote = FakeRemote::holding(json!({ "foo": 1 }));
    let url = remote.spawn().await;

    let fixture = TestFixture::with_remote(Some(url)).await;

    assert_eq!(remote.posts(), 1);
    assert!(remote.document().unwrap().get("timetable").is_some());
    let stored = fixture.store.load_state().await.unwrap().unwrap();
    assert_eq!(stored.classes.len(), 3);
}

#[tokio::test]
async fn test_remote_document_wins_at_startup() {
    let remote = FakeRemote::holding(json!({
        "config": { "academicYear": "2099-00", "term": "Remote Term" },
        "staff": []
    }));
    let url = remote.spawn().await;

    let fixture = TestFixture::with_remote(Some(url.clone())).await;
    assert_eq!(remote.posts(), 0);

    let token = fixture.principal().await;
    let resp = fixture
        .client
        .get(fixture.url("/api/state"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["config"]["term"], "Remote Term");
    assert!(body["data"]["staff"].as_array().unwrap().is_empty());
    // Missing settings take defaults, and the endpoint is filled in
    assert_eq!(body["data"]["settings"]["cloudDbEnabled"], true);
    assert_eq!(body["data"]["settings"]["googleSheetWebAppUrl"], url);

    let stored = fixture.store.load_state().await.unwrap().unwrap();
    assert_eq!(stored.config.term, "Remote Term");
}

#[tokio::test]
async fn test_mutations_replicate_to_remote() {
    let remote = FakeRemote::default();
    let url = remote.spawn().await;
    let fixture = TestFixture::with_remote(Some(url)).await;
    wait_for_posts(&remote, 1).await;

    let token = fixture.admin().await;
    let resp = fixture
        .client
        .post(fixture.url("/api/staff"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Kavya Menon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    wait_for_posts(&remote, 2).await;
    let pushed = remote.document().unwrap();
    let names: Vec<&str> = pushed["staff"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert!(names.contains(&"Kavya Menon"));
    assert_eq!(pushed["revision"], 1);
}

#[tokio::test]
async fn test_manual_pull_and_push() {
    let remote = FakeRemote::default();
    let url = remote.spawn().await;
    let fixture = TestFixture::with_remote(Some(url.clone())).await;
    let token = fixture.principal().await;

    // Another client overwrote the remote copy
    let mut replacement = remote.document().unwrap();
    replacement["config"]["term"] = json!("Pulled Term");
    remote.replace(replacement);

    let resp = fixture
        .client
        .post(fixture.url("/api/sync/pull"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["ok"], true);

    let stored = fixture.store.load_state().await.unwrap().unwrap();
    assert_eq!(stored.config.term, "Pulled Term");

    let posts_before = remote.posts();
    let resp = fixture
        .client
        .post(fixture.url("/api/sync/push"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["ok"], true);
    assert_eq!(remote.posts(), posts_before + 1);

    let resp = fixture
        .client
        .get(fixture.url("/api/sync/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["phase"], "steady");
    assert_eq!(body["data"]["enabled"], true);
    assert_eq!(body["data"]["endpoint"], url);
    assert_eq!(body["data"]["pushMode"], "fire-and-forget");
    assert_eq!(body["data"]["lastPush"]["ok"], true);
}

#[tokio::test]
async fn test_manual_sync_without_endpoint() {
    let fixture = TestFixture::new().await;
    let token = fixture.principal().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/sync/push"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_push_mode_decides_rejected_push_outcome() {
    let url = spawn_rejecting_remote().await;

    let verified = TestFixture::with_remote_mode(Some(url.clone()), PushMode::Verified).await;
    let token = verified.principal().await;
    let resp = verified
        .client
        .post(verified.url("/api/sync/push"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["ok"], false);

    let lossy = TestFixture::with_remote_mode(Some(url), PushMode::FireAndForget).await;
    let token = lossy.principal().await;
    let resp = lossy
        .client
        .post(lossy.url("/api/sync/push"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["ok"], true);
}
