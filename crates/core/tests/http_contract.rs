//! HTTP contract tests.
//!
//! These tests run the real platform and recognition clients against an
//! in-process HTTP server and check what goes over the wire and how each
//! reply is classified.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use showgrab_core::{
    captcha::{CaptchaError, CaptchaRequest, CaptchaSolver, RecognitionClient},
    catalog::{ShowPlatform, TicketPlatform},
    client::{AuthenticatedClient, ClientError},
    config::{CaptchaConfig, PlatformConfig, SessionConfig},
    order::{build_order, OrderSelection},
    testing::fixtures,
};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
struct SeenRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: String,
}

#[derive(Default)]
struct MockState {
    /// Canned (status, body) per path; unknown paths get 404.
    routes: HashMap<String, (u16, String)>,
    /// Time to wait before answering, per path.
    delays: HashMap<String, Duration>,
    seen: Vec<SeenRequest>,
}

type Shared = Arc<Mutex<MockState>>;

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let delay = state.lock().unwrap().delays.get(uri.path()).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    state.seen.push(SeenRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    let (status, body) = state
        .routes
        .get(uri.path())
        .cloned()
        .unwrap_or((404, "not found".to_string()));
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

struct MockServer {
    addr: SocketAddr,
    state: Shared,
}

impl MockServer {
    async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn route(&self, path: &str, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), (status, body.to_string()));
    }

    fn delay(&self, path: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(path.to_string(), delay);
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().seen.clone()
    }

    fn platform(&self) -> ShowPlatform {
        let config = PlatformConfig {
            base_url: self.url(),
            passport_url: self.url(),
            ..Default::default()
        };
        ShowPlatform::new(&SessionConfig::with_token("SESSDATA=abc; bili_jct=xyz"), config)
            .unwrap()
    }

    fn recognizer(&self) -> RecognitionClient {
        self.recognizer_with_timeout(60)
    }

    fn recognizer_with_timeout(&self, timeout_secs: u64) -> RecognitionClient {
        let config: CaptchaConfig = serde_json::from_value(json!({
            "app_key": "key-1",
            "endpoint": format!("{}/api/recognize.html", self.url()),
            "timeout_secs": timeout_secs,
        }))
        .unwrap();
        RecognitionClient::new(&config).unwrap()
    }
}

fn envelope(data: Value) -> Value {
    json!({ "errno": 0, "code": 0, "msg": "", "data": data })
}

fn login_required() -> Value {
    json!({ "errno": 0, "code": -101, "msg": "请先登录", "data": {} })
}

fn project_data() -> Value {
    json!({
        "id": 7,
        "name": "Summer Festival",
        "venue_info": { "name": "Expo Hall", "address_detail": "1 Harbour Road" },
        "screen_list": [{
            "id": 11,
            "name": "Day 1",
            "ticket_list": [{ "id": 501, "desc": "Standard", "price": 100, "sale_flag": "On sale" }]
        }]
    })
}

fn captcha_request() -> CaptchaRequest {
    CaptchaRequest {
        app_key: "key-1".to_string(),
        challenge: fixtures::challenge(),
        referer: "https://show.bilibili.com/".to_string(),
        extra_options: Default::default(),
    }
}

// ============================================================================
// Platform
// ============================================================================

#[tokio::test]
async fn test_project_lookup_sends_session_headers() {
    let server = MockServer::start().await;
    server.route("/api/ticket/project/getV2", 200, envelope(project_data()));

    let project = server.platform().get_ticket_info(7).await.unwrap();
    assert_eq!(project.id, 7);
    assert_eq!(project.screens[0].skus[0].price, 100);

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.headers[header::COOKIE], "SESSDATA=abc; bili_jct=xyz");
    assert_eq!(request.headers[header::REFERER], "https://show.bilibili.com/");
    assert!(request.headers.contains_key(header::USER_AGENT));
    assert!(request.headers.contains_key(header::ACCEPT_LANGUAGE));

    let query = request.query.clone().unwrap_or_default();
    assert!(query.contains("version=134"));
    assert!(query.contains("id=7"));
    assert!(query.contains("project_id=7"));
}

#[tokio::test]
async fn test_login_marker_is_authentication_expired() {
    let server = MockServer::start().await;
    server.route("/api/ticket/project/getV2", 200, login_required());

    let result = server.platform().get_ticket_info(7).await;
    assert!(matches!(result, Err(ClientError::AuthenticationExpired)));
}

#[tokio::test]
async fn test_login_marker_wins_over_http_status() {
    let server = MockServer::start().await;
    server.route("/api/ticket/addr/list", 401, login_required());

    let result = server.platform().get_address_list().await;
    assert!(matches!(result, Err(ClientError::AuthenticationExpired)));
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    server.route("/api/ticket/addr/list", 500, json!({ "msg": "internal" }));

    let result = server.platform().get_address_list().await;
    assert!(matches!(result, Err(ClientError::Transport { status: 500 })));
}

#[tokio::test]
async fn test_slow_platform_times_out_at_session_deadline() {
    let server = MockServer::start().await;
    server.route("/api/ticket/addr/list", 200, envelope(json!([])));
    server.delay("/api/ticket/addr/list", Duration::from_secs(3));

    // Default session deadline is 1000 ms.
    let started = Instant::now();
    let result = server.platform().get_address_list().await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(ClientError::Timeout)), "{:?}", result);
    assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_session_timeout_is_configurable() {
    let server = MockServer::start().await;
    server.route("/api/ticket/addr/list", 200, envelope(json!([])));
    server.delay("/api/ticket/addr/list", Duration::from_millis(600));

    let mut session = SessionConfig::with_token("SESSDATA=abc");
    session.timeout_ms = 200;
    let config = PlatformConfig {
        base_url: server.url(),
        passport_url: server.url(),
        ..Default::default()
    };
    let platform = ShowPlatform::new(&session, config).unwrap();

    let started = Instant::now();
    let result = platform.get_address_list().await;
    assert!(matches!(result, Err(ClientError::Timeout)), "{:?}", result);
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn test_buyer_list_request_and_decode() {
    let server = MockServer::start().await;
    server.route(
        "/api/ticket/buyer/list",
        200,
        envelope(json!([
            { "id": 1, "name": "A", "tel": "111" },
            { "id": 2, "buyer_name": "B", "buyer_phone": "222" }
        ])),
    );

    let buyers = server.platform().get_buyer_list(7).await.unwrap();
    assert_eq!(buyers.len(), 2);
    assert_eq!(buyers[1].name, "B");
    assert_eq!(buyers[1].tel, "222");

    let query = server.seen()[0].query.clone().unwrap_or_default();
    assert!(query.contains("is_default"));
    assert!(query.contains("projectId=7"));
}

#[tokio::test]
async fn test_non_array_list_is_malformed() {
    let server = MockServer::start().await;
    server.route(
        "/api/ticket/buyer/list",
        200,
        envelope(json!({ "list": [] })),
    );
    server.route("/api/ticket/addr/list", 200, envelope(Value::Null));

    let platform = server.platform();
    assert!(matches!(
        platform.get_buyer_list(7).await,
        Err(ClientError::MalformedResponse(_))
    ));
    assert!(matches!(
        platform.get_address_list().await,
        Err(ClientError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_challenge_fetch_omits_session() {
    let server = MockServer::start().await;
    server.route(
        "/x/passport-login/captcha",
        200,
        json!({ "code": 0, "data": { "geetest": { "gt": "gt-9", "challenge": "ch-9" } } }),
    );

    let challenge = server.platform().fetch_captcha_challenge().await.unwrap();
    assert_eq!(challenge.gt, "gt-9");
    assert_eq!(challenge.challenge, "ch-9");

    let request = &server.seen()[0];
    assert!(!request.headers.contains_key(header::COOKIE));
    assert_eq!(request.query.as_deref(), Some("source=main_web"));
}

#[tokio::test]
async fn test_create_order_posts_json() {
    let server = MockServer::start().await;
    server.route(
        "/api/order/create",
        200,
        envelope(json!({ "orderId": 4242 })),
    );

    let project = fixtures::project(7, 100, true);
    let payload = build_order(
        &project,
        &OrderSelection::default(),
        &[fixtures::buyer(1, "A", "111")],
        &[fixtures::address(9)],
    )
    .unwrap();
    let mut captcha = serde_json::Map::new();
    captcha.insert("validate".to_string(), json!("v-1"));
    let order = payload.attach_captcha(captcha);

    let response = server.platform().create_order(&order).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.data["orderId"], 4242);

    let request = &server.seen()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/order/create");
    assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
    assert!(request.headers.contains_key(header::COOKIE));

    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["pay_money"], 100);
    assert_eq!(body["name"], "A");
    assert_eq!(body["phone"], "111");
    assert_eq!(body["validate"], "v-1");
    assert_eq!(body["deliver_info"]["addr_id"], 9);
}

#[tokio::test]
async fn test_rejected_order_is_returned_as_envelope() {
    let server = MockServer::start().await;
    server.route(
        "/api/order/create",
        200,
        json!({ "errno": 100009, "msg": "库存不足", "data": {} }),
    );

    let project = fixtures::project(7, 100, false);
    let order = build_order(
        &project,
        &OrderSelection::default(),
        &[fixtures::buyer(1, "A", "111")],
        &[fixtures::address(9)],
    )
    .unwrap()
    .attach_captcha(Default::default());

    let response = server.platform().create_order(&order).await.unwrap();
    assert!(!response.is_success());
    assert_eq!(response.code, 100009);
    assert_eq!(response.message, "库存不足");
}

#[tokio::test]
async fn test_form_post_carries_session_and_detects_login() {
    let server = MockServer::start().await;
    server.route("/api/ticket/order/prepare", 200, login_required());

    let client = AuthenticatedClient::new(&SessionConfig::with_token("SESSDATA=abc"), "请先登录")
        .unwrap();
    let result = client
        .post_form(
            &format!("{}/api/ticket/order/prepare", server.url()),
            &[("project_id", "7"), ("count", "1")],
        )
        .await;
    assert!(matches!(result, Err(ClientError::AuthenticationExpired)));

    let request = &server.seen()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.headers[header::COOKIE], "SESSDATA=abc");
    assert_eq!(
        request.headers[header::CONTENT_TYPE],
        "application/x-www-form-urlencoded"
    );
    assert_eq!(request.body, "project_id=7&count=1");
}

// ============================================================================
// Recognition service
// ============================================================================

#[tokio::test]
async fn test_recognizer_posts_form_and_returns_solution() {
    let server = MockServer::start().await;
    server.route(
        "/api/recognize.html",
        200,
        json!({
            "status": 0,
            "msg": "ok",
            "data": { "challenge": "challenge-0001", "validate": "v-77", "seccode": "v-77|jordan" }
        }),
    );

    let solution = server.recognizer().solve(&captcha_request()).await.unwrap();
    assert_eq!(solution.get("validate"), Some(&json!("v-77")));

    let request = &server.seen()[0];
    assert_eq!(request.method, Method::POST);
    assert!(!request.headers.contains_key(header::COOKIE));
    assert!(request.body.contains("appkey=key-1"));
    assert!(request.body.contains("gt=gt-0001"));
    assert!(request.body.contains("challenge=challenge-0001"));
}

#[tokio::test]
async fn test_recognizer_nonzero_status_is_solve_failure() {
    let server = MockServer::start().await;
    server.route(
        "/api/recognize.html",
        200,
        json!({ "status": -1, "msg": "insufficient balance" }),
    );

    let result = server.recognizer().solve(&captcha_request()).await;
    match result {
        Err(CaptchaError::SolveFailure { message }) => {
            assert_eq!(message, "insufficient balance")
        }
        other => panic!("expected solve failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recognizer_http_error_is_transport() {
    let server = MockServer::start().await;
    server.route("/api/recognize.html", 503, json!({}));

    let result = server.recognizer().solve(&captcha_request()).await;
    assert!(matches!(result, Err(CaptchaError::Transport { status: 503 })));
}

#[tokio::test]
async fn test_recognizer_times_out_at_configured_deadline() {
    let server = MockServer::start().await;
    server.route(
        "/api/recognize.html",
        200,
        json!({ "status": 0, "data": { "validate": "late" } }),
    );
    server.delay("/api/recognize.html", Duration::from_secs(3));

    let started = Instant::now();
    let result = server
        .recognizer_with_timeout(1)
        .solve(&captcha_request())
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(CaptchaError::Timeout)), "{:?}", result);
    assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2500), "elapsed {:?}", elapsed);
}
