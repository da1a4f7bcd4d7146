//! API integration tests
//!
//! The router runs in-process against a fake Alma upstream serving the
//! fixtures in `tests/resources`.

use std::sync::{Arc, Mutex};

use alma_service::{
    api,
    config::AppConfig,
    error::UpstreamFault,
    services::gateway::{QueryParams, UpstreamClient},
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const BIBS_URL: &str = "http://alma.test/almaws/v1/bibs/";
const AVAILABLE: &str = include_str!("../resources/retrieve_bibs_200_response_available.xml");
const MIXED: &str = include_str!("../resources/retrieve_bibs_200_response_mixed.xml");
const HOLDINGS: &str = include_str!("../resources/retrieve_holdings_200_response.xml");
const ITEMS: &str = include_str!("../resources/retrieve_items_200_response.xml");

/// Upstream answering by exact URL and recording every call
#[derive(Default)]
struct FakeUpstream {
    routes: Vec<(String, Result<Vec<u8>, UpstreamFault>)>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeUpstream {
    fn route(mut self, url: &str, response: Result<&str, UpstreamFault>) -> Self {
        self.routes
            .push((url.to_string(), response.map(|body| body.as_bytes().to_vec())));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstream {
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>, UpstreamFault> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), params.to_vec()));

        self.routes
            .iter()
            .find(|(route, _)| route == url)
            .map(|(_, response)| response.clone())
            .unwrap_or(Err(UpstreamFault::Status {
                status: 404,
                reason: "Not Found".to_string(),
            }))
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.alma.host = "http://alma.test".to_string();
    config.alma.endpoint = "/almaws/v1/bibs/".to_string();
    config.alma.api_key = "l7xx-test-key".to_string();
    config
}

fn app(upstream: Arc<FakeUpstream>) -> Router {
    api::create_router(AppState::new(test_config(), upstream))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = tokio_test::assert_ok!(serde_json::from_slice::<Value>(&bytes));
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(
        app(Arc::new(FakeUpstream::default())),
        Request::get("/api/v1/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_requires_gateway_config() {
    let state = AppState::new(AppConfig::default(), Arc::new(FakeUpstream::default()));
    let (status, body) = send(
        api::create_router(state),
        Request::get("/api/v1/ready").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unconfigured");
}

#[tokio::test]
async fn test_readiness_with_loaded_config() {
    let (status, body) = send(
        app(Arc::new(FakeUpstream::default())),
        Request::get("/api/v1/ready").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_bibs_single_available() {
    let upstream = Arc::new(FakeUpstream::default().route(BIBS_URL, Ok(AVAILABLE)));

    let (status, body) = send(
        app(upstream.clone()),
        post_json(
            "/api/v1/bibs?limit_collection=TPTXB",
            json!(["990008536900108238", "990008536900108238"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "990008536900108238--CPMCK": {
                "location": "CPMCK",
                "count": "1",
                "status": "available",
                "call_number": "CLAS170/Iliad of Homer",
                "title": "The Iliad of Homer /",
                "mms_id": "990008536900108238"
            }
        })
    );

    let calls = upstream.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let params = &calls[0].1;
    assert!(params.contains(&("mms_id".to_string(), "990008536900108238".to_string())));
    assert!(params.contains(&("apikey".to_string(), "l7xx-test-key".to_string())));
}

#[tokio::test]
async fn test_bibs_rejects_non_json() {
    let upstream = Arc::new(FakeUpstream::default());
    let request = Request::post("/api/v1/bibs")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("990008536900108238"))
        .unwrap();

    let (status, body) = send(app(upstream.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Request was not JSON");
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn test_bibs_rejects_wrong_shape() {
    let upstream = Arc::new(FakeUpstream::default());

    let (status, body) = send(app(upstream.clone()), post_json("/api/v1/bibs", json!([1, 2]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "Bad Request", "message": "JSON received is not valid."})
    );
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn test_bibs_rejects_long_collection() {
    let upstream = Arc::new(FakeUpstream::default());
    let uri = format!("/api/v1/bibs?limit_collection={}", "X".repeat(65));

    let (status, _) = send(app(upstream.clone()), post_json(&uri, json!(["991"]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn test_textbooks_keep_reserve_copies_only() {
    let upstream = Arc::new(FakeUpstream::default().route(BIBS_URL, Ok(MIXED)));

    let (status, body) = send(
        app(upstream),
        post_json(
            "/api/v1/textbooks?include_course=true",
            json!(["990000000000000001", "990000000000000002", "990000000000000003"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_object().unwrap();
    assert_eq!(
        items.keys().collect::<Vec<_>>(),
        vec![
            "990000000000000001--McKeldin_Library--MATH140",
            "990000000000000002--CPMCK--ECON200",
            "990000000000000003--CPMCK",
        ]
    );
    assert_eq!(body["990000000000000001--McKeldin_Library--MATH140"]["count"], 5);
    assert_eq!(body["990000000000000001--McKeldin_Library--MATH140"]["course"], "MATH140");
    assert_eq!(body["990000000000000003--CPMCK"]["status"], "Check Holding");
}

#[tokio::test]
async fn test_textbooks_with_due_dates() {
    let upstream = Arc::new(
        FakeUpstream::default()
            .route(BIBS_URL, Ok(MIXED))
            .route("http://example.com/bibs/990000000000000002/holdings", Ok(HOLDINGS))
            .route(
                "http://example.com/bibs/990000000000000002/holdings/22200000000008238/items",
                Ok(ITEMS),
            ),
    );

    let (status, body) = send(
        app(upstream.clone()),
        post_json("/api/v1/textbooks?check_holdings=true", json!(["990000000000000002"])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["990000000000000002--CPMCK"]["due_date"], "2023-06-02T03:59:00Z");
    assert_eq!(
        upstream.calls(),
        vec![
            BIBS_URL.to_string(),
            "http://example.com/bibs/990000000000000002/holdings".to_string(),
            "http://example.com/bibs/990000000000000002/holdings/22200000000008238/items".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_bibs_resolve_due_dates_without_collection_filter() {
    let upstream = Arc::new(
        FakeUpstream::default()
            .route(BIBS_URL, Ok(MIXED))
            .route("http://example.com/bibs/990000000000000002/holdings", Ok(HOLDINGS))
            .route(
                "http://example.com/bibs/990000000000000002/holdings/22200000000008238/items",
                Ok(ITEMS),
            ),
    );

    let (status, body) = send(
        app(upstream),
        post_json("/api/v1/bibs?check_holdings=true", json!(["990000000000000002"])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["990000000000000002--CPMCK"]["due_date"], "2023-06-02T03:59:00Z");
    assert!(body["990000000000000001--McKeldin_Library"].get("due_date").is_none());
}

#[tokio::test]
async fn test_holdings() {
    let upstream = Arc::new(FakeUpstream::default().route(
        "http://alma.test/almaws/v1/bibs/990000000000000002/holdings/22200000000008238/items",
        Ok(ITEMS),
    ));

    let (status, body) = send(
        app(upstream),
        post_json("/api/v1/holdings", json!({"990000000000000002": "22200000000008238"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items = &body["990000000000000002"]["22200000000008238"];
    assert_eq!(items.as_object().unwrap().len(), 2);
    assert_eq!(items["31430061234567"], json!({"available": true, "count": 1, "reshelving": "false"}));
}

#[tokio::test]
async fn test_holdings_rejects_list() {
    let (status, body) = send(
        app(Arc::new(FakeUpstream::default())),
        post_json("/api/v1/holdings", json!(["990000000000000002"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "JSON received is not valid.");
}

#[tokio::test]
async fn test_zero_bibs_is_bad_gateway() {
    let upstream = Arc::new(FakeUpstream::default().route(BIBS_URL, Ok(r#"<bibs total_record_count="0"/>"#)));

    let (status, body) = send(app(upstream), post_json("/api/v1/bibs", json!(["991"]))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);
}

#[tokio::test]
async fn test_upstream_faults_pass_through() {
    let cases = [
        (UpstreamFault::BadRequest, StatusCode::BAD_REQUEST),
        (UpstreamFault::ServerError, StatusCode::INTERNAL_SERVER_ERROR),
        (
            UpstreamFault::Status {
                status: 429,
                reason: "Too Many Requests".to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (UpstreamFault::Timeout, StatusCode::GATEWAY_TIMEOUT),
        (UpstreamFault::Transport("connection refused".to_string()), StatusCode::BAD_GATEWAY),
    ];

    for (fault, expected) in cases {
        let upstream = Arc::new(FakeUpstream::default().route(BIBS_URL, Err(fault)));
        let (status, body) = send(app(upstream), post_json("/api/v1/bibs", json!(["991"]))).await;
        assert_eq!(status, expected);
        assert_eq!(body["status"], expected.as_u16());
    }
}

#[tokio::test]
async fn test_openapi_document() {
    let (status, body) = send(
        app(Arc::new(FakeUpstream::default())),
        Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/bibs"]["post"].is_object());
}
