mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use common::{state, store_in, FixedClock, RecordingAnnouncer};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use timebell_server::app;
use timebell_store::ConfigStore;
use timebell_types::{Config, PlayRequest};
use timebell_voice::{AnnouncementPipeline, PlaybackEngine, TtsClient, TtsConfig};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNREACHABLE_TTS: &str = "http://127.0.0.1:9";

fn json_request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

struct Harness {
    store: ConfigStore,
    announcer: Arc<RecordingAnnouncer>,
    clock: Arc<FixedClock>,
    router: axum::Router,
    _dir: tempfile::TempDir,
}

fn harness_with_tts(tts_url: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let announcer = RecordingAnnouncer::new();
    let clock = FixedClock::at(10, 15);
    let router = app(state(
        store.clone(),
        announcer.clone(),
        clock.clone(),
        tts_url,
    ));
    Harness {
        store,
        announcer,
        clock,
        router,
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with_tts(UNREACHABLE_TTS)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let response = h
        .router
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn save_then_get_round_trips() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/save",
            r#"{"times":[7,12,19],"speaker":"3"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "success"}));

    let response = h
        .router
        .oneshot(empty_request(Method::GET, "/api/config"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"times": [7, 12, 19], "speaker": "3"})
    );

    // The saved value reached disk too.
    let reopened = ConfigStore::open(h.store.path()).unwrap();
    assert_eq!(reopened.get(), Config::new(vec![7, 12, 19], "3"));
}

#[tokio::test]
async fn get_config_on_fresh_install_is_empty() {
    let h = harness();
    let response = h
        .router
        .oneshot(empty_request(Method::GET, "/api/config"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"times": [], "speaker": ""}));
}

#[tokio::test]
async fn save_with_missing_fields_uses_defaults() {
    let h = harness();
    let response = h
        .router
        .oneshot(json_request(Method::POST, "/api/save", r#"{"speaker":"1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.store.get(), Config::new(vec![], "1"));
}

#[tokio::test]
async fn save_rejects_malformed_json() {
    let h = harness();
    h.store.set(Config::new(vec![8], "1")).await.unwrap();

    let response = h
        .router
        .oneshot(json_request(Method::POST, "/api/save", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
    assert_eq!(h.store.get(), Config::new(vec![8], "1"));
}

#[tokio::test]
async fn save_rejects_out_of_range_hours() {
    let h = harness();
    let response = h
        .router
        .oneshot(json_request(
            Method::POST,
            "/api/save",
            r#"{"times":[7,24],"speaker":"1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.store.get(), Config::default());
}

#[tokio::test]
async fn save_reports_persistence_failure_as_500() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let store = ConfigStore::empty(blocker.join("config.json"));
    let router = app(state(
        store.clone(),
        RecordingAnnouncer::new(),
        FixedClock::at(0, 0),
        UNREACHABLE_TTS,
    ));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/save",
            r#"{"times":[7],"speaker":"1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["status"], "error");
    assert_eq!(store.get(), Config::default());
}

#[tokio::test]
async fn wrong_methods_are_rejected() {
    let h = harness();
    for (method, uri) in [
        (Method::GET, "/api/save"),
        (Method::GET, "/api/play"),
        (Method::POST, "/api/config"),
        (Method::GET, "/api/announce"),
        (Method::DELETE, "/api/speakers"),
    ] {
        let response = h
            .router
            .clone()
            .oneshot(empty_request(method.clone(), uri))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {uri}"
        );
    }
}

#[tokio::test]
async fn play_dispatches_and_answers_immediately() {
    let h = harness();
    let response = h
        .router
        .oneshot(json_request(
            Method::POST,
            "/api/play",
            r#"{"speaker":"2","hour":9}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "playing"}));
    assert_eq!(h.announcer.dispatched(), vec![PlayRequest::new("2", 9)]);
}

#[tokio::test]
async fn play_rejects_bad_bodies() {
    let h = harness();
    for body in [
        "{broken",
        r#"{"speaker":"2","hour":24}"#,
        r#"{"speaker":"2","hour":-1}"#,
        r#"{"speaker":"2"}"#,
    ] {
        let response = h
            .router
            .clone()
            .oneshot(json_request(Method::POST, "/api/play", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
    assert!(h.announcer.dispatched().is_empty());
}

#[tokio::test]
async fn play_does_not_wait_for_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let tts = TtsClient::new(&TtsConfig::new(UNREACHABLE_TTS));
    let pipeline = Arc::new(AnnouncementPipeline::new(
        tts,
        PlaybackEngine::new(Vec::new(), dir.path()),
    ));
    let router = app(state(store, pipeline, FixedClock::at(0, 0), UNREACHABLE_TTS));

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        router.oneshot(json_request(
            Method::POST,
            "/api/play",
            r#"{"speaker":"1","hour":3}"#,
        )),
    )
    .await
    .expect("play should answer without waiting for synthesis")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn announce_uses_the_clock_hour_and_configured_speaker() {
    let h = harness();
    h.store.set(Config::new(vec![], "8")).await.unwrap();
    h.clock.set(17, 42);

    let response = h
        .router
        .oneshot(empty_request(Method::POST, "/api/announce"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "playing", "hour": 17})
    );
    assert_eq!(h.announcer.dispatched(), vec![PlayRequest::new("8", 17)]);
}

#[tokio::test]
async fn announce_without_speaker_is_rejected() {
    let h = harness();
    let response = h
        .router
        .oneshot(empty_request(Method::POST, "/api/announce"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.announcer.dispatched().is_empty());
}

#[tokio::test]
async fn speakers_are_relayed_from_the_engine() {
    let server = MockServer::start().await;
    let catalogue = json!([{"name": "ずんだもん", "styles": [{"name": "ノーマル", "id": 3}]}]);
    Mock::given(method("GET"))
        .and(path("/speakers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&catalogue))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness_with_tts(&server.uri());
    let response = h
        .router
        .oneshot(empty_request(Method::GET, "/api/speakers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(response).await, catalogue);
}

#[tokio::test]
async fn speakers_unreachable_engine_is_bad_gateway() {
    let h = harness();
    let response = h
        .router
        .oneshot(empty_request(Method::GET, "/api/speakers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let h = harness();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/save")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = h.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn frontend_is_served_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let frontend = dir.path().join("frontend");
    std::fs::create_dir(&frontend).unwrap();
    std::fs::write(frontend.join("index.html"), "<h1>timebell</h1>").unwrap();

    let mut app_state = state(
        store_in(dir.path()),
        RecordingAnnouncer::new(),
        FixedClock::at(0, 0),
        UNREACHABLE_TTS,
    );
    app_state.frontend_dir = Some(frontend);
    let router = app(app_state);

    let response = router
        .oneshot(empty_request(Method::GET, "/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>timebell</h1>");
}
