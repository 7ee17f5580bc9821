use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use librarian_api::{app, config::ServerConfig, metrics, state::AppState};
use librarian_core::{Librarian, LibrarianConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const HOMEPAGE: &str = "http://example.org/librarian";

async fn app_with(config: Value) -> Router {
    app_with_server(config, ServerConfig::default()).await
}

async fn app_with_server(config: Value, server: ServerConfig) -> Router {
    let config = LibrarianConfig::from_json_str("test", &config.to_string()).unwrap();
    let librarian = Librarian::from_config(&config).await.unwrap();
    let registry = metrics::registry().unwrap();
    app(AppState::new(librarian, registry, HOMEPAGE), &server)
}

fn quiet(input_type: &str, tag: &str) -> Value {
    let mut config = print_everything(input_type, tag);
    config["LABEL_ACTOR_CONFIG"] = json!({"actor": "none"});
    config["DATA_ACTOR_CONFIG"] = json!({"actor": "none"});
    config
}

fn multipart(field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = format!(
        "--XBOUNDARY\r\nContent-Disposition: {}\r\nContent-Type: application/octet-stream\r\n\r\n",
        disposition
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");

    Request::builder()
        .method(Method::POST)
        .uri("/put")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap()
}

const THREE_MIB: usize = 3 * 1024 * 1024;

fn print_everything(input_type: &str, tag: &str) -> Value {
    json!({
        "INPUT_CONFIG": {"type": input_type, "tag": tag},
        "CROSS_VALID_CONFIG": {"validator": "none"},
        "LABEL_VALID_CONFIG": {"validator": "none"},
        "DATA_VALID_CONFIG": {"validator": "none"},
        "LABEL_ACTOR_CONFIG": {"actor": "print"},
        "DATA_ACTOR_CONFIG": {"actor": "print"}
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_json_put_with_print_actors() {
    let app = app_with(print_everything("json", "")).await;
    let (status, body) = send(
        app,
        post_json("/put?project=cats&n=3", json!({"filename": "a.txt", "val": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Labels and data processed successfully:"));
    assert!(message.contains("\tLabel response: \tDATA: {project: \"cats\", n: 3}"));
    assert!(message.contains("\tData response: \tDATA: {\"filename\":\"a.txt\",\"val\":1}"));

    let uid = body["uid"].as_str().unwrap();
    assert_eq!(uid.len(), 24);
    assert!(body["label_response"].as_str().unwrap().contains(uid));
    assert!(body["data_response"].as_str().unwrap().contains(uid));
}

#[tokio::test]
async fn test_file_validator_rejects_wrong_extension() {
    let mut config = print_everything("json", "");
    config["DATA_VALID_CONFIG"] = json!({"validator": "file", "args": [[".png"]]});
    let app = app_with(config).await;

    let (status, body) = send(app, post_json("/put", json!({"filename": "a.txt", "val": 1}))).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "ValidationFailed");
    assert!(body["message"].as_str().unwrap().contains("extension"));
}

#[tokio::test]
async fn test_unsupported_input_type() {
    let mut config = print_everything("xml", "");
    config["LABEL_VALID_CONFIG"] = json!({"validator": "key", "args": [["never"]]});
    let app = app_with(config).await;

    let (status, body) = send(app, post_json("/put", json!({"val": 1}))).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["message"], "Invalid data type");
    assert_eq!(body["code"], 406);
}

#[tokio::test]
async fn test_missing_data_tag() {
    let app = app_with(print_everything("json", "data")).await;

    let (status, body) = send(app.clone(), post_json("/put", json!({"other": 1}))).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["message"], "Data tag not found");

    let (status, _) = send(app, post_json("/put", json!({"data": []}))).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_label_validation_runs_first() {
    let mut config = print_everything("json", "");
    config["LABEL_VALID_CONFIG"] = json!([
        {"validator": "key", "args": [["project"]]},
        {"validator": "type", "kwargs": {"config": {"project": "str"}}}
    ]);
    let app = app_with(config).await;

    let (status, _) = send(app.clone(), post_json("/put?project=cats", json!({"v": 1}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, post_json("/put?project=7", json!({"v": 1}))).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("LABEL validation failed: composite[1].type"));
}

#[tokio::test]
async fn test_cross_validator_compares_filenames() {
    let mut config = print_everything("json", "");
    config["CROSS_VALID_CONFIG"] = json!({"validator": "fname"});
    let app = app_with(config).await;

    let (status, _) = send(
        app.clone(),
        post_json("/put?filename=a.txt", json!({"filename": "a.txt"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, post_json("/put?filename=b.txt", json!({"filename": "a.txt"}))).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["message"].as_str().unwrap().starts_with("CROSS validation failed"));
}

#[tokio::test]
async fn test_base64_upload_is_saved_under_label_filename() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = print_everything("base64", "img");
    config["DATA_ACTOR_CONFIG"] = json!({"actor": "file", "args": [tmp.path()]});
    let app = app_with(config).await;

    let encoded = format!("data:text/plain;base64,{}", STANDARD.encode(b"hello librarian"));
    let form = format!("img={}", encoded.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D"));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/put?filename=note.txt")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();

    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let saved = std::fs::read(tmp.path().join("note.txt")).unwrap();
    assert_eq!(saved, b"hello librarian");
}

#[tokio::test]
async fn test_multipart_upload_is_saved() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = print_everything("file", "upload");
    config["DATA_VALID_CONFIG"] = json!({"validator": "file", "args": [[".txt"]]});
    config["DATA_ACTOR_CONFIG"] = json!({"actor": "file", "kwargs": {"directory": tmp.path()}});
    let app = app_with(config).await;

    let body = "--XBOUNDARY\r\n\
                Content-Disposition: form-data; name=\"upload\"; filename=\"cat.txt\"\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                meow\r\n\
                --XBOUNDARY--\r\n";
    let req = Request::builder()
        .method(Method::POST)
        .uri("/put?animal=cat")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data_response"], "File saved successfully");
    assert_eq!(std::fs::read(tmp.path().join("cat.txt")).unwrap(), b"meow");
}

#[tokio::test]
async fn test_label_actor_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let unwritable = tmp.path().join("missing").join("labels.json");
    let mut config = print_everything("json", "");
    config["LABEL_ACTOR_CONFIG"] = json!({"actor": "json", "args": [unwritable]});
    let app = app_with(config).await;

    let (status, body) = send(app, post_json("/put?a=1", json!({"v": 1}))).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "LabelActorFailed");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error occurred during LABEL actor: json:"));
}

#[tokio::test]
async fn test_data_actor_failure_keeps_label_side_effect() {
    let tmp = tempfile::tempdir().unwrap();
    let labels_file = tmp.path().join("labels.json");
    let mut config = print_everything("json", "");
    config["LABEL_ACTOR_CONFIG"] = json!({"actor": "json", "args": [labels_file]});
    config["DATA_ACTOR_CONFIG"] = json!({"actor": "file", "args": [tmp.path().join("files")]});
    let app = app_with(config).await;

    let (status, body) = send(app, post_json("/put?a=1", json!({"v": 1}))).await;
    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error occurred during DATA actor: file:"));

    let stored: Value = serde_json::from_slice(&std::fs::read(&labels_file).unwrap()).unwrap();
    assert_eq!(stored[0]["a"], 1);
}

#[tokio::test]
async fn test_index_redirects_to_homepage() {
    let app = app_with(print_everything("json", "")).await;
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], HOMEPAGE);
}

#[tokio::test]
async fn test_get_is_not_implemented() {
    let app = app_with(print_everything("json", "")).await;
    let req = Request::builder().uri("/get").body(Body::empty()).unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "API call not implemented");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app_with(print_everything("json", "")).await;
    let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let app = app_with(print_everything("json", "")).await;
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/put")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let app = app_with(print_everything("json", "")).await;
    let (status, _) = send(app.clone(), post_json("/put", json!({"v": 1}))).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("librarian_put_outcomes_total{outcome=\"accepted\"}"));
    assert!(text.contains("librarian_http_requests_total"));
}

#[tokio::test]
async fn test_incompatible_actor_is_a_startup_error() {
    let mut config = print_everything("json", "");
    config["LABEL_ACTOR_CONFIG"] = json!({"actor": "image", "args": ["/tmp/never"]});
    let config = LibrarianConfig::from_json_str("test", &config.to_string()).unwrap();
    assert!(Librarian::from_config(&config).await.is_err());
}

#[tokio::test]
async fn test_large_json_body_is_accepted() {
    let app = app_with(quiet("json", "")).await;
    let blob = "a".repeat(THREE_MIB);
    let (status, body) = send(app, post_json("/put", json!({"blob": blob}))).await;
    assert_eq!(status, StatusCode::OK, "{}", body["message"]);
}

#[tokio::test]
async fn test_large_file_upload_is_accepted() {
    let app = app_with(quiet("file", "upload")).await;
    let content = vec![0xAB; THREE_MIB];
    let (status, body) = send(app, multipart("upload", Some("big.jpg"), &content)).await;
    assert_eq!(status, StatusCode::OK, "{}", body["message"]);
}

#[tokio::test]
async fn test_body_over_configured_limit() {
    let server = ServerConfig {
        body_limit: Some(1024),
        ..ServerConfig::default()
    };
    let app = app_with_server(quiet("json", ""), server.clone()).await;
    let blob = "a".repeat(4096);
    let (status, body) = send(app, post_json("/put", json!({"blob": blob}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PayloadTooLarge");

    let app = app_with_server(quiet("file", "upload"), server).await;
    let (status, _) = send(app, multipart("upload", Some("big.jpg"), &[1u8; 4096])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unlimited_body() {
    let server = ServerConfig {
        body_limit: None,
        ..ServerConfig::default()
    };
    let app = app_with_server(quiet("json", ""), server).await;
    let blob = "a".repeat(THREE_MIB);
    let (status, _) = send(app, post_json("/put", json!({"blob": blob}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_multipart_text_field_is_not_a_file() {
    let app = app_with(quiet("file", "upload")).await;
    let (status, body) = send(app, multipart("upload", None, b"just text")).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["message"], "Data tag not found");
}
