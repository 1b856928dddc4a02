//! Build client tests against the fake build service

use axum::http::StatusCode;
use serde_json::json;

use buildrun::app::options::BackendOptions;
use buildrun::http::client::{BuildClient, BuildService, SubmitError, GENERIC_SERVER_ERROR};

use crate::common::{build_request, FakeBuildService, Reply};

fn client_for(base_url: &str) -> BuildClient {
    BuildClient::new(&BackendOptions {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_success_returns_urls_and_sends_all_fields() {
    let service = FakeBuildService::start(
        Reply::json(
            StatusCode::OK,
            json!({"urls": ["http://localhost:8080", null, "http://localhost:8081"]}),
        ),
        &[],
    )
    .await;

    let urls = client_for(&service.base_url)
        .build_and_run(build_request())
        .await
        .unwrap();
    assert_eq!(
        urls,
        vec![
            Some("http://localhost:8080".to_string()),
            None,
            Some("http://localhost:8081".to_string()),
        ]
    );

    let fields = service.received();
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Dockerfile", "zip_file", "image_name", "endpoint"]);

    assert_eq!(fields[0].file_name.as_deref(), Some("Dockerfile"));
    assert_eq!(fields[0].data, b"FROM alpine\nCMD [\"sh\"]\n".to_vec());
    assert_eq!(fields[1].file_name.as_deref(), Some("app.zip"));
    assert_eq!(fields[1].data, vec![0x50, 0x4b, 0x03, 0x04]);
    assert_eq!(fields[2].data, b"web".to_vec());
    assert_eq!(fields[3].data, b"8080".to_vec());
}

#[tokio::test]
async fn test_error_payload_shown_verbatim() {
    let service = FakeBuildService::start(
        Reply::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Docker build failed: COPY failed: no source files", "status": 500}),
        ),
        &[],
    )
    .await;

    let result = client_for(&service.base_url).build_and_run(build_request()).await;
    assert_eq!(
        result,
        Err(SubmitError::Server(
            "Docker build failed: COPY failed: no source files".to_string()
        ))
    );
}

#[tokio::test]
async fn test_error_payload_without_error_field() {
    let service = FakeBuildService::start(
        Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"message": "image_name is required", "status": 400}),
        ),
        &[],
    )
    .await;

    let result = client_for(&service.base_url).build_and_run(build_request()).await;
    assert_eq!(result, Err(SubmitError::Server(GENERIC_SERVER_ERROR.to_string())));
}

#[tokio::test]
async fn test_non_json_error_body() {
    let service =
        FakeBuildService::start(Reply::text(StatusCode::BAD_GATEWAY, "Bad Gateway"), &[]).await;

    let result = client_for(&service.base_url).build_and_run(build_request()).await;
    assert_eq!(result, Err(SubmitError::Server(GENERIC_SERVER_ERROR.to_string())));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let service = FakeBuildService::start(Reply::text(StatusCode::OK, "done"), &[]).await;

    let result = client_for(&service.base_url).build_and_run(build_request()).await;
    assert_eq!(result, Err(SubmitError::Server(GENERIC_SERVER_ERROR.to_string())));
}

#[tokio::test]
async fn test_unreachable_service_is_no_response() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client_for(&format!("http://{}/api/v1", addr))
        .build_and_run(build_request())
        .await;
    assert_eq!(result, Err(SubmitError::NoResponse));
    assert_eq!(
        result.unwrap_err().to_string(),
        "No response received from the server. Please try again later."
    );
}

#[tokio::test]
async fn test_unsendable_request_is_send_failure() {
    let result = client_for("http://[::1/api/v1")
        .build_and_run(build_request())
        .await;
    assert_eq!(result, Err(SubmitError::SendFailed));
    assert_eq!(
        result.unwrap_err().to_string(),
        "An error occurred while sending the request. Please try again."
    );
}
