//! HTTP client for the build-and-run service

use std::time::Duration;

use async_trait::async_trait;
use build_api::models::{
    BuildAndRunResponse, ErrorResponse, FIELD_DOCKERFILE, FIELD_ENDPOINT, FIELD_IMAGE_NAME,
    FIELD_ZIP_FILE,
};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::app::options::BackendOptions;
use crate::errors::ClientError;
use crate::form::state::BuildRequest;

pub const GENERIC_SERVER_ERROR: &str = "An error occurred while processing your request.";

/// Why a submission failed, phrased for the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The service answered with an error; message shown verbatim
    #[error("{0}")]
    Server(String),

    /// The request went out but nothing came back
    #[error("No response received from the server. Please try again later.")]
    NoResponse,

    /// The request could not be built or sent
    #[error("An error occurred while sending the request. Please try again.")]
    SendFailed,
}

impl SubmitError {
    /// Server failure carrying the payload's `error` field, or the generic
    /// message when the payload has none
    pub fn from_error_body(body: &str) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|payload| payload.error)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string());
        SubmitError::Server(message)
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            SubmitError::SendFailed
        } else {
            SubmitError::NoResponse
        }
    }
}

/// Build-and-run operations; implemented over HTTP by [`BuildClient`]
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Submit one build and return the result URLs
    async fn build_and_run(&self, request: BuildRequest) -> Result<Vec<Option<String>>, SubmitError>;
}

/// HTTP client for the build service
pub struct BuildClient {
    client: Client,
    stream_client: Client,
    base_url: String,
}

impl BuildClient {
    /// Create a new HTTP client
    pub fn new(options: &BackendOptions) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.build_timeout)
            .build()?;

        // No overall timeout: the log stream stays open for the whole session.
        let stream_client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            stream_client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn build_and_run_url(&self) -> String {
        format!("{}/build_and_run", self.base_url)
    }

    pub fn logs_url(&self) -> String {
        format!("{}/logs", self.base_url)
    }

    /// Client suited to long-lived server-push connections
    pub fn stream_client(&self) -> Client {
        self.stream_client.clone()
    }

    fn multipart(request: BuildRequest) -> Result<Form, SubmitError> {
        let BuildRequest {
            image_name,
            endpoint,
            dockerfile,
            archive,
        } = request;

        let archive_part = Part::bytes(archive.bytes)
            .file_name(archive.filename)
            .mime_str("application/zip")
            .map_err(|e| {
                error!("Unable to encode archive part: {}", e);
                SubmitError::SendFailed
            })?;

        Ok(Form::new()
            .part(
                FIELD_DOCKERFILE,
                Part::bytes(dockerfile.bytes).file_name(dockerfile.filename),
            )
            .part(FIELD_ZIP_FILE, archive_part)
            .text(FIELD_IMAGE_NAME, image_name)
            .text(FIELD_ENDPOINT, endpoint))
    }
}

#[async_trait]
impl BuildService for BuildClient {
    async fn build_and_run(&self, request: BuildRequest) -> Result<Vec<Option<String>>, SubmitError> {
        let url = self.build_and_run_url();
        debug!("POST {} (image {:?})", url, request.image_name);

        let form = Self::multipart(request)?;
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Build request failed: {}", e);
                SubmitError::from(e)
            })?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Unable to read build response body ({}): {}", status, e);
                String::new()
            }
        };

        if !status.is_success() {
            error!("Build failed: {} - {}", status, body);
            return Err(SubmitError::from_error_body(&body));
        }

        match serde_json::from_str::<BuildAndRunResponse>(&body) {
            Ok(parsed) => Ok(parsed.urls),
            Err(e) => {
                error!("Malformed build response: {} - {}", e, body);
                Err(SubmitError::Server(GENERIC_SERVER_ERROR.to_string()))
            }
        }
    }
}
