//! API models

use serde::{Deserialize, Serialize};

/// Multipart field carrying the Dockerfile
pub const FIELD_DOCKERFILE: &str = "Dockerfile";

/// Multipart field carrying the zipped build context
pub const FIELD_ZIP_FILE: &str = "zip_file";

/// Multipart field carrying the image name
pub const FIELD_IMAGE_NAME: &str = "image_name";

/// Multipart field carrying the exposed port
pub const FIELD_ENDPOINT: &str = "endpoint";

/// Successful build-and-run response
///
/// Entries may be `null` when the service could not resolve a URL for one of
/// the started containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildAndRunResponse {
    pub urls: Vec<Option<String>>,
}

/// Error response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<u16>,
}
