//! Form state holder

use crate::errors::ClientError;
use crate::filesys::file::File;

/// A selected file, loaded into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name as sent to the build service
    pub filename: String,

    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Load a selection from disk, named after its final path component
    pub async fn from_file(file: &File) -> Result<Self, ClientError> {
        let filename = file.file_name().ok_or_else(|| {
            ClientError::ConfigError(format!("Not a file path: {}", file.path().display()))
        })?;
        let bytes = file.read_bytes().await?;
        Ok(Self { filename, bytes })
    }
}

/// A validated build submission
///
/// Only produced by [`crate::form::validate`], so both files are present and
/// the Dockerfile is named exactly `Dockerfile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub image_name: String,
    pub endpoint: String,
    pub dockerfile: Upload,
    pub archive: Upload,
}

/// Current form values and per-field messages
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub image_name: String,
    pub endpoint: String,
    dockerfile: Option<Upload>,
    archive: Option<Upload>,
    dockerfile_error: Option<String>,
    archive_error: Option<String>,
}

impl FormState {
    pub fn new(image_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Select a Dockerfile; clears any message shown for that field
    pub fn select_dockerfile(&mut self, upload: Option<Upload>) {
        self.dockerfile = upload;
        self.dockerfile_error = None;
    }

    /// Select a zip archive; clears any message shown for that field
    pub fn select_archive(&mut self, upload: Option<Upload>) {
        self.archive = upload;
        self.archive_error = None;
    }

    pub fn dockerfile(&self) -> Option<&Upload> {
        self.dockerfile.as_ref()
    }

    pub fn archive(&self) -> Option<&Upload> {
        self.archive.as_ref()
    }

    pub fn dockerfile_error(&self) -> Option<&str> {
        self.dockerfile_error.as_deref()
    }

    pub fn archive_error(&self) -> Option<&str> {
        self.archive_error.as_deref()
    }

    pub(crate) fn set_field_errors(
        &mut self,
        dockerfile_error: Option<String>,
        archive_error: Option<String>,
    ) {
        self.dockerfile_error = dockerfile_error;
        self.archive_error = archive_error;
    }
}
