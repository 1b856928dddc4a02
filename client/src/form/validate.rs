//! Validation gate
//!
//! Runs before any network call. Only a passing validation yields a
//! [`BuildRequest`].

use thiserror::Error;
use tracing::debug;

use crate::form::state::{BuildRequest, FormState, Upload};

/// Name the build service expects for the Dockerfile upload
pub const DOCKERFILE_NAME: &str = "Dockerfile";

pub const MISSING_ARCHIVE: &str = "Please upload a Zip file!";
pub const MISSING_DOCKERFILE: &str = "Please upload a Docker file!";
pub const INVALID_DOCKERFILE: &str = "Please upload a valid Docker file!";

/// Why a form was rejected before submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a Zip file! Please upload a Docker file!")]
    MissingBoth,

    #[error("Please upload a Zip file!")]
    MissingArchive,

    #[error("Please upload a Docker file!")]
    MissingDockerfile,

    #[error("Please upload a valid Docker file! (got {filename:?})")]
    InvalidDockerfile { filename: String },
}

impl ValidationError {
    /// Message for the archive field, if this error concerns it
    pub fn archive_message(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingBoth | ValidationError::MissingArchive => Some(MISSING_ARCHIVE),
            _ => None,
        }
    }

    /// Message for the Dockerfile field, if this error concerns it
    pub fn dockerfile_message(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingBoth | ValidationError::MissingDockerfile => {
                Some(MISSING_DOCKERFILE)
            }
            ValidationError::InvalidDockerfile { .. } => Some(INVALID_DOCKERFILE),
            ValidationError::MissingArchive => None,
        }
    }
}

fn check(form: &FormState) -> Result<(&Upload, &Upload), ValidationError> {
    match (form.dockerfile(), form.archive()) {
        (None, None) => Err(ValidationError::MissingBoth),
        (_, None) => Err(ValidationError::MissingArchive),
        (None, Some(_)) => Err(ValidationError::MissingDockerfile),
        (Some(dockerfile), Some(_)) if dockerfile.filename != DOCKERFILE_NAME => {
            Err(ValidationError::InvalidDockerfile {
                filename: dockerfile.filename.clone(),
            })
        }
        (Some(dockerfile), Some(archive)) => Ok((dockerfile, archive)),
    }
}

/// Validate the form and build the request
///
/// Sets the two field message slots as its only side effect; a field that
/// passes has its slot cleared.
pub fn validate(form: &mut FormState) -> Result<BuildRequest, ValidationError> {
    let checked = check(form).map(|(dockerfile, archive)| (dockerfile.clone(), archive.clone()));

    match checked {
        Ok((dockerfile, archive)) => {
            form.set_field_errors(None, None);
            Ok(BuildRequest {
                image_name: form.image_name.clone(),
                endpoint: form.endpoint.clone(),
                dockerfile,
                archive,
            })
        }
        Err(e) => {
            debug!("Form rejected: {}", e);
            form.set_field_errors(
                e.dockerfile_message().map(str::to_string),
                e.archive_message().map(str::to_string),
            );
            Err(e)
        }
    }
}
