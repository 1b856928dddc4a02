//! Build form: field values, file selections and the validation gate

pub mod state;
pub mod validate;

pub use state::{BuildRequest, FormState, Upload};
pub use validate::{validate, ValidationError};
