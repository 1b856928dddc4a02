//! Build-and-run service API
//!
//! Request field names and response bodies shared by the client and its test
//! fixtures.

pub mod models;
