//! buildrun client library
//!
//! Submits container builds to a remote build service, follows its build log
//! stream and asks a completion service for fixes when a build fails.

pub mod app;
pub mod cli;
pub mod errors;
pub mod filesys;
pub mod form;
pub mod http;
pub mod logs;
pub mod remediation;
pub mod render;
pub mod storage;
pub mod utils;
pub mod workers;
