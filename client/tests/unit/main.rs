//! Integration tests against in-process fake services

mod common;
mod test_log_stream;
mod test_session;
mod test_submit;
