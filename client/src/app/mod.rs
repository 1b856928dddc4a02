pub mod log_buffer;
pub mod options;
pub mod run;
pub mod state;
pub mod submit;
