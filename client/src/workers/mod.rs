pub mod collector;
pub mod follower;
pub mod log_stream;
