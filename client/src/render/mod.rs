//! Result rendering
//!
//! [`view::render`] is a pure projection of a session snapshot; the terminal
//! printer turns the projection into coloured output.

pub mod highlight;
pub mod markup;
pub mod terminal;
pub mod view;

pub use view::{export_logs, render, View};
