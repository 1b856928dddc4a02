//! Live log follower
//!
//! Hands every new buffer line to a callback as it arrives. A buffer reset
//! restarts the follower at the first line of the new submission.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::app::log_buffer::{LogBuffer, LogCursor};

pub async fn run<F>(
    buffer: Arc<LogBuffer>,
    mut on_line: F,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    F: FnMut(&str) + Send,
{
    let mut changes = buffer.subscribe();
    let mut cursor = LogCursor::default();

    loop {
        for line in buffer.read_from(&mut cursor).await {
            on_line(&line);
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Log follower shutting down...");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    for line in buffer.read_from(&mut cursor).await {
        on_line(&line);
    }
}
