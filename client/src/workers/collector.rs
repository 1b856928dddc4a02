//! Log collector worker
//!
//! Sole appender of the session log buffer. Drops keep-alive lines and closes
//! the stream exactly once when it stops.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::app::log_buffer::LogBuffer;
use crate::workers::log_stream::LogStream;

/// Marker the build service uses for keep-alive lines
pub const HEARTBEAT_MARKER: &str = "Heartbeat";

pub fn is_heartbeat(line: &str) -> bool {
    line.contains(HEARTBEAT_MARKER)
}

/// Run the collector until shutdown or until the stream ends
pub async fn run(
    mut stream: LogStream,
    buffer: Arc<LogBuffer>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Log collector starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Log collector shutting down...");
                break;
            }
            line = stream.next_line() => match line {
                Some(line) if is_heartbeat(&line) => {
                    trace!("Heartbeat received");
                }
                Some(line) => {
                    debug!("Log received: {}", line);
                    buffer.append(line).await;
                }
                None => {
                    info!("Log stream ended");
                    break;
                }
            }
        }
    }

    stream.close().await;
}
