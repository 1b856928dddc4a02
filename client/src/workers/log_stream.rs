//! Log stream subscription
//!
//! A transport worker holds the server-push connection and forwards each
//! event's data over a channel. [`LogStream`] is the consuming end: a lazy,
//! non-restartable sequence of lines with an explicit `close`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{header, Client};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::http::sse::SseParser;
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Log stream worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Reconnect backoff after a transport error or end of stream
    pub reconnect: CooldownOptions,

    /// Lines buffered between transport and consumer
    pub channel_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect: CooldownOptions::default(),
            channel_capacity: 1024,
        }
    }
}

/// Consuming end of the log subscription
pub struct LogStream {
    lines: mpsc::Receiver<String>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    closed: bool,
}

impl LogStream {
    /// Open the subscription and start its transport worker
    pub fn open(options: Options, client: Client, url: String) -> Self {
        let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let worker = tokio::spawn(async move {
            run(
                &options,
                &client,
                &url,
                tx,
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        });

        Self {
            lines: rx,
            shutdown_tx: Some(shutdown_tx),
            worker: Some(worker),
            closed: false,
        }
    }

    /// Wrap an existing line channel with no transport worker attached
    pub fn from_receiver(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines,
            shutdown_tx: None,
            worker: None,
            closed: false,
        }
    }

    /// Next line in arrival order; `None` once closed or the transport ended
    pub async fn next_line(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        self.lines.recv().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop the transport and release the connection. Later calls are no-ops.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.lines.close();

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!("Log stream worker ended abnormally: {}", e);
            }
        }
        info!("Log stream closed");
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Run the transport worker until shutdown or until the consumer goes away
pub async fn run<S, F>(
    options: &Options,
    client: &Client,
    url: &str,
    tx: mpsc::Sender<String>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Log stream worker starting...");
    let mut attempt: u32 = 0;

    loop {
        debug!("Connecting to log stream: {}", url);
        let connect = client
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send();

        let response = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Log stream worker shutting down...");
                return;
            }
            response = connect => response,
        };

        match response {
            Ok(response) if response.status().is_success() => {
                info!("Connected to log stream");
                attempt = 0;

                let mut parser = SseParser::new();
                let mut body = Box::pin(response.bytes_stream());
                loop {
                    tokio::select! {
                        _ = &mut shutdown_signal => {
                            info!("Log stream worker shutting down connection...");
                            return;
                        }
                        chunk = body.next() => match chunk {
                            Some(Ok(bytes)) => {
                                for event in parser.feed(&bytes) {
                                    if tx.send(event.data).await.is_err() {
                                        debug!("Log consumer dropped, stopping worker");
                                        return;
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                error!("Log stream error: {}", e);
                                break;
                            }
                            None => {
                                warn!("Log stream ended by server");
                                break;
                            }
                        }
                    }
                }
            }
            Ok(response) => {
                error!("Log stream request failed: {}", response.status());
            }
            Err(e) => {
                error!("Failed to connect to log stream: {}", e);
            }
        }

        if tx.is_closed() {
            return;
        }

        let delay = calc_exp_backoff(&options.reconnect, attempt);
        attempt = attempt.saturating_add(1);
        warn!("Reconnecting to log stream in {:?}...", delay);
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Log stream worker shutting down...");
                return;
            }
            _ = sleep_fn(delay) => {}
        }
    }
}
