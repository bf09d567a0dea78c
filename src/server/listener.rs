//! # Connection Handling
//!
//! One listener per process; every accepted connection runs in its own task:
//!
//! ```text
//! read request frame ─▶ ServerCore::detect_edges ─▶ write response frame ─▶ close
//! ```
//!
//! Exactly one request is served per connection. Failures are confined to the
//! connection: the server answers with an error response when the transport
//! still allows it, then closes. Nothing mutable is shared between
//! connections except the metrics counters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};

use super::metrics::ServerMetrics;
use super::server::ServerCore;
use crate::common::config::ServerConfig;
use crate::common::connection::Connection;
use crate::common::protocol::Response;
use crate::error::{FrameError, ServiceError};

/// Most bytes of a refused oversized payload read off the socket before closing.
const DRAIN_LIMIT: usize = 16 * 1024 * 1024;

/// The edge-detection TCP server.
pub struct Server {
    config: ServerConfig,
    core: Arc<ServerCore>,
    metrics: ServerMetrics,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let core = ServerCore::new(
            config.detection.threshold,
            config.detection.workers,
            config.limits.compute_timeout(),
        );
        Self {
            config,
            core: Arc::new(core),
            metrics: ServerMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    /// Bind the configured address and serve forever.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.server.address)
            .await
            .with_context(|| format!("failed to bind {}", self.config.server.address))?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener.
    ///
    /// Only returns if the listener itself fails to report its address.
    /// Accept errors are logged and the loop continues.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        info!(
            "📡 Listening on {} (threshold {}, {} workers)",
            local,
            self.core.threshold(),
            self.core.workers()
        );

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    debug!("🔗 Accepted connection from {}", addr);
                    let handler = ConnectionHandler {
                        core: Arc::clone(&self.core),
                        metrics: self.metrics.clone(),
                        max_frame_size: self.config.limits.max_frame_bytes,
                        io_timeout: self.config.limits.io_timeout(),
                    };
                    tokio::spawn(async move {
                        handler.handle(socket).await;
                    });
                }
                Err(e) => error!("❌ Accept error: {}", e),
            }
        }
    }
}

/// Everything one connection task needs, owned by that task.
struct ConnectionHandler {
    core: Arc<ServerCore>,
    metrics: ServerMetrics,
    max_frame_size: usize,
    io_timeout: Duration,
}

impl ConnectionHandler {
    async fn handle(self, socket: TcpStream) {
        let peer = socket
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        let request_id = self.metrics.begin_request();
        let started = Instant::now();

        let mut conn = Connection::new(socket)
            .with_max_frame_size(self.max_frame_size)
            .with_timeout(self.io_timeout);

        let mut unread = 0;
        let failure = match self.exchange(&mut conn, request_id).await {
            Ok(()) => {
                let elapsed = started.elapsed().as_millis() as u64;
                self.metrics.record_success(elapsed);
                info!(
                    "📷 Request #{} from {} served in {} ms",
                    request_id, peer, elapsed
                );
                None
            }
            Err(e) => {
                self.metrics.record_failure();
                error!("❌ Request #{} from {} failed: {}", request_id, peer, e);
                if let ServiceError::Transport(FrameError::FrameTooLarge { len, .. }) = &e {
                    unread = *len;
                }
                reply_possible(&e).then(|| Response::Failure {
                    code: e.code(),
                    message: e.to_string(),
                })
            }
        };

        if let Some(failure) = failure {
            if let Err(e) = conn.write_frame(&failure.to_bytes()).await {
                warn!(
                    "⚠️  Could not report failure of request #{}: {}",
                    request_id, e
                );
            }
        }

        if unread > 0 {
            // The peer may still be writing the refused payload; consume it so
            // the close does not reset the connection under the response.
            if let Err(e) = conn.discard(unread.min(DRAIN_LIMIT) as u64).await {
                debug!("Draining request #{} stopped: {}", request_id, e);
            }
        }

        if let Err(e) = conn.shutdown().await {
            debug!("Shutdown of connection for request #{}: {}", request_id, e);
        }

        let totals = self.metrics.snapshot();
        debug!(
            "Totals: {} requests, {} ok, {} failed, avg {} ms",
            totals.total_requests,
            totals.successful_requests,
            totals.failed_requests,
            totals.avg_response_time_ms
        );
    }

    async fn exchange(
        &self,
        conn: &mut Connection<TcpStream>,
        request_id: u64,
    ) -> Result<(), ServiceError> {
        let image_data = conn.read_frame().await?;
        debug!(
            "Request #{} received {} image bytes",
            request_id,
            image_data.len()
        );

        let png = self.core.detect_edges(request_id, image_data).await?;
        conn.write_frame(&Response::Edges(png).to_bytes()).await?;
        Ok(())
    }
}

/// Whether the stream is still usable for an error response.
fn reply_possible(err: &ServiceError) -> bool {
    match err {
        ServiceError::Transport(frame) => matches!(frame, FrameError::FrameTooLarge { .. }),
        _ => true,
    }
}
