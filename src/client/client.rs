//! # Client Core
//!
//! Drives one request/response exchange: connect, send the image bytes as a
//! single frame, wait for the tagged response, and hand back the PNG mask.
//!
//! A connection that closes before a complete response frame arrives is a
//! failed request ([`ClientError::Transport`]). The server may answer before
//! it has read the whole request (an oversized frame); if sending fails, any
//! error response already on the wire is still reported as
//! [`ClientError::Rejected`].

use std::path::Path;

use log::{debug, info};
use tokio::net::TcpStream;

use crate::common::config::ClientConfig;
use crate::common::connection::Connection;
use crate::common::protocol::Response;
use crate::error::ClientError;

pub struct ClientCore {
    config: ClientConfig,
}

impl ClientCore {
    /// # Example
    /// ```ignore
    /// let core = ClientCore::new(ClientConfig::default());
    /// core.process_file("photo.jpg", "edges.png").await?;
    /// ```
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Send raw image bytes and return the PNG edge mask.
    ///
    /// # Errors
    /// - [`ClientError::Connect`] if the server is unreachable
    /// - [`ClientError::Transport`] on a short read/write or timeout
    /// - [`ClientError::Rejected`] if the server answered with an error response
    /// - [`ClientError::MalformedResponse`] for an unrecognised response payload
    pub async fn detect_edges(&self, image_data: &[u8]) -> Result<Vec<u8>, ClientError> {
        let address = &self.config.server_address;
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| ClientError::Connect {
                addr: address.clone(),
                source,
            })?;
        let mut conn = Connection::new(stream)
            .with_max_frame_size(self.config.max_frame_bytes)
            .with_timeout(self.config.io_timeout());

        info!(
            "📤 Sending {} image bytes to {}",
            image_data.len(),
            address
        );
        if let Err(write_err) = conn.write_frame(image_data).await {
            debug!("Sending request failed ({}), checking for a response", write_err);
            return match conn.read_frame().await.map(|p| Response::from_bytes(&p)) {
                Ok(Ok(Response::Failure { code, message })) => {
                    Err(ClientError::Rejected { code, message })
                }
                _ => Err(write_err.into()),
            };
        }

        let payload = conn.read_frame().await?;
        match Response::from_bytes(&payload).map_err(ClientError::MalformedResponse)? {
            Response::Edges(png) => {
                info!("📥 Received {} byte edge mask", png.len());
                Ok(png)
            }
            Response::Failure { code, message } => Err(ClientError::Rejected { code, message }),
        }
    }

    /// Read `input`, process it remotely, and write the mask to `output`.
    pub async fn process_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(), ClientError> {
        let image_data = tokio::fs::read(input.as_ref()).await?;
        let png = self.detect_edges(&image_data).await?;
        tokio::fs::write(output.as_ref(), &png).await?;

        info!("✅ Edges written to {}", output.as_ref().display());
        Ok(())
    }
}
