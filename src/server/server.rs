//! # Server Core - Edge Detection Pipeline
//!
//! The core server component does ONE thing: turn request image bytes into a
//! PNG edge mask. Sockets, framing and error reporting live in
//! [`Server`](super::listener::Server).

use std::time::Duration;

use log::{debug, info};

use crate::error::ServiceError;
use crate::processing::{codec, sobel, Deadline};

/// Detection settings applied to every request.
#[derive(Debug, Clone)]
pub struct ServerCore {
    threshold: u32,
    workers: usize,
    compute_timeout: Duration,
}

impl ServerCore {
    /// # Example
    /// ```ignore
    /// let core = ServerCore::new(200, 8, Duration::from_secs(30));
    /// ```
    pub fn new(threshold: u32, workers: usize, compute_timeout: Duration) -> Self {
        Self {
            threshold,
            workers: workers.max(1),
            compute_timeout,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Decode, detect edges and encode the mask as PNG.
    ///
    /// Runs on the blocking thread pool so the row workers never stall the
    /// async runtime. The whole stage is bounded by the compute timeout.
    ///
    /// # Errors
    /// - [`ServiceError::Decode`] for unsupported or corrupt input
    /// - [`ServiceError::Timeout`] if detection outlives the compute timeout
    /// - [`ServiceError::Encode`] if the mask cannot be written as PNG
    /// - [`ServiceError::Internal`] if the processing task panicked
    pub async fn detect_edges(
        &self,
        request_id: u64,
        image_data: Vec<u8>,
    ) -> Result<Vec<u8>, ServiceError> {
        let threshold = self.threshold;
        let workers = self.workers;
        let deadline = Deadline::after(self.compute_timeout);

        let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ServiceError> {
            let img = codec::decode(&image_data).map_err(ServiceError::Decode)?;
            debug!(
                "Request #{} decoded to {}x{} grayscale",
                request_id,
                img.width(),
                img.height()
            );
            let mask = sobel::detect_until(&img, threshold, workers, deadline)?;
            codec::encode(&mask).map_err(ServiceError::Encode)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("processing task failed: {}", e)))??;

        info!(
            "✅ Request #{} produced {} byte edge mask",
            request_id,
            png.len()
        );
        Ok(png)
    }
}
