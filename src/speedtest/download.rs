use super::transport::Transport;
use super::{throughput_mbps, MeasurementError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub struct DownloadTest {
    url: String,
    download_size: u64,
    timeout: Duration,
}

impl DownloadTest {
    /// `url` is the full request URL, already carrying the size query.
    pub fn new(url: impl Into<String>, download_size: u64, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            download_size,
            timeout,
        }
    }

    pub async fn run(&self, transport: &dyn Transport) -> Result<DownloadResult, MeasurementError> {
        let start = Instant::now();
        let received = transport.fetch(&self.url, self.timeout).await?;
        let elapsed = start.elapsed();

        if received != self.download_size {
            debug!(
                requested = self.download_size,
                received, "download size differs from request"
            );
        }

        Ok(DownloadResult {
            speed_mbps: throughput_mbps(self.download_size, elapsed),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResult {
    pub speed_mbps: u32,
}
