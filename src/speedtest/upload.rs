use super::transport::Transport;
use super::{throughput_mbps, MeasurementError};
use std::time::Duration;
use tokio::time::Instant;

pub struct UploadTest {
    url: String,
    upload_size: usize,
    timeout: Duration,
}

impl UploadTest {
    pub fn new(url: impl Into<String>, upload_size: usize, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            upload_size,
            timeout,
        }
    }

    pub async fn run(&self, transport: &dyn Transport) -> Result<UploadResult, MeasurementError> {
        let data = vec![0u8; self.upload_size];

        let start = Instant::now();
        transport.send(&self.url, data, self.timeout).await?;
        let elapsed = start.elapsed();

        Ok(UploadResult {
            speed_mbps: throughput_mbps(self.upload_size as u64, elapsed),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadResult {
    pub speed_mbps: u32,
}
