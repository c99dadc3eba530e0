use super::transport::Transport;
use super::{round_millis, MeasurementError};
use std::time::Duration;
use tokio::time::Instant;

pub struct PingTest {
    url: String,
    timeout: Duration,
}

impl PingTest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    /// Times a single round trip. No repeated samples.
    pub async fn run(&self, transport: &dyn Transport) -> Result<PingResult, MeasurementError> {
        let start = Instant::now();
        transport.fetch(&self.url, self.timeout).await?;
        let elapsed = start.elapsed();

        Ok(PingResult {
            latency_ms: round_millis(elapsed),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingResult {
    pub latency_ms: u32,
}
