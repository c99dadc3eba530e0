use super::MeasurementError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// The network operations the measurers time.
///
/// Each call resolves once the whole exchange has completed, or fails with a
/// `MeasurementError` once `timeout` has passed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and read the full body. Returns the number of bytes received.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<u64, MeasurementError>;

    /// POST `body` to `url` as raw binary and wait for the response.
    async fn send(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<(), MeasurementError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<u64, MeasurementError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        while let Some(chunk) = stream.next().await {
            received += chunk?.len() as u64;
        }

        debug!(url, received, "fetch complete");
        Ok(received)
    }

    async fn send(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<(), MeasurementError> {
        let sent = body.len();
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        // Completion is the server's full acknowledgement, not just the headers.
        response.bytes().await?;

        debug!(url, sent, "send complete");
        Ok(())
    }
}
