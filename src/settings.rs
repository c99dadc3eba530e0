use std::time::Duration;

pub const PING_URL: &str = "https://www.google.com/favicon.ico";
pub const DOWNLOAD_URL: &str = "https://speed.cloudflare.com/__down";
pub const UPLOAD_URL: &str = "https://speed.cloudflare.com/__up";

pub const DOWNLOAD_SIZE: u64 = 5 * 1024 * 1024;
pub const UPLOAD_SIZE: usize = 2 * 1024 * 1024;

pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints and payload sizes for one measurement run.
///
/// Sizes and timeouts are fixed; only the URLs can be pointed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ping_url: String,
    pub download_url: String,
    pub upload_url: String,
    pub download_size: u64,
    pub upload_size: usize,
    pub ping_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ping_url: PING_URL.to_string(),
            download_url: DOWNLOAD_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            download_size: DOWNLOAD_SIZE,
            upload_size: UPLOAD_SIZE,
            ping_timeout: PING_TIMEOUT,
            transfer_timeout: TRANSFER_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn with_endpoints(
        ping_url: Option<String>,
        download_url: Option<String>,
        upload_url: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            ping_url: ping_url.unwrap_or(defaults.ping_url),
            download_url: download_url.unwrap_or(defaults.download_url),
            upload_url: upload_url.unwrap_or(defaults.upload_url),
            ..defaults
        }
    }

    pub fn download_request_url(&self) -> String {
        format!("{}?bytes={}", self.download_url, self.download_size)
    }
}
