pub mod download;
pub mod ping;
pub mod session;
#[cfg(test)]
pub(crate) mod simulated;
pub mod transport;
pub mod upload;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a single measurement phase produced no reading.
///
/// Every variant is treated the same by the orchestrator: the phase reads 0
/// and the run moves on. The variants only exist for the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementError {
    #[error("measurement failed: request timed out")]
    Timeout,
    #[error("measurement failed: network error: {0}")]
    Network(String),
    #[error("measurement failed: server responded with status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for MeasurementError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MeasurementError::Timeout
        } else if let Some(status) = err.status() {
            MeasurementError::Status(status.as_u16())
        } else {
            MeasurementError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPhase {
    #[default]
    Idle,
    Ping,
    Download,
    Upload,
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestPhase::Idle => "idle",
            TestPhase::Ping => "ping",
            TestPhase::Download => "download",
            TestPhase::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Throughput in whole Mbps: `bytes * 8 / (1_000_000 * seconds)`, rounded.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> u32 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    ((bytes as f64 * 8.0) / (1_000_000.0 * secs)).round() as u32
}

pub fn round_millis(elapsed: Duration) -> u32 {
    (elapsed.as_secs_f64() * 1000.0).round() as u32
}
