//! In-memory transport for tests. Each request sleeps on the tokio clock, so
//! under `start_paused = true` the measured durations are exact.

use super::transport::Transport;
use super::MeasurementError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub prefix: String,
    pub delay: Duration,
    pub outcome: Result<u64, MeasurementError>,
}

pub struct SimulatedTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<String>>,
    uploaded: AtomicUsize,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
            uploaded: AtomicUsize::new(0),
        }
    }

    pub fn respond(mut self, prefix: &str, delay: Duration, bytes: u64) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            delay,
            outcome: Ok(bytes),
        });
        self
    }

    pub fn fail(mut self, prefix: &str, delay: Duration, err: MeasurementError) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            delay,
            outcome: Err(err),
        });
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded.load(Ordering::SeqCst)
    }

    async fn answer(&self, url: &str) -> Result<u64, MeasurementError> {
        self.requests.lock().unwrap().push(url.to_string());
        let route = self
            .routes
            .iter()
            .find(|r| url.starts_with(&r.prefix))
            .cloned()
            .ok_or_else(|| MeasurementError::Network(format!("no route for {url}")))?;
        tokio::time::sleep(route.delay).await;
        route.outcome
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<u64, MeasurementError> {
        match tokio::time::timeout(timeout, self.answer(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(MeasurementError::Timeout),
        }
    }

    async fn send(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<(), MeasurementError> {
        self.uploaded.fetch_add(body.len(), Ordering::SeqCst);
        match tokio::time::timeout(timeout, self.answer(url)).await {
            Ok(outcome) => outcome.map(|_| ()),
            Err(_) => Err(MeasurementError::Timeout),
        }
    }
}
