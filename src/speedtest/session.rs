use super::download::DownloadTest;
use super::ping::PingTest;
use super::transport::Transport;
use super::upload::UploadTest;
use super::TestPhase;
use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Results and status of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub ping_ms: u32,
    pub download_mbps: u32,
    pub upload_mbps: u32,
    pub is_running: bool,
    pub phase: TestPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpeedTestError {
    #[error("a speed test is already running")]
    AlreadyRunning,
}

/// Runs ping, download and upload in that order and owns the session state.
///
/// Every state change is pushed to all subscribers as a full snapshot.
pub struct SpeedTest {
    transport: Arc<dyn Transport>,
    ping: PingTest,
    download: DownloadTest,
    upload: UploadTest,
    running: AtomicBool,
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionState>>>,
}

impl SpeedTest {
    pub fn new(settings: &Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            ping: PingTest::new(settings.ping_url.clone(), settings.ping_timeout),
            download: DownloadTest::new(
                settings.download_request_url(),
                settings.download_size,
                settings.transfer_timeout,
            ),
            upload: UploadTest::new(
                settings.upload_url.clone(),
                settings.upload_size,
                settings.transfer_timeout,
            ),
            running: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionState> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one full measurement. A call made while another run is in
    /// progress is rejected and leaves the session untouched.
    pub async fn run(&self) -> Result<SessionState, SpeedTestError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("start requested while a run is in progress");
            return Err(SpeedTestError::AlreadyRunning);
        }
        let guard = RunGuard { test: self };

        info!("speed test started");
        self.update(|s| {
            *s = SessionState {
                is_running: true,
                phase: TestPhase::Ping,
                ..SessionState::default()
            }
        });

        let ping_ms = match self.ping.run(self.transport.as_ref()).await {
            Ok(result) => {
                info!(latency_ms = result.latency_ms, "ping measured");
                result.latency_ms
            }
            Err(err) => {
                warn!(error = %err, "ping measurement failed");
                0
            }
        };
        self.update(|s| {
            s.ping_ms = ping_ms;
            s.phase = TestPhase::Download;
        });

        let download_mbps = match self.download.run(self.transport.as_ref()).await {
            Ok(result) => {
                info!(speed_mbps = result.speed_mbps, "download measured");
                result.speed_mbps
            }
            Err(err) => {
                warn!(error = %err, "download speed test failed");
                0
            }
        };
        self.update(|s| {
            s.download_mbps = download_mbps;
            s.phase = TestPhase::Upload;
        });

        let upload_mbps = match self.upload.run(self.transport.as_ref()).await {
            Ok(result) => {
                info!(speed_mbps = result.speed_mbps, "upload measured");
                result.speed_mbps
            }
            Err(err) => {
                warn!(error = %err, "upload speed test failed");
                0
            }
        };
        self.update(|s| s.upload_mbps = upload_mbps);

        drop(guard);
        let state = self.state();
        info!(
            ping_ms = state.ping_ms,
            download_mbps = state.download_mbps,
            upload_mbps = state.upload_mbps,
            "speed test finished"
        );
        Ok(state)
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = lock(&self.state);
            f(&mut state);
            *state
        };
        lock(&self.subscribers).retain(|tx| tx.send(snapshot).is_ok());
    }

    fn finish(&self) {
        self.update(|s| {
            s.is_running = false;
            s.phase = TestPhase::Idle;
        });
        self.running.store(false, Ordering::Release);
    }
}

/// Returns the session to idle however the run ends, including when the run
/// future is dropped mid-phase.
struct RunGuard<'a> {
    test: &'a SpeedTest,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.test.finish();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::simulated::SimulatedTransport;
    use crate::speedtest::MeasurementError;
    use std::time::Duration;

    fn healthy_transport(settings: &Settings) -> SimulatedTransport {
        SimulatedTransport::new()
            .respond(&settings.ping_url, Duration::from_millis(120), 0)
            .respond(&settings.download_url, Duration::from_secs(1), settings.download_size)
            .respond(&settings.upload_url, Duration::from_millis(500), 0)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionState>) -> Vec<SessionState> {
        let mut snapshots = Vec::new();
        while let Ok(s) = rx.try_recv() {
            snapshots.push(s);
        }
        snapshots
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_records_all_three_readings() {
        let settings = Settings::default();
        let test = SpeedTest::new(&settings, Arc::new(healthy_transport(&settings)));

        let state = test.run().await.unwrap();
        assert_eq!(
            state,
            SessionState {
                ping_ms: 120,
                download_mbps: 42,
                upload_mbps: 34,
                is_running: false,
                phase: TestPhase::Idle,
            }
        );
        assert_eq!(test.state(), state);
        assert!(!test.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn phases_follow_fixed_order() {
        let settings = Settings::default();
        let test = SpeedTest::new(&settings, Arc::new(healthy_transport(&settings)));
        let mut rx = test.subscribe();

        assert_eq!(test.state().phase, TestPhase::Idle);
        assert!(!test.state().is_running);

        test.run().await.unwrap();
        let snapshots = drain(&mut rx);

        let mut phases = vec![TestPhase::Idle];
        for s in &snapshots {
            if phases.last() != Some(&s.phase) {
                phases.push(s.phase);
            }
        }
        assert_eq!(
            phases,
            vec![
                TestPhase::Idle,
                TestPhase::Ping,
                TestPhase::Download,
                TestPhase::Upload,
                TestPhase::Idle,
            ]
        );

        let (last, during) = snapshots.split_last().unwrap();
        assert!(during.iter().all(|s| s.is_running));
        assert!(!last.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_download_reads_zero_and_upload_still_runs() {
        let settings = Settings::default();
        let transport = Arc::new(
            SimulatedTransport::new()
                .respond(&settings.ping_url, Duration::from_millis(120), 0)
                .respond(&settings.download_url, Duration::from_secs(60), settings.download_size)
                .respond(&settings.upload_url, Duration::from_millis(500), 0),
        );
        let test = SpeedTest::new(&settings, transport.clone());

        let state = test.run().await.unwrap();
        assert_eq!(state.ping_ms, 120);
        assert_eq!(state.download_mbps, 0);
        assert_eq!(state.upload_mbps, 34);
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.uploaded_bytes(), settings.upload_size);
    }

    #[tokio::test(start_paused = true)]
    async fn every_phase_failing_still_completes() {
        let settings = Settings::default();
        let err = MeasurementError::Network("unreachable".into());
        let transport = SimulatedTransport::new()
            .fail(&settings.ping_url, Duration::ZERO, err.clone())
            .fail(&settings.download_url, Duration::ZERO, err.clone())
            .fail(&settings.upload_url, Duration::ZERO, err);
        let test = SpeedTest::new(&settings, Arc::new(transport));

        let state = test.run().await.unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_rejected() {
        let settings = Settings::default();
        let transport = Arc::new(healthy_transport(&settings));
        let test = SpeedTest::new(&settings, transport.clone());

        let (first, second) = tokio::join!(test.run(), test.run());
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes.contains(&Err(SpeedTestError::AlreadyRunning)));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn new_run_overwrites_previous_readings() {
        let settings = Settings::default();
        let test = SpeedTest::new(&settings, Arc::new(healthy_transport(&settings)));

        test.run().await.unwrap();
        let mut rx = test.subscribe();
        test.run().await.unwrap();

        let first = drain(&mut rx).into_iter().next().unwrap();
        assert_eq!(first.phase, TestPhase::Ping);
        assert_eq!((first.ping_ms, first.download_mbps, first.upload_mbps), (0, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_returns_to_idle() {
        let settings = Settings::default();
        let test = SpeedTest::new(&settings, Arc::new(healthy_transport(&settings)));

        let outcome = tokio::time::timeout(Duration::from_millis(50), test.run()).await;
        assert!(outcome.is_err());
        assert!(!test.is_running());
        assert_eq!(test.state().phase, TestPhase::Idle);
        assert!(test.run().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_subscribers_are_pruned() {
        let settings = Settings::default();
        let test = SpeedTest::new(&settings, Arc::new(healthy_transport(&settings)));
        drop(test.subscribe());
        let mut rx = test.subscribe();

        test.run().await.unwrap();
        assert_eq!(lock(&test.subscribers).len(), 1);
        assert!(!drain(&mut rx).is_empty());
    }
}
