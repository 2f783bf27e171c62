// Irradose - app/worker.rs
//
// Runs one calculation on a background thread and hands the outcome back
// over a one-shot mpsc channel.
//
// Architecture:
//   - `CalcSession` lives on the caller's thread; `Pipeline::run` runs on the worker.
//   - An `Arc<AtomicBool>` busy flag rejects a second start while one is running.
//   - The flag is cleared before the outcome is sent, so a caller that has
//     received the result can start again immediately.
//   - There is no cancellation. Dropping the handle discards the outcome.

use crate::app::pipeline::Pipeline;
use crate::core::model::Outcome;
use crate::util::error::SessionError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Name given to the worker thread.
const WORKER_THREAD_NAME: &str = "irradose-calc";

/// Inputs for one calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcJob {
    pub path: PathBuf,
    pub isotope: String,
}

impl CalcJob {
    pub fn new(path: impl Into<PathBuf>, isotope: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            isotope: isotope.into(),
        }
    }
}

/// Owner of the background calculation slot.
#[derive(Debug, Clone)]
pub struct CalcSession {
    pipeline: Arc<Pipeline>,
    running: Arc<AtomicBool>,
}

impl CalcSession {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a calculation is in flight.
    pub fn is_busy(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start `job` on a worker thread.
    ///
    /// Fails with [`SessionError::Busy`] if a calculation is already running.
    pub fn start(&self, job: CalcJob) -> Result<CalcHandle, SessionError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(path = %job.path.display(), "Calculation rejected: already running");
            return Err(SessionError::Busy);
        }

        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(&self.pipeline);
        let guard = BusyGuard(Arc::clone(&self.running));

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = pipeline.run(&job.path, &job.isotope);
                drop(guard);
                // The receiver may already be gone; the outcome is then discarded.
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(_) => Ok(CalcHandle { rx }),
            Err(source) => {
                // The closure (and its guard) was dropped with the failed spawn.
                tracing::error!(error = %source, "Failed to spawn calculation worker");
                Err(SessionError::Spawn { source })
            }
        }
    }
}

/// Clears the busy flag when the worker finishes, panics included.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Receiving end of a started calculation.
#[derive(Debug)]
pub struct CalcHandle {
    rx: mpsc::Receiver<Outcome>,
}

impl CalcHandle {
    /// Block until the outcome arrives.
    pub fn wait(self) -> Result<Outcome, SessionError> {
        self.rx.recv().map_err(|_| SessionError::WorkerLost)
    }

    /// Non-blocking poll. `Ok(None)` while the worker is still running.
    pub fn try_result(&self) -> Result<Option<Outcome>, SessionError> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(SessionError::WorkerLost),
        }
    }

    /// Wait up to `timeout`. `Ok(None)` if the worker has not finished yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<Outcome>, SessionError> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SessionError::WorkerLost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_while_running_is_busy() {
        let session = CalcSession::new(Pipeline::default());
        session.running.store(true, Ordering::SeqCst);

        let err = session
            .start(CalcJob::new("run.csv", "11C"))
            .expect_err("second start must be rejected");
        assert!(matches!(err, SessionError::Busy));
        assert!(session.is_busy());
    }

    #[test]
    fn test_wait_returns_failed_outcome_and_frees_slot() {
        let dir = tempfile::tempdir().unwrap();
        let session = CalcSession::new(Pipeline::default());

        let handle = session
            .start(CalcJob::new(dir.path().join("absent.csv"), "11C"))
            .unwrap();
        let outcome = handle.wait().unwrap();

        assert_eq!(outcome.total, 0.0);
        assert_eq!(outcome.elapsed_count, 0);
        assert!(outcome.error.unwrap().contains("does not exist"));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_wait_timeout_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let rows: String = (0..120).map(|i| format!("{i},1.0\n")).collect();
        std::fs::write(&path, format!("datetime,AI01C01\n{rows}")).unwrap();

        let session = CalcSession::new(Pipeline::default());
        let handle = session.start(CalcJob::new(&path, "11C")).unwrap();
        let outcome = handle
            .wait_timeout(Duration::from_secs(30))
            .unwrap()
            .expect("worker finished");

        assert!(outcome.is_ok());
        assert_eq!(outcome.elapsed_count, 120);
        assert!(!session.is_busy());

        // Slot is free again for a second run.
        let again = session.start(CalcJob::new(&path, "11C")).unwrap();
        assert_eq!(again.wait().unwrap(), outcome);
    }

    #[test]
    fn test_try_result_polls_until_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        std::fs::write(&path, "datetime,AI01C01\n1,0.9\n2,0.9\n3,0.1\n").unwrap();

        let session = CalcSession::new(Pipeline::default());
        let handle = session.start(CalcJob::new(&path, "18F")).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(30);
        let outcome = loop {
            if let Some(outcome) = handle.try_result().unwrap() {
                break outcome;
            }
            assert!(std::time::Instant::now() < deadline, "worker never finished");
            thread::sleep(Duration::from_millis(5));
        };
        assert!(outcome.is_ok());
        assert_eq!(outcome.elapsed_count, 2);
    }
}
