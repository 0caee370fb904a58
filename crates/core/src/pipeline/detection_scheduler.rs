use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_observation::DetectionFrame;
use crate::pipeline::pipeline_event::PipelineEvent;
use crate::pipeline::result_fanout::ResultFanout;
use crate::pipeline::stream_manager::FrameTap;
use crate::shared::error::{ErrorInfo, PipelineError};
use crate::shared::frame::VideoFrame;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Dispatched,
    /// The previous detection is still outstanding.
    Busy,
    /// No stream, or the stream has not decoded a frame yet.
    FrameNotReady,
    WorkerGone,
}

struct DetectionJob {
    frame: VideoFrame,
    epoch: u64,
}

/// State shared by the owner, the ticker thread and the detector worker.
struct Shared {
    busy: AtomicBool,
    epoch: AtomicU64,
    fanout: Arc<Mutex<ResultFanout>>,
    last_error: Arc<Mutex<Option<ErrorInfo>>>,
    events: Sender<PipelineEvent>,
}

struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs detection at a fixed interval with at most one call outstanding.
///
/// Layout: `ticker → worker [analyzer] → fanout`
///
/// The ticker grabs the current frame and hands it to a long-lived worker
/// thread that owns the analyzer. Each job carries the run epoch it was
/// dispatched in; [`DetectionScheduler::stop`] advances the epoch, and the
/// worker drops any result whose epoch is no longer current. The epoch is
/// compared while holding the fanout lock, so once `stop` returns no result
/// from the stopped run can be applied.
pub struct DetectionScheduler {
    interval: Duration,
    shared: Arc<Shared>,
    job_tx: Option<Sender<DetectionJob>>,
    worker: Option<JoinHandle<()>>,
    ticker: Option<Ticker>,
}

impl DetectionScheduler {
    pub fn new(
        interval: Duration,
        analyzer: Box<dyn FaceAnalyzer>,
        fanout: Arc<Mutex<ResultFanout>>,
        last_error: Arc<Mutex<Option<ErrorInfo>>>,
        events: Sender<PipelineEvent>,
    ) -> Self {
        let shared = Arc::new(Shared {
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            fanout,
            last_error,
            events,
        });
        // Capacity 1 is enough: the busy flag admits one job at a time.
        let (job_tx, job_rx) = crossbeam_channel::bounded::<DetectionJob>(1);
        let worker = spawn_worker(analyzer, job_rx, shared.clone());
        Self {
            interval,
            shared,
            job_tx: Some(job_tx),
            worker: Some(worker),
            ticker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether a detection call is outstanding, possibly from a stopped run.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    pub fn epoch(&self) -> u64 {
        self.shared.epoch.load(Ordering::Acquire)
    }

    /// Starts ticking against `tap`. Returns `false` when already running.
    pub fn start(&mut self, tap: FrameTap) -> bool {
        if self.ticker.is_some() {
            return false;
        }
        let Some(job_tx) = self.job_tx.clone() else {
            return false;
        };
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = spawn_ticker(self.interval, tap, job_tx, stop_rx, self.shared.clone());
        self.ticker = Some(Ticker { stop_tx, handle });
        log::info!("Detection started ({} ms interval)", self.interval.as_millis());
        true
    }

    /// Stops the ticker, waits for it to exit and invalidates every result
    /// still in flight. Returns `false` when it was not running; the epoch
    /// advances either way.
    pub fn stop(&mut self) -> bool {
        let was_running = match self.ticker.take() {
            Some(ticker) => {
                drop(ticker.stop_tx);
                if ticker.handle.join().is_err() {
                    log::warn!("Detection ticker panicked");
                }
                true
            }
            None => false,
        };

        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        // Wait out any delivery that compared epochs before the increment.
        drop(self.shared.fanout.lock().unwrap_or_else(PoisonError::into_inner));

        if was_running {
            log::info!("Detection stopped");
        }
        was_running
    }

    /// Runs one tick on the calling thread.
    pub fn tick(&self, tap: &FrameTap) -> TickOutcome {
        match &self.job_tx {
            Some(job_tx) => run_tick(tap, job_tx, &self.shared),
            None => TickOutcome::WorkerGone,
        }
    }
}

impl Drop for DetectionScheduler {
    fn drop(&mut self) {
        self.stop();
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Detection worker panicked");
            }
        }
    }
}

fn run_tick(tap: &FrameTap, job_tx: &Sender<DetectionJob>, shared: &Shared) -> TickOutcome {
    if shared
        .busy
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        log::debug!("Skipping tick: detection still in progress");
        return TickOutcome::Busy;
    }

    let frame = match tap.grab() {
        Some(frame) if !frame.is_empty() => frame,
        _ => {
            shared.busy.store(false, Ordering::Release);
            log::debug!("Skipping tick: no video frame yet");
            return TickOutcome::FrameNotReady;
        }
    };

    let epoch = shared.epoch.load(Ordering::Acquire);
    if job_tx.send(DetectionJob { frame, epoch }).is_err() {
        shared.busy.store(false, Ordering::Release);
        return TickOutcome::WorkerGone;
    }
    TickOutcome::Dispatched
}

fn spawn_ticker(
    interval: Duration,
    tap: FrameTap,
    job_tx: Sender<DetectionJob>,
    stop_rx: Receiver<()>,
    shared: Arc<Shared>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let ticks = crossbeam_channel::tick(interval);
        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticks) -> _ => {
                    if run_tick(&tap, &job_tx, &shared) == TickOutcome::WorkerGone {
                        log::warn!("Detection worker is gone, stopping ticker");
                        break;
                    }
                }
            }
        }
    })
}

fn spawn_worker(
    mut analyzer: Box<dyn FaceAnalyzer>,
    job_rx: Receiver<DetectionJob>,
    shared: Arc<Shared>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in job_rx {
            let _busy = BusyRelease(&shared.busy);
            let result = match panic::catch_unwind(AssertUnwindSafe(|| analyzer.detect(&job.frame))) {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err("detector panicked".to_string()),
            };
            deliver(&shared, job.epoch, result);
        }
    })
}

/// Clears the busy flag when a job is finished, however it ended.
struct BusyRelease<'a>(&'a AtomicBool);

impl Drop for BusyRelease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn deliver(shared: &Shared, epoch: u64, result: Result<DetectionFrame, String>) {
    let mut fanout = shared.fanout.lock().unwrap_or_else(PoisonError::into_inner);
    if shared.epoch.load(Ordering::Acquire) != epoch {
        log::debug!("Discarding detection result from a stopped run");
        return;
    }

    // Events are sent under the lock too, so none trail a finished stop().
    match result {
        Ok(frame) => {
            let faces = frame.len();
            fanout.apply(frame);
            let _ = shared.events.send(PipelineEvent::FrameApplied { faces });
        }
        Err(cause) => {
            let err = PipelineError::DetectionTick(cause);
            log::warn!("{err}");
            let info = ErrorInfo::from(&err);
            *shared.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
            let _ = shared.events.send(PipelineEvent::Error(info));
        }
    }
}
