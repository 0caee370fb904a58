use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};

use crate::analytics::domain::detection_log::LogEntry;
use crate::analytics::domain::frame_subscriber::FrameSubscriber;
use crate::analytics::domain::live_snapshot::LiveSnapshot;
use crate::analytics::domain::overlay_state::OverlayState;
use crate::analytics::domain::session_aggregate::SessionAggregate;
use crate::camera::domain::camera_source::CameraSource;
use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::detection::domain::artifact_loader::ArtifactLoader;
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::export::domain::capture_writer::CaptureWriter;
use crate::pipeline::capture_compositor::CaptureCompositor;
use crate::pipeline::detection_scheduler::DetectionScheduler;
use crate::pipeline::device_catalog::DeviceCatalog;
use crate::pipeline::pipeline_event::PipelineEvent;
use crate::pipeline::pipeline_state::{Consumer, PipelineState};
use crate::pipeline::readiness_gate::ModelReadinessGate;
use crate::pipeline::result_fanout::ResultFanout;
use crate::pipeline::stream_manager::StreamManager;
use crate::shared::config::AppConfig;
use crate::shared::error::{ErrorInfo, PipelineError};

/// Owns the whole detection pipeline and reacts to discrete events.
///
/// All methods run on the owner thread. After every event the controller
/// recomputes what should be running:
///
/// - the stream should be open when models are ready, a device is selected
///   and the active consumer needs the camera;
/// - detection should run when, additionally, the stream is open and the
///   live view is active.
///
/// Stream changes always stop detection first and release the old stream
/// before a new one is acquired.
pub struct PipelineController {
    camera: Box<dyn CameraSource>,
    gate: ModelReadinessGate,
    catalog: DeviceCatalog,
    stream: StreamManager,
    scheduler: DetectionScheduler,
    fanout: Arc<Mutex<ResultFanout>>,
    compositor: CaptureCompositor,
    selected: Option<DeviceDescriptor>,
    consumer: Consumer,
    last_error: Arc<Mutex<Option<ErrorInfo>>>,
    status: String,
    events: Sender<PipelineEvent>,
    shut_down: bool,
}

impl PipelineController {
    pub fn new(
        config: &AppConfig,
        camera: Box<dyn CameraSource>,
        analyzer: Box<dyn FaceAnalyzer>,
        writer: Box<dyn CaptureWriter>,
    ) -> (Self, Receiver<PipelineEvent>) {
        let (events, events_rx) = crossbeam_channel::unbounded();
        let fanout = Arc::new(Mutex::new(ResultFanout::new()));
        let last_error = Arc::new(Mutex::new(None));
        let scheduler = DetectionScheduler::new(
            config.detection_interval(),
            analyzer,
            fanout.clone(),
            last_error.clone(),
            events.clone(),
        );
        let controller = Self {
            camera,
            gate: ModelReadinessGate::new(),
            catalog: DeviceCatalog::new(config.preferred_camera_label.clone()),
            stream: StreamManager::new(config.video_width, config.video_height),
            scheduler,
            fanout,
            compositor: CaptureCompositor::new(
                config.export_dir.clone(),
                config.capture_prefix.clone(),
                writer,
            ),
            selected: None,
            consumer: Consumer::Live,
            last_error,
            status: String::new(),
            events,
            shut_down: false,
        };
        (controller, events_rx)
    }

    /// Loads every detector artifact. On success the camera list is
    /// discovered and the pipeline starts if a device is available.
    pub fn load_models(&mut self, loader: &dyn ArtifactLoader) -> Result<(), PipelineError> {
        self.status = "Loading AI Models...".into();
        match self.gate.load_all(loader) {
            Ok(()) => {
                for (artifact, path) in self.gate.loaded() {
                    log::debug!("Model {artifact} ready at {}", path.display());
                }
                self.status = "AI Models Loaded!".into();
                self.emit(PipelineEvent::ModelsReady);
                // Discovery failures are recorded in `last_error`.
                let _ = self.discover_devices(false);
                Ok(())
            }
            Err(e) => {
                self.status = "Failed to load AI models.".into();
                let info = self.record(&e);
                self.emit(PipelineEvent::ModelsFailed(info));
                let _ = self.reconcile();
                Err(e)
            }
        }
    }

    /// Re-enumerates cameras and selects one. With `carry_selection` the
    /// current device is kept when it is still present.
    pub fn discover_devices(&mut self, carry_selection: bool) -> Result<usize, PipelineError> {
        self.status = "Accessing camera list...".into();
        let count = match self.catalog.discover(self.camera.as_mut()) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("{e}");
                self.status = "Camera access denied.".into();
                self.record(&e);
                return Err(e);
            }
        };
        self.emit(PipelineEvent::DevicesDiscovered(count));

        let previous = self.selected.as_ref().map(|d| d.id.clone());
        let selection = if carry_selection {
            self.catalog.select_preserving(previous.as_deref())
        } else {
            self.catalog.select_default()
        }
        .cloned();

        match selection {
            Ok(device) => {
                log::info!("Selected camera {device}");
                self.selected = Some(device);
                self.reconcile()?;
                Ok(count)
            }
            Err(e) => {
                log::warn!("{e}");
                self.selected = None;
                self.status = "No camera found.".into();
                self.record(&e);
                let _ = self.reconcile();
                Err(e)
            }
        }
    }

    /// Switches to another catalog device. Selecting the device that failed
    /// to start retries it.
    pub fn select_device(&mut self, id: &str) -> Result<(), PipelineError> {
        let Some(device) = self.catalog.find(id).cloned() else {
            let e = PipelineError::NoDeviceFound;
            log::warn!("Unknown camera {id}");
            self.record(&e);
            return Err(e);
        };

        if self.selected.as_ref().map(|d| d.id.as_str()) == Some(id) {
            self.stream.clear_error();
        } else {
            self.status = "Changing camera...".into();
            log::info!("Selected camera {device}");
            self.selected = Some(device);
        }
        self.reconcile()
    }

    pub fn switch_consumer(&mut self, consumer: Consumer) -> Result<(), PipelineError> {
        if consumer != self.consumer {
            log::info!("Switching view to {consumer}");
            self.consumer = consumer;
        }
        self.reconcile()
    }

    /// Saves the live frame with the overlay drawn on it.
    ///
    /// Fails with [`PipelineError::NothingToCapture`] unless the live view
    /// has an open stream and at least one face on the overlay. Failures
    /// are returned only; `last_error` is left alone.
    pub fn capture(&self) -> Result<PathBuf, PipelineError> {
        if self.consumer != Consumer::Live || !self.stream.is_active() {
            return Err(PipelineError::NothingToCapture);
        }
        let overlay = self.fanout().overlay().clone();
        if overlay.is_empty() {
            return Err(PipelineError::NothingToCapture);
        }
        let frame = self
            .stream
            .frame_tap()
            .grab()
            .ok_or(PipelineError::NothingToCapture)?;
        self.compositor.capture(&frame, &overlay)
    }

    pub fn reset_session(&mut self) {
        self.fanout().reset_session();
        log::info!("Session analytics reset");
    }

    pub fn clear_log(&mut self) {
        self.fanout().clear_log();
        log::info!("Detection log cleared");
    }

    pub fn add_subscriber(&mut self, subscriber: Box<dyn FrameSubscriber>) {
        self.fanout().add_subscriber(subscriber);
    }

    pub fn state(&self) -> PipelineState {
        PipelineState {
            models_ready: self.gate.is_ready(),
            model_readiness: self.gate.readiness(),
            selected_device: self.selected.clone(),
            stream_active: self.stream.is_active(),
            detecting: self.scheduler.is_running(),
            active_consumer: self.consumer,
            last_error: self.last_error().clone(),
            status_message: self.status.clone(),
        }
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        self.catalog.devices()
    }

    pub fn session(&self) -> SessionAggregate {
        self.fanout().session().clone()
    }

    /// Detection history, newest first.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.fanout().log().to_vec()
    }

    pub fn live_snapshot(&self) -> LiveSnapshot {
        self.fanout().snapshot().clone()
    }

    pub fn overlay(&self) -> OverlayState {
        self.fanout().overlay().clone()
    }

    /// Stops detection and releases the camera for good. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let _ = self.reconcile();
        self.status = "Stopped.".into();
        log::info!("Pipeline shut down");
    }

    fn reconcile(&mut self) -> Result<(), PipelineError> {
        let desired = if self.gate.is_ready() && self.consumer.requires_camera() && !self.shut_down {
            self.selected.clone()
        } else {
            None
        };

        if self.stream.needs_transition(desired.as_ref()) {
            self.stop_detection();
            self.fanout().clear_live();
            if let Some(device) = &desired {
                self.status = format!("Starting camera: {}...", device.display_label());
            }

            match self.stream.reconcile(desired.as_ref(), self.camera.as_mut()) {
                Ok(transition) => {
                    if let Some(device_id) = transition.released {
                        self.emit(PipelineEvent::StreamReleased { device_id });
                    }
                    if let Some(device_id) = transition.attached {
                        self.emit(PipelineEvent::StreamAttached { device_id });
                        *self.last_error() = None;
                        if let Some(device) = &desired {
                            self.status = format!("Camera active: {}", device.display_label());
                        }
                    }
                }
                Err(e) => {
                    self.status = "Error starting camera.".into();
                    self.record(&e);
                    return Err(e);
                }
            }
        }

        self.sync_detection();
        Ok(())
    }

    fn sync_detection(&mut self) {
        let should_detect = self.gate.is_ready()
            && self.stream.is_active()
            && self.consumer == Consumer::Live
            && !self.shut_down;
        if should_detect {
            if !self.scheduler.is_running() {
                // Announced first so it precedes any result of the new run.
                self.emit(PipelineEvent::DetectionStarted);
                self.scheduler.start(self.stream.frame_tap());
            }
        } else {
            self.stop_detection();
        }
    }

    fn stop_detection(&mut self) {
        if self.scheduler.stop() {
            self.emit(PipelineEvent::DetectionStopped);
        }
    }

    fn record(&mut self, err: &PipelineError) -> ErrorInfo {
        let info = ErrorInfo::from(err);
        *self.last_error() = Some(info.clone());
        if !matches!(err, PipelineError::ModelLoad { .. }) {
            self.emit(PipelineEvent::Error(info.clone()));
        }
        info
    }

    fn emit(&self, event: PipelineEvent) {
        let _ = self.events.send(event);
    }

    fn fanout(&self) -> MutexGuard<'_, ResultFanout> {
        self.fanout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn last_error(&self) -> MutexGuard<'_, Option<ErrorInfo>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
