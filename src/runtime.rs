//! The sampling loop: one task owns the session, a periodic timer drives
//! ticks and a command channel delivers reset and shutdown requests.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::camera::{CameraProvider, FrameSource};
use crate::config::{PermissionPolicy, RecognizerConfig};
use crate::errors::{CameraError, CaptureError, StartupError};
use crate::io::SessionReport;
use crate::matcher::SimilarityScore;
use crate::overlay::{AssetCatalog, OverlayRenderer};
use crate::recognizer::Recognizer;
use crate::session::{Observation, RecognitionSession};
use crate::status::{Status, StatusSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    Shutdown,
}

pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Handle for the external reset control.
#[derive(Debug, Clone)]
pub struct Controller {
    tx: mpsc::UnboundedSender<Command>,
}

impl Controller {
    /// Returns false once the loop has stopped.
    pub fn reset(&self) -> bool {
        self.tx.send(Command::Reset).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(Command::Shutdown).is_ok()
    }
}

pub fn command_channel() -> (Controller, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Controller { tx }, rx)
}

#[derive(Debug)]
pub enum TickOutcome {
    Scored(SimilarityScore),
    Skipped(CaptureError),
}

/// Everything one tick does before the session sees a score.
pub trait TickPipeline {
    fn run_tick(&mut self) -> TickOutcome;
}

/// Capture from a camera, then crop, normalize, extract and match.
pub struct CameraPipeline<S> {
    source: S,
    recognizer: Recognizer,
}

impl<S: FrameSource> CameraPipeline<S> {
    pub fn new(source: S, recognizer: Recognizer) -> Self {
        CameraPipeline { source, recognizer }
    }
}

impl<S: FrameSource> TickPipeline for CameraPipeline<S> {
    fn run_tick(&mut self) -> TickOutcome {
        // The frame lives for this call only.
        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => return TickOutcome::Skipped(e),
        };
        match self.recognizer.score_frame(&frame) {
            Ok(score) => TickOutcome::Scored(score),
            Err(e) => TickOutcome::Skipped(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub threshold: f32,
    pub period: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &RecognizerConfig) -> Self {
        LoopSettings {
            threshold: config.recognition_threshold,
            period: config.sampling_period(),
        }
    }
}

pub struct RecognitionLoop<P, R, S, G> {
    pipeline: Option<P>,
    renderer: R,
    status: S,
    catalog: AssetCatalog,
    rng: G,
    session: RecognitionSession,
    period: Duration,
    reveal_without_camera: bool,
    current_asset: Option<String>,
    ticks: u64,
    skipped_ticks: u64,
    resets: u32,
}

impl<P, R, S, G> RecognitionLoop<P, R, S, G>
where
    P: TickPipeline,
    R: OverlayRenderer,
    S: StatusSink,
    G: Rng,
{
    /// A loop without a pipeline never samples; it only serves commands.
    pub fn new(
        settings: LoopSettings,
        pipeline: Option<P>,
        renderer: R,
        status: S,
        catalog: AssetCatalog,
        rng: G,
    ) -> Self {
        RecognitionLoop {
            pipeline,
            renderer,
            status,
            catalog,
            rng,
            session: RecognitionSession::new(settings.threshold),
            period: settings.period,
            reveal_without_camera: false,
            current_asset: None,
            ticks: 0,
            skipped_ticks: 0,
            resets: 0,
        }
    }

    /// Show the overlay right away when running without a camera.
    pub fn reveal_without_camera(mut self, reveal: bool) -> Self {
        self.reveal_without_camera = reveal;
        self
    }

    /// Runs until a shutdown command arrives or every controller is dropped.
    pub async fn run(mut self, mut commands: CommandReceiver) -> SessionReport {
        self.load_random_asset();
        self.reveal_if_camera_missing();
        if self.pipeline.is_some() {
            self.status.publish(Status::Ready);
        }

        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let sampling = self.pipeline.is_some() && self.session.is_sampling();
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Reset) => {
                        self.reset();
                        // drops the pending tick; the next one is a full period away
                        interval.reset();
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = interval.tick(), if sampling => self.tick(),
            }
        }
        log::info!(
            "recognition loop stopped after {} ticks, best {:.2}",
            self.ticks,
            self.session.best().value()
        );
        self.report()
    }

    fn tick(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        self.ticks += 1;
        match pipeline.run_tick() {
            TickOutcome::Skipped(e) => {
                self.skipped_ticks += 1;
                log::debug!("tick {} skipped: {}", self.ticks, e);
            }
            TickOutcome::Scored(score) => {
                log::trace!("tick {} scored {:.3}", self.ticks, score.value());
                match self.session.observe(score) {
                    Observation::Sampling { best } => self.status.publish(Status::Similarity(best)),
                    Observation::Recognized { best } => {
                        self.status.publish(Status::Similarity(best));
                        self.renderer.set_visible(true);
                        self.status.publish(Status::Recognized(best));
                        log::info!(
                            "card recognized at tick {} with similarity {:.2}",
                            self.ticks,
                            best.value()
                        );
                    }
                    Observation::Ignored => {}
                }
            }
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.session.reset();
        self.renderer.set_visible(false);
        self.load_random_asset();
        self.reveal_if_camera_missing();
        self.status.publish(Status::Reset);
        log::info!("session reset ({} so far)", self.resets);
    }

    fn reveal_if_camera_missing(&mut self) {
        if self.pipeline.is_none() && self.reveal_without_camera {
            self.renderer.set_visible(true);
        }
    }

    fn load_random_asset(&mut self) {
        let asset = self.catalog.choose(&mut self.rng).clone();
        match self.renderer.load(&asset) {
            Ok(()) => self.current_asset = Some(asset.id),
            Err(e) => {
                log::warn!("failed to load overlay {}: {}", asset.id, e);
                self.current_asset = None;
            }
        }
    }

    fn report(&self) -> SessionReport {
        SessionReport {
            ticks: self.ticks,
            skipped_ticks: self.skipped_ticks,
            best_similarity: self.session.best().value(),
            threshold: self.session.threshold(),
            recognized: !self.session.is_sampling(),
            resets: self.resets,
            asset: self.current_asset.clone(),
        }
    }
}

/// Builds the template, then waits for the camera.
///
/// Template and configuration problems are returned as errors before any
/// timer exists. Camera failures are reported on the status surface and
/// leave the loop idle, revealing the overlay only under
/// [`PermissionPolicy::FailOpen`] with a denied permission.
pub async fn start<C, R, S, G>(
    config: &RecognizerConfig,
    template_path: &Path,
    mut camera: C,
    renderer: R,
    mut status: S,
    catalog: AssetCatalog,
    rng: G,
) -> Result<RecognitionLoop<CameraPipeline<C::Source>, R, S, G>, StartupError>
where
    C: CameraProvider,
    R: OverlayRenderer,
    S: StatusSink,
    G: Rng,
{
    let recognizer = Recognizer::from_path(config, template_path).inspect_err(|e| {
        log::error!("startup aborted: {}", e);
    })?;

    status.publish(Status::CameraStarting);
    let (pipeline, reveal) = match camera.open(&config.camera).await {
        Ok(source) => (Some(CameraPipeline::new(source, recognizer)), false),
        Err(e) => {
            log::warn!("camera unavailable: {}", e);
            let reveal = matches!(e, CameraError::PermissionDenied(_))
                && config.permission_policy == PermissionPolicy::FailOpen;
            status.publish(Status::CameraUnavailable(e.to_string()));
            (None, reveal)
        }
    };

    let settings = LoopSettings::from_config(config);
    Ok(RecognitionLoop::new(settings, pipeline, renderer, status, catalog, rng).reveal_without_camera(reveal))
}
