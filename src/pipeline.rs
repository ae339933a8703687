//! Estimation and render tasks, and the cooperative scheduler that interleaves them.
//!
//! Both tasks run on one thread. The estimation task polls the camera and the pose
//! source on a fixed interval and writes the signal bus; the render task reads the
//! bus on every display tick. A pose source that has no result yet reports
//! [`PoseStatus::Pending`] and the render task simply keeps using the current bus.

use crate::avatar::{AvatarBinding, RenderSurface};
use crate::config::{Config, PipelineConfig};
use crate::keypoint::{Pose, PoseDetection};
use crate::rig::RigConfig;
use crate::signals::JointSignalBus;
use crate::transform::TransformEngine;
use crate::{Error, Result};
use log::{debug, info, warn};
use std::time::Duration;

/// Result of polling the pose estimator
#[derive(Debug, Clone, PartialEq)]
pub enum PoseStatus {
    /// Inference still running
    Pending,
    /// One estimator result, possibly with no subjects
    Ready(Vec<PoseDetection>),
}

/// The pose estimator
pub trait PoseSource {
    /// Poll for the next result without blocking
    fn poll(&mut self) -> Result<PoseStatus>;
}

/// The camera feeding the pose estimator
pub trait VideoSurface {
    /// Whether frames are available; called once per estimation attempt
    fn poll_ready(&mut self) -> bool;

    /// Current frame width and height in pixels
    fn dimensions(&self) -> (u32, u32);
}

/// Lifecycle of the estimation task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationState {
    /// Waiting for the camera to report ready
    Starting,
    Running,
    /// Gave up after too many consecutive failures; signals are frozen
    Abandoned,
}

/// What one estimation step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// New keypoints were processed and signals written
    Updated,
    /// The pose source has no result yet
    Pending,
    /// No detection cleared the pose confidence threshold
    NoSubject,
    /// Camera not ready or pose source failed; retried after the backoff
    Retrying { attempt: u32 },
    /// The task was abandoned earlier
    Abandoned,
}

/// Transform engine, signal bus and avatar binding for one avatar
pub struct Pipeline {
    config: PipelineConfig,
    engine: TransformEngine,
    bus: JointSignalBus,
    avatar: AvatarBinding,
    latest_pose: Option<Pose>,
    state: EstimationState,
    failures: u32,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig, engine: TransformEngine, avatar: AvatarBinding) -> Self {
        Self {
            config,
            engine,
            bus: JointSignalBus::new(),
            avatar,
            latest_pose: None,
            state: EstimationState::Starting,
            failures: 0,
        }
    }

    /// Build a pipeline from validated configuration and a rig table
    pub fn from_config(config: &Config, rig: RigConfig) -> Result<Self> {
        config.validate()?;
        rig.validate()?;
        let engine = TransformEngine::new(config.transform.clone()).with_filter(config.create_filter()?);
        info!("Signal smoothing: {}", engine.filter_name());
        let avatar = AvatarBinding::new(rig, config.placement.clone());
        Ok(Self::new(config.pipeline.clone(), engine, avatar))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bus(&self) -> &JointSignalBus {
        &self.bus
    }

    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    pub fn avatar(&self) -> &AvatarBinding {
        &self.avatar
    }

    pub fn state(&self) -> EstimationState {
        self.state
    }

    pub fn latest_pose(&self) -> Option<&Pose> {
        self.latest_pose.as_ref()
    }

    /// Give an abandoned estimation task another full set of attempts
    pub fn resume(&mut self) {
        if self.state == EstimationState::Abandoned {
            info!("Resuming estimation task");
            self.state = EstimationState::Starting;
            self.failures = 0;
        }
    }

    /// Run one estimation cycle.
    ///
    /// Joint-level problems never fail this call. It returns
    /// [`Error::ResourceUnavailable`] once, when the consecutive failure budget
    /// runs out; later calls report [`StepOutcome::Abandoned`] until [`Self::resume`].
    pub fn estimation_step<V, P>(&mut self, video: &mut V, source: &mut P) -> Result<StepOutcome>
    where
        V: VideoSurface + ?Sized,
        P: PoseSource + ?Sized,
    {
        if self.state == EstimationState::Abandoned {
            return Ok(StepOutcome::Abandoned);
        }

        if !video.poll_ready() {
            return self.record_failure("camera");
        }
        if self.state == EstimationState::Starting {
            let (width, height) = video.dimensions();
            info!("Camera ready at {}x{}", width, height);
            self.state = EstimationState::Running;
        }

        let detections = match source.poll() {
            Ok(PoseStatus::Pending) => {
                self.failures = 0;
                return Ok(StepOutcome::Pending);
            }
            Ok(PoseStatus::Ready(detections)) => detections,
            Err(e) => {
                warn!("Pose source failed: {}", e);
                return self.record_failure("pose source");
            }
        };
        self.failures = 0;

        let best = PoseDetection::best(&detections).filter(|d| d.score >= self.config.min_pose_confidence);
        let Some(detection) = best else {
            debug!("No subject above pose confidence {:.2}", self.config.min_pose_confidence);
            self.latest_pose = None;
            return Ok(StepOutcome::NoSubject);
        };

        let pose = Pose::from_detection(detection);
        self.engine.update_pose(&pose, self.config.part_confidence_threshold);
        self.engine.compute_signals(&mut self.bus);
        self.latest_pose = Some(pose);
        Ok(StepOutcome::Updated)
    }

    /// Run one render tick against the current bus; never blocks or fails
    pub fn render_step<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.avatar.render_tick(&self.bus, self.latest_pose.as_ref(), surface);
    }

    /// Swap the avatar mesh; the previous avatar stays on failure
    pub fn swap_mesh<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, locator: &str, file_name: &str) -> Result<()> {
        self.avatar.swap_mesh(surface, locator, file_name)
    }

    fn record_failure(&mut self, resource: &str) -> Result<StepOutcome> {
        self.failures += 1;
        if self.failures < self.config.max_camera_attempts {
            debug!(
                "{} unavailable (attempt {}/{})",
                resource, self.failures, self.config.max_camera_attempts
            );
            return Ok(StepOutcome::Retrying { attempt: self.failures });
        }

        warn!(
            "Abandoning estimation after {} consecutive {} failures; signals are frozen",
            self.failures, resource
        );
        self.state = EstimationState::Abandoned;
        Err(Error::ResourceUnavailable {
            resource: resource.to_string(),
            attempts: self.failures,
        })
    }
}

/// Counters from a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub estimation_steps: u32,
    pub signal_updates: u32,
    pub render_ticks: u32,
    /// Set when the estimation task gave up during the run
    pub abandoned: bool,
}

/// Interleaves estimation and render tasks on a single thread
pub struct Scheduler {
    estimation_interval: Duration,
    render_interval: Duration,
    backoff: Duration,
    now: Duration,
    next_estimation: Duration,
    next_render: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            estimation_interval: config.estimation_interval(),
            render_interval: config.render_interval(),
            backoff: config.camera_backoff(),
            now: Duration::ZERO,
            next_estimation: Duration::ZERO,
            next_render: Duration::ZERO,
        }
    }

    /// Time elapsed on the scheduler clock
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run both tasks for `duration`.
    ///
    /// `wait` is called with the time until the next due task; pass
    /// `std::thread::sleep` for wall-clock pacing or a no-op to run as fast as
    /// possible. Render ticks keep running after the estimation task is abandoned.
    pub fn run<V, P, S, W>(
        &mut self,
        pipeline: &mut Pipeline,
        video: &mut V,
        source: &mut P,
        surface: &mut S,
        duration: Duration,
        mut wait: W,
    ) -> RunSummary
    where
        V: VideoSurface + ?Sized,
        P: PoseSource + ?Sized,
        S: RenderSurface + ?Sized,
        W: FnMut(Duration),
    {
        let end = self.now + duration;
        let mut summary = RunSummary::default();

        loop {
            let deadline = self.next_estimation.min(self.next_render);
            if deadline >= end {
                break;
            }
            if deadline > self.now {
                wait(deadline - self.now);
                self.now = deadline;
            }

            if self.next_estimation <= self.now {
                let delay = match pipeline.estimation_step(video, source) {
                    Ok(StepOutcome::Retrying { .. }) => self.backoff,
                    Ok(outcome) => {
                        if outcome == StepOutcome::Updated {
                            summary.signal_updates += 1;
                        }
                        self.estimation_interval
                    }
                    Err(e) => {
                        warn!("Estimation task stopped: {}", e);
                        summary.abandoned = true;
                        self.estimation_interval
                    }
                };
                summary.estimation_steps += 1;
                self.next_estimation = self.now + delay;
            }

            if self.next_render <= self.now {
                pipeline.render_step(surface);
                summary.render_ticks += 1;
                self.next_render = self.now + self.render_interval;
            }
        }

        self.now = end;
        summary
    }
}
