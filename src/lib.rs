//! Pose-driven virtual try-on library.
//!
//! This library turns 2-D body keypoints from a pose estimator into joint
//! signals and drives the skeleton of a rigged garment mesh with them:
//! - Per-frame calibration from eye and shoulder distances
//! - Head and torso offsets and limb angles on a shared signal bus
//! - Optional smoothing of the signals
//! - Whole-avatar placement from apparent shoulder width
//!
//! The pipeline consists of:
//! 1. Selecting the best detection and dropping low-confidence keypoints
//! 2. Calibrating against the subject's own proportions
//! 3. Computing joint signals into the [`signals::JointSignalBus`]
//! 4. Applying the bus to bones and placing the avatar on every render tick
//!
//! # Examples
//!
//! ## Computing signals
//!
//! ```
//! use virtual_tryon::keypoint::{JointName, Keypoint};
//! use virtual_tryon::signals::JointSignalBus;
//! use virtual_tryon::transform::TransformEngine;
//!
//! let keypoints = vec![
//!     Keypoint::new(JointName::RightShoulder, 280.0, 240.0, 0.9),
//!     Keypoint::new(JointName::RightElbow, 280.0, 340.0, 0.9),
//!     Keypoint::new(JointName::RightWrist, 380.0, 340.0, 0.9),
//! ];
//!
//! let mut engine = TransformEngine::default();
//! engine.update_keypoints(&keypoints, 0.5);
//!
//! let mut bus = JointSignalBus::new();
//! engine.compute_signals(&mut bus);
//! let elbow = bus.angle(JointName::RightElbow).unwrap();
//! assert!((elbow.abs() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
//! ```
//!
//! ## Running the pipeline headless
//!
//! ```
//! use std::time::Duration;
//! use virtual_tryon::config::Config;
//! use virtual_tryon::pipeline::{Pipeline, Scheduler};
//! use virtual_tryon::replay::{RecordingSurface, ReplaySource, StaticVideo};
//! use virtual_tryon::rig::RigConfig;
//!
//! # fn main() -> virtual_tryon::Result<()> {
//! let config = Config::default();
//! let mut pipeline = Pipeline::from_config(&config, RigConfig::default())?;
//!
//! let mut surface = RecordingSurface::new();
//! surface.add_asset("camisaG.glb", (0..16).map(|i| format!("bone_{i}")).collect());
//! pipeline.swap_mesh(&mut surface, "./assets/", "camisaG.glb")?;
//!
//! let mut scheduler = Scheduler::new(&config.pipeline);
//! let summary = scheduler.run(
//!     &mut pipeline,
//!     &mut StaticVideo::ready(640, 480),
//!     &mut ReplaySource::from_frames(Vec::new()),
//!     &mut surface,
//!     Duration::from_millis(500),
//!     |_| {},
//! );
//! assert!(summary.render_ticks > 0);
//! # Ok(())
//! # }
//! ```

/// PoseNet keypoints, per-frame keypoint sets and raw estimator output
pub mod keypoint;

/// Point and angle helpers
pub mod geometry;

/// Per-frame body proportions
pub mod calibration;

/// Signal keys, values and the shared bus
pub mod signals;

/// Signal smoothing algorithms
pub mod filters;

/// Keypoints to joint signals
pub mod transform;

/// Shoulder-width distance and chest center estimates
pub mod distance;

/// Whole-avatar placement
pub mod placement;

/// Rig tables, skeletons and bone bindings
pub mod rig;

/// Applies signals to a loaded avatar
pub mod avatar;

/// Estimation and render tasks and their scheduler
pub mod pipeline;

/// Recorded pose streams and a headless render surface
pub mod replay;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
