//! Joint transform engine.
//!
//! Turns the current keypoint frame and its calibration into scale- and
//! translation-invariant joint signals:
//!
//! - `head`: nose offset from the eye midpoint, normalised by eye distance, and
//!   neck extension remapped to `[-2, 2]`
//! - `torso`: nose offset from the shoulder midpoint, normalised by shoulder
//!   distance, and torso extension remapped to `[-2, 2]`
//! - shoulders and elbows: signed angle at the pivot joint of a limb triple
//!
//! A signal whose keypoints are missing is skipped and the bus keeps its previous
//! value for that key.

use crate::calibration::{CalibrationState, Calibrator};
use crate::config::TransformConfig;
use crate::constants::EPSILON;
use crate::filters::{NoFilter, SignalFilter};
use crate::geometry::{angle_at, map_range, midpoint};
use crate::keypoint::{JointName, Keypoint, KeypointFrame, Pose};
use crate::signals::{JointSignal, JointSignalBus, SignalKey};
use nalgebra::Vector2;

/// Limb triples `(a, b, c)`; the signal is written under the pivot `b`
pub const LIMB_TRIPLES: [(JointName, JointName, JointName); 4] = [
    (JointName::LeftShoulder, JointName::RightShoulder, JointName::RightElbow),
    (JointName::RightShoulder, JointName::RightElbow, JointName::RightWrist),
    (JointName::RightShoulder, JointName::LeftShoulder, JointName::LeftElbow),
    (JointName::LeftShoulder, JointName::LeftElbow, JointName::LeftWrist),
];

/// Produces joint signals from the latest keypoint frame
pub struct TransformEngine {
    config: TransformConfig,
    calibrator: Calibrator,
    frame: KeypointFrame,
    calibration: CalibrationState,
    filter: Box<dyn SignalFilter>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

impl TransformEngine {
    /// Create an engine with no smoothing stage
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            calibrator: Calibrator::new(),
            frame: KeypointFrame::default(),
            calibration: CalibrationState::default(),
            filter: Box::new(NoFilter),
        }
    }

    /// Insert a smoothing stage between the computed signals and the bus
    #[must_use]
    pub fn with_filter(mut self, filter: Box<dyn SignalFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    /// Replace the keypoint frame and recompute the calibration from it
    pub fn update_keypoints(&mut self, keypoints: &[Keypoint], threshold: f64) {
        self.frame = KeypointFrame::from_keypoints(keypoints, threshold);
        self.calibration = self.calibrator.calibrate(&self.frame);
        log::trace!(
            "Frame updated: {} keypoints above {:.2}, calibration {:?}",
            self.frame.len(),
            threshold,
            self.calibration
        );
    }

    pub fn update_pose(&mut self, pose: &Pose, threshold: f64) {
        self.update_keypoints(pose.keypoints(), threshold);
    }

    pub fn frame(&self) -> &KeypointFrame {
        &self.frame
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Head offset, or `None` when the nose, the eye pair or the shoulder pair is missing.
    ///
    /// The vertical component is measured from the shoulder center, so the head
    /// signal needs shoulder calibration as well as eye calibration.
    pub fn head(&self) -> Option<Vector2<f64>> {
        let nose = self.frame.position(JointName::Nose)?;
        let head_center = self.calibration.head_center?;
        let shoulder_center = self.calibration.shoulder_center?;
        let eye_distance = self.calibration.eye_distance?;

        let x = self.normalize_horizontal(head_center.x - nose.x, eye_distance)?;
        let y = self.remap_extension(shoulder_center.y - nose.y, eye_distance)?;
        Some(Vector2::new(x, y))
    }

    /// Torso offset, or `None` when a shoulder, the right hip or the nose is missing
    pub fn torso(&self) -> Option<Vector2<f64>> {
        let left_shoulder = self.frame.position(JointName::LeftShoulder)?;
        let right_shoulder = self.frame.position(JointName::RightShoulder)?;
        let right_hip = self.frame.position(JointName::RightHip)?;
        let nose = self.frame.position(JointName::Nose)?;
        let shoulder_distance = self.calibration.shoulder_distance?;
        let shoulder_center = self.calibration.shoulder_center?;

        let shoulder_mid = midpoint(&left_shoulder, &right_shoulder);
        let torso_mid_y = (right_shoulder.y + right_hip.y) / 2.0;

        let x = self.normalize_horizontal(nose.x - shoulder_mid.x, shoulder_distance)?;
        let y = self.remap_extension(shoulder_center.y - torso_mid_y, shoulder_distance)?;
        Some(Vector2::new(x, y))
    }

    /// Signed angle at `b` in triangle `a`-`b`-`c`.
    ///
    /// The vertex is the middle argument `b`, not the first point `a`.
    /// Positive when `c` lies below `b` in image space, negative otherwise.
    /// `None` when a keypoint is missing or a side around `b` has zero length.
    pub fn rotate_joint(&self, a: JointName, b: JointName, c: JointName) -> Option<f64> {
        let pa = self.frame.position(a)?;
        let pb = self.frame.position(b)?;
        let pc = self.frame.position(c)?;

        let angle = angle_at(&pa, &pb, &pc)?;
        let sign = if pc.y > pb.y { 1.0 } else { -1.0 };
        Some(sign * angle)
    }

    /// Compute every signal available in the current frame and write it to `bus`.
    ///
    /// Signals whose inputs are missing are left untouched on the bus.
    pub fn compute_signals(&mut self, bus: &mut JointSignalBus) {
        let mut computed: Vec<(SignalKey, JointSignal)> = Vec::with_capacity(2 + LIMB_TRIPLES.len());

        if let Some(head) = self.head() {
            computed.push((SignalKey::Head, JointSignal::Offset(head)));
        }
        if let Some(torso) = self.torso() {
            computed.push((SignalKey::Torso, JointSignal::Offset(torso)));
        }
        for (a, b, c) in LIMB_TRIPLES {
            if let Some(angle) = self.rotate_joint(a, b, c) {
                computed.push((SignalKey::Joint(b), JointSignal::Angle(angle)));
            }
        }

        let total = computed.len();
        let mut written = 0;
        for (key, signal) in computed {
            let filtered = self.filter.apply(key, signal);
            if bus.update(key, filtered) {
                written += 1;
            }
        }
        log::debug!("Computed {} signals, wrote {} to the bus", total, written);
    }

    /// Horizontal offset in units of `distance / offset_divisor`
    fn normalize_horizontal(&self, offset: f64, distance: f64) -> Option<f64> {
        let unit = distance / self.config.offset_divisor;
        if !unit.is_finite() || unit.abs() < EPSILON {
            return None;
        }
        let normalized = offset / unit;
        normalized.is_finite().then_some(normalized)
    }

    /// Remap a vertical extension from `[distance*min, distance*max]` to the output range
    fn remap_extension(&self, extension: f64, distance: f64) -> Option<f64> {
        map_range(
            extension,
            distance * self.config.extension_min,
            distance * self.config.extension_max,
            self.config.output_min,
            self.config.output_max,
        )
    }
}
