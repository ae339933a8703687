//! Frame-relative reference measurements.
//!
//! The eye pair and the shoulder pair give a distance and a center each. Both are
//! recomputed from the current frame alone, so a pair that drops out of the frame
//! drops out of the calibration too.

use crate::geometry::{distance, midpoint};
use crate::keypoint::{JointName, KeypointFrame};
use nalgebra::Point2;

/// Reference quantities for one frame; each field is `None` until both of its
/// keypoints are present
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationState {
    pub eye_distance: Option<f64>,
    pub head_center: Option<Point2<f64>>,
    pub shoulder_distance: Option<f64>,
    pub shoulder_center: Option<Point2<f64>>,
}

impl CalibrationState {
    pub fn has_eyes(&self) -> bool {
        self.eye_distance.is_some() && self.head_center.is_some()
    }

    pub fn has_shoulders(&self) -> bool {
        self.shoulder_distance.is_some() && self.shoulder_center.is_some()
    }
}

/// Derives [`CalibrationState`] from a keypoint frame
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibrator;

impl Calibrator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the calibration for `frame`. Missing pairs are reported as `None`.
    pub fn calibrate(&self, frame: &KeypointFrame) -> CalibrationState {
        let (eye_distance, head_center) = Self::pair(frame, JointName::LeftEye, JointName::RightEye);
        let (shoulder_distance, shoulder_center) =
            Self::pair(frame, JointName::LeftShoulder, JointName::RightShoulder);

        CalibrationState {
            eye_distance,
            head_center,
            shoulder_distance,
            shoulder_center,
        }
    }

    fn pair(frame: &KeypointFrame, left: JointName, right: JointName) -> (Option<f64>, Option<Point2<f64>>) {
        match (frame.position(left), frame.position(right)) {
            (Some(l), Some(r)) => (Some(distance(&l, &r)), Some(midpoint(&l, &r))),
            _ => (None, None),
        }
    }
}
