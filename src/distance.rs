//! Subject distance and chest position from raw keypoint geometry.
//!
//! These work on the unfiltered pose because their confidence is the average
//! score of the keypoints involved; the placement step decides what is reliable.

use crate::keypoint::{JointName, Pose};
use nalgebra::Point2;

/// Proxy for subject-to-camera distance: apparent shoulder width in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    pub distance: f64,
    /// Average confidence of the two shoulders
    pub score: f64,
}

impl DistanceEstimate {
    /// Horizontal shoulder separation of `pose`, or `None` if a shoulder is missing
    pub fn from_pose(pose: &Pose) -> Option<Self> {
        let left = pose.get(JointName::LeftShoulder)?;
        let right = pose.get(JointName::RightShoulder)?;
        Some(Self {
            distance: (left.position.x - right.position.x).abs(),
            score: (left.confidence + right.confidence) / 2.0,
        })
    }

    /// Whether the estimate can drive placement at `threshold`
    pub fn is_reliable(&self, threshold: f64) -> bool {
        self.score > threshold && self.distance.is_finite() && self.distance > 0.0
    }
}

/// Chest position between the shoulders and halfway down to the right hip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChestCenter {
    pub position: Point2<f64>,
    /// Average confidence of both shoulders and the right hip
    pub score: f64,
}

impl ChestCenter {
    pub fn from_pose(pose: &Pose) -> Option<Self> {
        let left_shoulder = pose.get(JointName::LeftShoulder)?;
        let right_shoulder = pose.get(JointName::RightShoulder)?;
        let right_hip = pose.get(JointName::RightHip)?;

        let x = (left_shoulder.position.x + right_shoulder.position.x) / 2.0;
        let y = right_shoulder.position.y + (right_hip.position.y - right_shoulder.position.y) / 2.0;
        let score = (left_shoulder.confidence + right_shoulder.confidence + right_hip.confidence) / 3.0;

        Some(Self {
            position: Point2::new(x, y),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::Keypoint;

    fn torso_pose(left_score: f64) -> Pose {
        Pose::new(
            0.9,
            vec![
                Keypoint::new(JointName::LeftShoulder, 360.0, 260.0, left_score),
                Keypoint::new(JointName::RightShoulder, 280.0, 260.0, 0.9),
                Keypoint::new(JointName::RightHip, 280.0, 400.0, 0.6),
            ],
        )
    }

    #[test]
    fn test_distance_estimate() {
        let estimate = DistanceEstimate::from_pose(&torso_pose(0.7)).unwrap();
        assert_eq!(estimate.distance, 80.0);
        assert!((estimate.score - 0.8).abs() < 1e-12);
        assert!(estimate.is_reliable(0.7));
        assert!(!estimate.is_reliable(0.8));
    }

    #[test]
    fn test_distance_is_unsigned() {
        let mirrored = Pose::new(
            0.9,
            vec![
                Keypoint::new(JointName::LeftShoulder, 280.0, 260.0, 1.0),
                Keypoint::new(JointName::RightShoulder, 360.0, 260.0, 1.0),
            ],
        );
        assert_eq!(DistanceEstimate::from_pose(&mirrored).unwrap().distance, 80.0);
    }

    #[test]
    fn test_zero_width_is_unreliable() {
        let estimate = DistanceEstimate {
            distance: 0.0,
            score: 1.0,
        };
        assert!(!estimate.is_reliable(0.7));
    }

    #[test]
    fn test_chest_center() {
        let chest = ChestCenter::from_pose(&torso_pose(0.9)).unwrap();
        assert_eq!(chest.position, Point2::new(320.0, 330.0));
        assert!((chest.score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_missing_hip() {
        let pose = Pose::new(0.9, vec![Keypoint::new(JointName::LeftShoulder, 1.0, 1.0, 1.0)]);
        assert!(ChestCenter::from_pose(&pose).is_none());
        assert!(DistanceEstimate::from_pose(&pose).is_none());
    }
}
