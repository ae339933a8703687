//! Whole-avatar placement relative to the camera.

use crate::config::{PlacementConfig, PlacementMode};
use crate::distance::{ChestCenter, DistanceEstimate};
use crate::keypoint::Pose;
use log::{info, warn};
use nalgebra::Vector3;

/// Result of one placement update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vector3<f64>,
    /// False when the fallback position was used
    pub in_frame: bool,
}

/// Computes avatar position from the distance estimate and chest center
pub struct AvatarPlacement {
    config: PlacementConfig,
    in_frame: Option<bool>,
}

impl AvatarPlacement {
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self { config, in_frame: None }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// `a * ln(distance) + b`
    pub fn depth(&self, distance: f64) -> Option<f64> {
        let depth = self.config.depth_fit_a * distance.ln() + self.config.depth_fit_b;
        depth.is_finite().then_some(depth)
    }

    /// Position for `pose`, or the fallback when there is no reliable subject
    pub fn update(&mut self, pose: Option<&Pose>) -> Placement {
        let placement = pose
            .and_then(|pose| self.place(pose))
            .map(|position| Placement { position, in_frame: true })
            .unwrap_or_else(|| self.fallback());

        if self.in_frame != Some(placement.in_frame) {
            if placement.in_frame {
                info!("Subject in frame, placing avatar at {:?}", placement.position.as_slice());
            } else {
                warn!("Subject out of frame, avatar moved to fallback position");
            }
            self.in_frame = Some(placement.in_frame);
        }
        placement
    }

    fn place(&self, pose: &Pose) -> Option<Vector3<f64>> {
        match self.config.mode {
            PlacementMode::DepthOnly => Some(Vector3::new(0.0, 0.0, self.reliable_depth(pose)?)),
            PlacementMode::MovementOnly => {
                let (x, y) = self.lateral(&ChestCenter::from_pose(pose)?);
                Some(Vector3::new(x, y, 0.0))
            }
            PlacementMode::Full => {
                let depth = self.reliable_depth(pose)?;
                // A missing hip keeps the avatar centered but still tracks depth
                let (x, y) = ChestCenter::from_pose(pose)
                    .map(|chest| self.lateral(&chest))
                    .unwrap_or((0.0, 0.0));
                Some(Vector3::new(x, y, depth))
            }
        }
    }

    fn reliable_depth(&self, pose: &Pose) -> Option<f64> {
        let estimate = DistanceEstimate::from_pose(pose)?;
        if !estimate.is_reliable(self.config.confidence_threshold) {
            log::debug!(
                "Distance estimate below threshold: {:.3} <= {:.3}",
                estimate.score,
                self.config.confidence_threshold
            );
            return None;
        }
        self.depth(estimate.distance)
    }

    fn lateral(&self, chest: &ChestCenter) -> (f64, f64) {
        (
            self.config.lateral_scale * chest.position.x + self.config.lateral_offset,
            self.config.vertical_scale * chest.position.y + self.config.vertical_offset,
        )
    }

    fn fallback(&self) -> Placement {
        Placement {
            position: Vector3::from(self.config.fallback_position),
            in_frame: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::{JointName, Keypoint};

    fn pose(score: f64) -> Pose {
        Pose::new(
            0.9,
            vec![
                Keypoint::new(JointName::LeftShoulder, 360.0, 240.0, score),
                Keypoint::new(JointName::RightShoulder, 280.0, 240.0, score),
                Keypoint::new(JointName::RightHip, 280.0, 400.0, score),
            ],
        )
    }

    #[test]
    fn test_full_placement() {
        let mut placement = AvatarPlacement::new(PlacementConfig::default());
        let result = placement.update(Some(&pose(0.9)));
        assert!(result.in_frame);
        // chest (320, 320)
        assert!((result.position.x - (0.0125 * 320.0 - 4.0)).abs() < 1e-9);
        assert!((result.position.y - (-0.0167 * 320.0 + 4.0)).abs() < 1e-9);
        assert!((result.position.z - (-6.035 * 80.0_f64.ln() + 30.722)).abs() < 1e-9);
    }

    #[test]
    fn test_low_confidence_snaps_to_fallback() {
        let mut placement = AvatarPlacement::new(PlacementConfig::default());
        let result = placement.update(Some(&pose(0.7)));
        assert!(!result.in_frame);
        assert_eq!(result.position, Vector3::new(0.0, 0.0, -30.0));
    }

    #[test]
    fn test_no_pose_snaps_to_fallback() {
        let mut placement = AvatarPlacement::new(PlacementConfig::default());
        assert!(!placement.update(None).in_frame);
    }

    #[test]
    fn test_depth_only_mode() {
        let config = PlacementConfig {
            mode: PlacementMode::DepthOnly,
            ..PlacementConfig::default()
        };
        let mut placement = AvatarPlacement::new(config);
        let result = placement.update(Some(&pose(0.9)));
        assert_eq!(result.position.x, 0.0);
        assert_eq!(result.position.y, 0.0);
        assert!(result.position.z.is_finite());
    }

    #[test]
    fn test_movement_only_ignores_confidence() {
        let config = PlacementConfig {
            mode: PlacementMode::MovementOnly,
            ..PlacementConfig::default()
        };
        let mut placement = AvatarPlacement::new(config);
        let result = placement.update(Some(&pose(0.2)));
        assert!(result.in_frame);
        assert_eq!(result.position.z, 0.0);
    }

    #[test]
    fn test_depth_of_zero_distance_is_none() {
        let placement = AvatarPlacement::new(PlacementConfig::default());
        assert_eq!(placement.depth(0.0), None);
        assert!(placement.depth(1.0).is_some());
    }

    #[test]
    fn test_farther_subject_is_deeper() {
        let placement = AvatarPlacement::new(PlacementConfig::default());
        let near = placement.depth(160.0).unwrap();
        let far = placement.depth(40.0).unwrap();
        assert!(far > near);
    }
}
