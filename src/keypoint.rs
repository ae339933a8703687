//! Named 2-D keypoints, the per-frame keypoint store, and the raw pose-estimator
//! output they are built from.

use crate::constants::NUM_KEYPOINTS;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// PoseNet body parts, in estimator index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(usize)]
pub enum JointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl JointName {
    /// All joints in index order
    pub const ALL: [JointName; NUM_KEYPOINTS] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse an estimator part name such as `leftShoulder`
    pub fn from_part(part: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|joint| joint.part_name() == part)
    }

    /// Estimator part name
    pub fn part_name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }
}

impl std::fmt::Display for JointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.part_name())
    }
}

/// A single named keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub name: JointName,
    /// Image-space position in pixels
    pub position: Point2<f64>,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(name: JointName, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name,
            position: Point2::new(x, y),
            confidence,
        }
    }

    /// Whether the keypoint clears a frame threshold (strictly greater)
    pub fn passes(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }
}

/// Keypoints that cleared the confidence threshold for one estimation cycle.
///
/// A joint missing from the frame is `None`; it is never stood in for by the origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointFrame {
    slots: [Option<Keypoint>; NUM_KEYPOINTS],
}

impl KeypointFrame {
    /// Build a frame, keeping only keypoints whose confidence exceeds `threshold`
    pub fn from_keypoints<'a, I>(keypoints: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = &'a Keypoint>,
    {
        let mut frame = Self::default();
        for keypoint in keypoints {
            if keypoint.passes(threshold) {
                frame.slots[keypoint.name.index()] = Some(*keypoint);
            }
        }
        frame
    }

    pub fn get(&self, name: JointName) -> Option<&Keypoint> {
        self.slots[name.index()].as_ref()
    }

    pub fn position(&self, name: JointName) -> Option<Point2<f64>> {
        self.get(name).map(|kp| kp.position)
    }

    pub fn contains(&self, name: JointName) -> bool {
        self.slots[name.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.slots.iter().flatten()
    }
}

/// Raw position as reported by the estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub x: f64,
    pub y: f64,
}

/// Raw keypoint as reported by the estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoint {
    pub part: String,
    pub position: RawPosition,
    pub score: f64,
}

/// One detected subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseDetection {
    pub score: f64,
    pub keypoints: Vec<RawKeypoint>,
}

impl PoseDetection {
    /// Best-scoring subject of an estimator result
    pub fn best(detections: &[PoseDetection]) -> Option<&PoseDetection> {
        detections
            .iter()
            .filter(|d| d.score.is_finite())
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Every keypoint of one subject, regardless of confidence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub score: f64,
    keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(score: f64, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }

    /// Convert a raw detection, dropping parts the skeleton does not know
    pub fn from_detection(detection: &PoseDetection) -> Self {
        let keypoints = detection
            .keypoints
            .iter()
            .filter_map(|raw| match JointName::from_part(&raw.part) {
                Some(name) => Some(Keypoint::new(name, raw.position.x, raw.position.y, raw.score)),
                None => {
                    log::debug!("Ignoring unknown keypoint part {:?}", raw.part);
                    None
                }
            })
            .collect();
        Self::new(detection.score, keypoints)
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn get(&self, name: JointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Filtered frame for this pose
    pub fn frame(&self, threshold: f64) -> KeypointFrame {
        KeypointFrame::from_keypoints(&self.keypoints, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_name_from_index() {
        assert_eq!(JointName::from_index(0), Some(JointName::Nose));
        assert_eq!(JointName::from_index(16), Some(JointName::RightAnkle));
        assert_eq!(JointName::from_index(17), None);
    }

    #[test]
    fn test_joint_name_part_round_trip() {
        for joint in JointName::ALL {
            assert_eq!(JointName::from_part(joint.part_name()), Some(joint));
        }
        assert_eq!(JointName::from_part("left_shoulder"), None);
    }

    #[test]
    fn test_frame_threshold_is_strict() {
        let keypoints = [
            Keypoint::new(JointName::Nose, 1.0, 2.0, 0.5),
            Keypoint::new(JointName::LeftEye, 1.0, 2.0, 0.51),
        ];
        let frame = KeypointFrame::from_keypoints(&keypoints, 0.5);
        assert!(!frame.contains(JointName::Nose));
        assert!(frame.contains(JointName::LeftEye));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_missing_joint_is_none_not_origin() {
        let frame = KeypointFrame::default();
        assert!(frame.is_empty());
        assert_eq!(frame.position(JointName::Nose), None);
    }

    #[test]
    fn test_best_detection() {
        let detections = vec![
            PoseDetection { score: 0.3, keypoints: vec![] },
            PoseDetection { score: 0.9, keypoints: vec![] },
            PoseDetection { score: f64::NAN, keypoints: vec![] },
        ];
        let best = PoseDetection::best(&detections).unwrap();
        assert_eq!(best.score, 0.9);
        assert!(PoseDetection::best(&[]).is_none());
    }

    #[test]
    fn test_pose_from_detection_skips_unknown_parts() {
        let detection = PoseDetection {
            score: 0.8,
            keypoints: vec![
                RawKeypoint {
                    part: "nose".to_string(),
                    position: RawPosition { x: 10.0, y: 20.0 },
                    score: 0.9,
                },
                RawKeypoint {
                    part: "tail".to_string(),
                    position: RawPosition { x: 0.0, y: 0.0 },
                    score: 1.0,
                },
            ],
        };
        let pose = Pose::from_detection(&detection);
        assert_eq!(pose.keypoints().len(), 1);
        assert_eq!(pose.get(JointName::Nose).unwrap().position, Point2::new(10.0, 20.0));
    }
}
