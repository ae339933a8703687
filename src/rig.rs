//! Per-rig configuration and the bone binding built from it.
//!
//! Rig constants (which bone each signal drives, on which axis, with which scale
//! and offset) belong to the garment mesh, not to the transform math. They are
//! read from a YAML table shipped next to the mesh:
//!
//! ```yaml
//! avatar_scale: 5.0
//! bones:
//!   rightShoulder: { bone: 7, axis: x, scale: 1.98, offset: -0.2 }
//!   rightElbow: { bone: right_elbow, axis: x, scale: 0.7, offset: 0.0 }
//! look_at:
//!   - bone: 3
//!     signal: torso
//!     base: [0.0, 5.0, -5.0]
//!     follow: [{ component: x, axis: x }]
//!     idle: { axis: x, amplitude: 2.0, step: 0.02 }
//! garments:
//!   - { locator: ./assets/, file_name: camisaG.glb }
//! ```

use crate::constants::{DEFAULT_AVATAR_SCALE, DEFAULT_IDLE_STEP};
use crate::keypoint::JointName;
use crate::signals::SignalKey;
use crate::{Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Rotation or translation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Vector with `value` on this axis and zero elsewhere
    pub fn vector(self, value: f64) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = value;
        v
    }
}

/// Bone reference in a rig table: skeleton index or bone name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoneSelector {
    Index(usize),
    Name(String),
}

impl fmt::Display for BoneSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// How one angle signal drives one bone rotation component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDriver {
    pub bone: BoneSelector,
    pub axis: Axis,
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

impl BoneDriver {
    /// Local rotation for `signal`: `scale * signal + offset` on the driver axis
    pub fn rotation(&self, signal: f64) -> Vector3<f64> {
        self.axis.vector(self.scale * signal + self.offset)
    }
}

/// Which offset component feeds a look-at target axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    X,
    Y,
}

/// Moves one axis of a look-at target by an offset signal component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowAxis {
    pub component: Component,
    pub axis: Axis,
    #[serde(default = "default_follow_scale")]
    pub scale: f64,
}

fn default_follow_scale() -> f64 {
    1.0
}

/// Cosmetic idle motion used while the look-at signal is unavailable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleOscillator {
    pub axis: Axis,
    pub amplitude: f64,
    #[serde(default = "default_idle_step")]
    pub step: f64,
}

fn default_idle_step() -> f64 {
    DEFAULT_IDLE_STEP
}

/// A bone that turns toward a target point driven by an offset signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookAtConfig {
    pub bone: BoneSelector,
    pub signal: SignalKey,
    /// Target position when the signal is zero
    pub base: [f64; 3],
    #[serde(default)]
    pub follow: Vec<FollowAxis>,
    #[serde(default)]
    pub idle: Option<IdleOscillator>,
}

/// Garment mesh location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garment {
    pub locator: String,
    pub file_name: String,
}

/// Rig table loaded alongside a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Uniform scale applied to the avatar on import
    pub avatar_scale: f64,
    pub bones: BTreeMap<SignalKey, BoneDriver>,
    pub look_at: Vec<LookAtConfig>,
    pub garments: Vec<Garment>,
}

impl Default for RigConfig {
    /// The shirt rig: arm bones 7/8 (right) and 11/12 (left), torso bone 3
    fn default() -> Self {
        let driver = |bone: usize, scale: f64, offset: f64| BoneDriver {
            bone: BoneSelector::Index(bone),
            axis: Axis::X,
            scale,
            offset,
        };
        let bones = BTreeMap::from([
            (SignalKey::Joint(JointName::RightShoulder), driver(7, 1.98, -0.2)),
            (SignalKey::Joint(JointName::RightElbow), driver(8, 0.7, 0.0)),
            (SignalKey::Joint(JointName::LeftShoulder), driver(11, 2.3, -0.2)),
            (SignalKey::Joint(JointName::LeftElbow), driver(12, 0.7, 0.0)),
        ]);

        let torso = LookAtConfig {
            bone: BoneSelector::Index(3),
            signal: SignalKey::Torso,
            base: [0.0, 5.0, -5.0],
            follow: vec![FollowAxis {
                component: Component::X,
                axis: Axis::X,
                scale: 1.0,
            }],
            idle: Some(IdleOscillator {
                axis: Axis::X,
                amplitude: 2.0,
                step: DEFAULT_IDLE_STEP,
            }),
        };

        let garment = |file_name: &str| Garment {
            locator: "./assets/".to_string(),
            file_name: file_name.to_string(),
        };

        Self {
            avatar_scale: DEFAULT_AVATAR_SCALE,
            bones,
            look_at: vec![torso],
            garments: vec![garment("camisaG.glb"), garment("Camisa.glb")],
        }
    }
}

impl RigConfig {
    /// Load a rig table from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;
        let rig: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse rig: {}", e)))?;
        rig.validate()?;
        Ok(rig)
    }

    /// Save the rig table to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize rig: {}", e)))?;
        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.avatar_scale.is_finite() && self.avatar_scale > 0.0) {
            return Err(Error::ConfigError("Avatar scale must be positive".to_string()));
        }
        for (key, driver) in &self.bones {
            if matches!(key, SignalKey::Head | SignalKey::Torso) {
                return Err(Error::ConfigError(format!(
                    "Bone driver for {key} needs an angle signal; use look_at for offsets"
                )));
            }
            if !driver.scale.is_finite() || !driver.offset.is_finite() {
                return Err(Error::ConfigError(format!("Bone driver for {key} is not finite")));
            }
        }
        for look_at in &self.look_at {
            if !matches!(look_at.signal, SignalKey::Head | SignalKey::Torso) {
                return Err(Error::ConfigError(format!(
                    "Look-at on bone {} needs an offset signal, got {}",
                    look_at.bone, look_at.signal
                )));
            }
            if look_at.base.iter().any(|v| !v.is_finite()) {
                return Err(Error::ConfigError("Look-at base must be finite".to_string()));
            }
        }
        Ok(())
    }
}

/// Index of a bone in a loaded skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneRef(pub usize);

/// Bone names of a loaded skeleton, in skeleton index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    bones: Vec<String>,
}

impl Skeleton {
    pub fn new(bones: Vec<String>) -> Self {
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_name(&self, bone: BoneRef) -> Option<&str> {
        self.bones.get(bone.0).map(String::as_str)
    }

    pub fn resolve(&self, selector: &BoneSelector) -> Option<BoneRef> {
        match selector {
            BoneSelector::Index(index) => (*index < self.bones.len()).then_some(BoneRef(*index)),
            BoneSelector::Name(name) => self.bones.iter().position(|b| b == name).map(BoneRef),
        }
    }
}

/// A rig driver resolved against a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct BoundDriver {
    pub key: SignalKey,
    pub bone: BoneRef,
    pub driver: BoneDriver,
}

/// A look-at controller resolved against a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct BoundLookAt {
    pub bone: BoneRef,
    pub config: LookAtConfig,
}

/// Semantic joint to bone mapping for one loaded mesh; read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct BoneBinding {
    drivers: Vec<BoundDriver>,
    look_ats: Vec<BoundLookAt>,
}

impl BoneBinding {
    /// Resolve every bone in `rig` against `skeleton`.
    ///
    /// Fails without side effects if any referenced bone is missing.
    pub fn build(skeleton: &Skeleton, rig: &RigConfig) -> Result<Self> {
        let resolve = |selector: &BoneSelector| {
            skeleton.resolve(selector).ok_or_else(|| {
                Error::BindingError(format!(
                    "Bone {} not found in skeleton with {} bones",
                    selector,
                    skeleton.len()
                ))
            })
        };

        let drivers = rig
            .bones
            .iter()
            .map(|(key, driver)| -> Result<BoundDriver> {
                Ok(BoundDriver {
                    key: *key,
                    bone: resolve(&driver.bone)?,
                    driver: driver.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let look_ats = rig
            .look_at
            .iter()
            .map(|config| -> Result<BoundLookAt> {
                Ok(BoundLookAt {
                    bone: resolve(&config.bone)?,
                    config: config.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { drivers, look_ats })
    }

    pub fn drivers(&self) -> &[BoundDriver] {
        &self.drivers
    }

    pub fn look_ats(&self) -> &[BoundLookAt] {
        &self.look_ats
    }

    pub fn bone_for(&self, key: SignalKey) -> Option<BoneRef> {
        self.drivers.iter().find(|d| d.key == key).map(|d| d.bone)
    }
}

/// Cycles through the garments listed in a rig table
#[derive(Debug, Clone)]
pub struct GarmentCatalog {
    garments: Vec<Garment>,
    current: usize,
}

impl GarmentCatalog {
    pub fn new(garments: Vec<Garment>) -> Self {
        Self { garments, current: 0 }
    }

    pub fn current(&self) -> Option<&Garment> {
        self.garments.get(self.current)
    }

    pub fn next(&mut self) -> Option<&Garment> {
        if self.garments.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.garments.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<&Garment> {
        if self.garments.is_empty() {
            return None;
        }
        self.current = (self.current + self.garments.len() - 1) % self.garments.len();
        self.current()
    }

    pub fn select(&mut self, index: usize) -> Option<&Garment> {
        if index < self.garments.len() {
            self.current = index;
        }
        self.garments.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton(count: usize) -> Skeleton {
        Skeleton::new((0..count).map(|i| format!("bone_{i}")).collect())
    }

    #[test]
    fn test_default_rig_binds_to_shirt_skeleton() {
        let binding = BoneBinding::build(&skeleton(58), &RigConfig::default()).unwrap();
        assert_eq!(binding.drivers().len(), 4);
        assert_eq!(binding.bone_for(SignalKey::Joint(JointName::RightShoulder)), Some(BoneRef(7)));
        assert_eq!(binding.bone_for(SignalKey::Joint(JointName::LeftElbow)), Some(BoneRef(12)));
        assert_eq!(binding.look_ats()[0].bone, BoneRef(3));
    }

    #[test]
    fn test_missing_bone_fails() {
        let result = BoneBinding::build(&skeleton(8), &RigConfig::default());
        assert!(matches!(result, Err(Error::BindingError(_))));
    }

    #[test]
    fn test_driver_rotation() {
        let rig = RigConfig::default();
        let driver = &rig.bones[&SignalKey::Joint(JointName::RightShoulder)];
        let rotation = driver.rotation(1.0);
        assert!((rotation.x - 1.78).abs() < 1e-12);
        assert_eq!(rotation.y, 0.0);
        assert_eq!(rotation.z, 0.0);
    }

    #[test]
    fn test_rig_yaml_with_bone_names() {
        let yaml = r#"
bones:
  rightElbow: { bone: right_elbow, axis: z, scale: 0.5 }
look_at:
  - bone: neck
    signal: head
    base: [0.0, 6.0, 5.0]
    follow:
      - { component: x, axis: x }
      - { component: y, axis: y }
"#;
        let rig: RigConfig = serde_yaml::from_str(yaml).unwrap();
        rig.validate().unwrap();
        let bones = Skeleton::new(vec!["neck".to_string(), "right_elbow".to_string()]);
        let binding = BoneBinding::build(&bones, &rig).unwrap();

        assert_eq!(binding.bone_for(SignalKey::Joint(JointName::RightElbow)), Some(BoneRef(1)));
        assert_eq!(binding.drivers()[0].driver.offset, 0.0);
        assert_eq!(binding.look_ats()[0].bone, BoneRef(0));
        assert_eq!(binding.look_ats()[0].config.follow[0].scale, 1.0);
        assert_eq!(rig.avatar_scale, DEFAULT_AVATAR_SCALE);
    }

    #[test]
    fn test_validate_rejects_mismatched_signals() {
        let mut rig = RigConfig::default();
        rig.bones.insert(
            SignalKey::Head,
            BoneDriver {
                bone: BoneSelector::Index(7),
                axis: Axis::X,
                scale: 1.0,
                offset: 0.0,
            },
        );
        assert!(rig.validate().is_err());

        let mut rig = RigConfig::default();
        rig.look_at[0].signal = SignalKey::Joint(JointName::LeftElbow);
        assert!(rig.validate().is_err());
    }

    #[test]
    fn test_garment_catalog_wraps() {
        let mut catalog = GarmentCatalog::new(RigConfig::default().garments);
        assert_eq!(catalog.current().unwrap().file_name, "camisaG.glb");
        assert_eq!(catalog.next().unwrap().file_name, "Camisa.glb");
        assert_eq!(catalog.next().unwrap().file_name, "camisaG.glb");
        assert_eq!(catalog.previous().unwrap().file_name, "Camisa.glb");
        assert!(catalog.select(9).is_none());

        let mut empty = GarmentCatalog::new(Vec::new());
        assert!(empty.next().is_none());
    }
}
