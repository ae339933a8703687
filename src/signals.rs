//! The joint signal bus shared by the transform engine and the avatar binding.
//!
//! The bus is a plain owned value. The estimation side writes it through
//! [`JointSignalBus::update`] and the render side reads it by reference; each
//! entry is replaced as a whole, so a reader never sees half of an offset.

use crate::keypoint::JointName;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of one controllable degree of freedom on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignalKey {
    Head,
    Torso,
    /// Limb angle keyed by its pivot joint
    Joint(JointName),
}

impl SignalKey {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "head" => Some(Self::Head),
            "torso" => Some(Self::Torso),
            part => JointName::from_part(part).map(Self::Joint),
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Torso => f.write_str("torso"),
            Self::Joint(joint) => f.write_str(joint.part_name()),
        }
    }
}

impl TryFrom<String> for SignalKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown signal key: {value}"))
    }
}

impl From<SignalKey> for String {
    fn from(key: SignalKey) -> Self {
        key.to_string()
    }
}

impl From<JointName> for SignalKey {
    fn from(joint: JointName) -> Self {
        Self::Joint(joint)
    }
}

/// Latest normalized value for one signal key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointSignal {
    /// Scale-invariant 2-D offset (head, torso)
    Offset(Vector2<f64>),
    /// Signed limb angle in radians
    Angle(f64),
}

impl JointSignal {
    pub fn offset(x: f64, y: f64) -> Self {
        Self::Offset(Vector2::new(x, y))
    }

    pub fn as_offset(&self) -> Option<Vector2<f64>> {
        match self {
            Self::Offset(v) => Some(*v),
            Self::Angle(_) => None,
        }
    }

    pub fn as_angle(&self) -> Option<f64> {
        match self {
            Self::Angle(a) => Some(*a),
            Self::Offset(_) => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Self::Offset(v) => v.x.is_finite() && v.y.is_finite(),
            Self::Angle(a) => a.is_finite(),
        }
    }
}

/// Continuously overwritten map from signal key to latest value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointSignalBus {
    signals: BTreeMap<SignalKey, JointSignal>,
}

impl JointSignalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value stored under `key`.
    ///
    /// Non-finite values are refused and the previous value stays; returns
    /// whether the entry was written.
    pub fn update(&mut self, key: SignalKey, signal: JointSignal) -> bool {
        if !signal.is_finite() {
            log::debug!("Refusing non-finite signal for {}: {:?}", key, signal);
            return false;
        }
        self.signals.insert(key, signal);
        true
    }

    pub fn get(&self, key: SignalKey) -> Option<&JointSignal> {
        self.signals.get(&key)
    }

    pub fn head(&self) -> Option<Vector2<f64>> {
        self.get(SignalKey::Head).and_then(JointSignal::as_offset)
    }

    pub fn torso(&self) -> Option<Vector2<f64>> {
        self.get(SignalKey::Torso).and_then(JointSignal::as_offset)
    }

    pub fn angle(&self, joint: JointName) -> Option<f64> {
        self.get(SignalKey::Joint(joint)).and_then(JointSignal::as_angle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SignalKey, &JointSignal)> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_key_parse() {
        assert_eq!(SignalKey::parse("head"), Some(SignalKey::Head));
        assert_eq!(SignalKey::parse("torso"), Some(SignalKey::Torso));
        assert_eq!(
            SignalKey::parse("rightElbow"),
            Some(SignalKey::Joint(JointName::RightElbow))
        );
        assert_eq!(SignalKey::parse("tail"), None);
        assert_eq!(SignalKey::Joint(JointName::LeftShoulder).to_string(), "leftShoulder");
    }

    #[test]
    fn test_update_overwrites() {
        let mut bus = JointSignalBus::new();
        assert!(bus.update(SignalKey::Head, JointSignal::offset(1.0, 2.0)));
        assert!(bus.update(SignalKey::Head, JointSignal::offset(3.0, 4.0)));
        assert_eq!(bus.head(), Some(Vector2::new(3.0, 4.0)));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_non_finite_keeps_previous() {
        let mut bus = JointSignalBus::new();
        let key = SignalKey::Joint(JointName::RightElbow);
        bus.update(key, JointSignal::Angle(0.5));
        assert!(!bus.update(key, JointSignal::Angle(f64::NAN)));
        assert!(!bus.update(SignalKey::Torso, JointSignal::offset(f64::INFINITY, 0.0)));
        assert_eq!(bus.angle(JointName::RightElbow), Some(0.5));
        assert_eq!(bus.torso(), None);
    }

    #[test]
    fn test_kind_mismatch_reads_as_none() {
        let mut bus = JointSignalBus::new();
        bus.update(SignalKey::Head, JointSignal::Angle(1.0));
        assert_eq!(bus.head(), None);
    }

    #[test]
    fn test_signal_key_yaml() {
        let key: SignalKey = serde_yaml::from_str("leftElbow").unwrap();
        assert_eq!(key, SignalKey::Joint(JointName::LeftElbow));
        assert!(serde_yaml::from_str::<SignalKey>("elbow").is_err());
    }
}
