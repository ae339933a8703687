//! Headless pipeline endpoints: recorded pose streams and an in-memory render surface.
//!
//! A recording is a YAML (or JSON) list of estimator results, one per
//! estimation cycle, each being the list of detected subjects:
//!
//! ```yaml
//! - - score: 0.92
//!     keypoints:
//!       - part: leftShoulder
//!         position: { x: 360.0, y: 240.0 }
//!         score: 0.9
//! - []
//! ```

use crate::avatar::{LoadedMesh, MeshHandle, RenderSurface};
use crate::keypoint::PoseDetection;
use crate::pipeline::{PoseSource, PoseStatus, VideoSurface};
use crate::rig::{BoneRef, BoneSelector, RigConfig, Skeleton};
use crate::{Error, Result};
use log::debug;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::path::Path;

/// Pose source that plays back recorded estimator results
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: Vec<Vec<PoseDetection>>,
    cursor: usize,
    latency: u32,
    waited: u32,
    looping: bool,
}

impl ReplaySource {
    #[must_use]
    pub fn from_frames(frames: Vec<Vec<PoseDetection>>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Load a recording from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let frames: Vec<Vec<PoseDetection>> = serde_yaml::from_str(content)
            .map_err(|e| Error::PoseSourceError(format!("Failed to parse recording: {}", e)))?;
        Ok(Self::from_frames(frames))
    }

    /// Report [`PoseStatus::Pending`] for `polls` polls before each result
    #[must_use]
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Start over from the first frame once the recording ends
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether every frame has been played and the source is not looping
    pub fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.frames.len()
    }
}

impl PoseSource for ReplaySource {
    fn poll(&mut self) -> Result<PoseStatus> {
        if self.waited < self.latency {
            self.waited += 1;
            return Ok(PoseStatus::Pending);
        }
        self.waited = 0;

        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                // Past the end the subject has left the scene
                return Ok(PoseStatus::Ready(Vec::new()));
            }
            self.cursor = 0;
        }

        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(PoseStatus::Ready(frame))
    }
}

/// Camera stand-in that becomes ready after a number of polls
#[derive(Debug, Clone)]
pub struct StaticVideo {
    width: u32,
    height: u32,
    ready_after: Option<u32>,
    polls: u32,
}

impl StaticVideo {
    /// Ready from the first poll
    #[must_use]
    pub fn ready(width: u32, height: u32) -> Self {
        Self::ready_after(0, width, height)
    }

    /// Not ready for the first `polls` polls
    #[must_use]
    pub fn ready_after(polls: u32, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ready_after: Some(polls),
            polls: 0,
        }
    }

    #[must_use]
    pub fn never_ready() -> Self {
        Self {
            width: 0,
            height: 0,
            ready_after: None,
            polls: 0,
        }
    }
}

impl VideoSurface for StaticVideo {
    fn poll_ready(&mut self) -> bool {
        self.polls = self.polls.saturating_add(1);
        self.ready_after.map_or(false, |after| self.polls > after)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Render surface that records what the binding asked it to do
#[derive(Debug, Default)]
pub struct RecordingSurface {
    assets: HashMap<String, Vec<String>>,
    meshes: HashMap<MeshHandle, String>,
    next_handle: u64,
    active: Option<(MeshHandle, f64)>,
    discarded: usize,
    rotations: HashMap<BoneRef, Vector3<f64>>,
    look_targets: HashMap<BoneRef, Point3<f64>>,
    position: Option<Vector3<f64>>,
    rotation_updates: u64,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface on which every garment of `rig` imports with a skeleton that fits it.
    ///
    /// Indexed bones get placeholder names `bone_<n>`; named bones are appended.
    #[must_use]
    pub fn for_rig(rig: &RigConfig) -> Self {
        let selectors = rig
            .bones
            .values()
            .map(|driver| &driver.bone)
            .chain(rig.look_at.iter().map(|look_at| &look_at.bone));

        let mut count = 0;
        let mut names = Vec::new();
        for selector in selectors {
            match selector {
                BoneSelector::Index(index) => count = count.max(index + 1),
                BoneSelector::Name(name) if !names.contains(name) => names.push(name.clone()),
                BoneSelector::Name(_) => {}
            }
        }
        let bones: Vec<String> = (0..count).map(|i| format!("bone_{i}")).chain(names).collect();

        let mut surface = Self::new();
        for garment in &rig.garments {
            surface.add_asset(&garment.file_name, bones.clone());
        }
        surface
    }

    /// Make `file_name` importable with the given bone names
    pub fn add_asset(&mut self, file_name: &str, bones: Vec<String>) {
        self.assets.insert(file_name.to_string(), bones);
    }

    pub fn active_mesh_name(&self) -> Option<&str> {
        let (handle, _) = self.active?;
        self.meshes.get(&handle).map(String::as_str)
    }

    pub fn active_scale(&self) -> Option<f64> {
        self.active.map(|(_, scale)| scale)
    }

    /// Number of imported meshes that were dropped without being shown
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn bone_rotation(&self, bone: BoneRef) -> Option<Vector3<f64>> {
        self.rotations.get(&bone).copied()
    }

    pub fn look_target(&self, bone: BoneRef) -> Option<Point3<f64>> {
        self.look_targets.get(&bone).copied()
    }

    pub fn avatar_position(&self) -> Option<Vector3<f64>> {
        self.position
    }

    /// Total bone rotations set since creation
    pub fn rotation_updates(&self) -> u64 {
        self.rotation_updates
    }
}

impl RenderSurface for RecordingSurface {
    fn import_mesh(&mut self, locator: &str, file_name: &str) -> Result<LoadedMesh> {
        let bones = self
            .assets
            .get(file_name)
            .ok_or_else(|| Error::AssetLoad(format!("{}{} not found", locator, file_name)))?;

        self.next_handle += 1;
        let handle = MeshHandle(self.next_handle);
        self.meshes.insert(handle, file_name.to_string());
        debug!("Imported {} as {:?} ({} bones)", file_name, handle, bones.len());

        Ok(LoadedMesh {
            handle,
            skeleton: Skeleton::new(bones.clone()),
        })
    }

    fn activate_mesh(&mut self, mesh: MeshHandle, scale: f64) {
        if let Some((previous, _)) = self.active.take() {
            self.meshes.remove(&previous);
        }
        self.active = Some((mesh, scale));
        self.rotations.clear();
        self.look_targets.clear();
        self.position = None;
        debug!("Activated {:?} at scale {}", mesh, scale);
    }

    fn discard_mesh(&mut self, mesh: MeshHandle) {
        if self.meshes.remove(&mesh).is_some() {
            self.discarded += 1;
        }
    }

    fn set_bone_rotation(&mut self, bone: BoneRef, rotation: Vector3<f64>) {
        self.rotations.insert(bone, rotation);
        self.rotation_updates += 1;
    }

    fn look_at(&mut self, bone: BoneRef, target: Point3<f64>) {
        self.look_targets.insert(bone, target);
    }

    fn set_avatar_position(&mut self, position: Vector3<f64>) {
        self.position = Some(position);
    }
}
