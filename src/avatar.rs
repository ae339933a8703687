//! Binds joint signals to the bones of a loaded avatar.
//!
//! Every render tick the binding reads the signal bus and sets bone rotations
//! through a [`RenderSurface`]. It also aims the look-at bones and places the
//! whole avatar. Mesh swaps are two-phase: the new mesh is imported and bound
//! first, and only then replaces the previous one, so a failed swap leaves the
//! old garment rendering with its old binding.

use crate::config::PlacementConfig;
use crate::keypoint::Pose;
use crate::placement::{AvatarPlacement, Placement};
use crate::rig::{BoneBinding, BoneRef, BoundLookAt, Component, Garment, RigConfig, Skeleton};
use crate::signals::JointSignalBus;
use crate::{Error, Result};
use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};

/// Opaque handle to a mesh held by the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// A mesh that has been imported but not yet shown
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMesh {
    pub handle: MeshHandle,
    pub skeleton: Skeleton,
}

/// The 3-D engine as seen by the binding
pub trait RenderSurface {
    /// Import a rigged mesh without displaying it
    fn import_mesh(&mut self, locator: &str, file_name: &str) -> Result<LoadedMesh>;

    /// Show `mesh` in place of the current one, scaled uniformly and reset to the origin
    fn activate_mesh(&mut self, mesh: MeshHandle, scale: f64);

    /// Drop an imported mesh that will not be shown
    fn discard_mesh(&mut self, mesh: MeshHandle);

    /// Set the local rotation of a bone of the active mesh
    fn set_bone_rotation(&mut self, bone: BoneRef, rotation: Vector3<f64>);

    /// Turn a bone of the active mesh toward `target`
    fn look_at(&mut self, bone: BoneRef, target: Point3<f64>);

    /// Move the whole avatar
    fn set_avatar_position(&mut self, position: Vector3<f64>);
}

/// Drives the active avatar from the signal bus
pub struct AvatarBinding {
    rig: RigConfig,
    binding: Option<BoneBinding>,
    active: Option<(MeshHandle, Garment)>,
    placement: AvatarPlacement,
    ticks: u64,
}

impl AvatarBinding {
    #[must_use]
    pub fn new(rig: RigConfig, placement: PlacementConfig) -> Self {
        Self {
            rig,
            binding: None,
            active: None,
            placement: AvatarPlacement::new(placement),
            ticks: 0,
        }
    }

    pub fn rig(&self) -> &RigConfig {
        &self.rig
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn binding(&self) -> Option<&BoneBinding> {
        self.binding.as_ref()
    }

    pub fn active_garment(&self) -> Option<&Garment> {
        self.active.as_ref().map(|(_, garment)| garment)
    }

    /// Replace the avatar mesh with `file_name` from `locator`.
    ///
    /// On failure the previous mesh and binding stay active.
    pub fn swap_mesh<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, locator: &str, file_name: &str) -> Result<()> {
        info!("Importing {} from {}", file_name, locator);

        let loaded = surface.import_mesh(locator, file_name).map_err(|e| {
            warn!("Import of {} failed, keeping current avatar: {}", file_name, e);
            match e {
                Error::AssetLoad(_) => e,
                other => Error::AssetLoad(format!("{file_name}: {other}")),
            }
        })?;

        let binding = match BoneBinding::build(&loaded.skeleton, &self.rig) {
            Ok(binding) => binding,
            Err(e) => {
                warn!("Skeleton of {} does not fit the rig, keeping current avatar: {}", file_name, e);
                surface.discard_mesh(loaded.handle);
                return Err(e);
            }
        };

        surface.activate_mesh(loaded.handle, self.rig.avatar_scale);
        self.binding = Some(binding);
        self.active = Some((
            loaded.handle,
            Garment {
                locator: locator.to_string(),
                file_name: file_name.to_string(),
            },
        ));
        info!("Avatar {} bound ({} bones)", file_name, loaded.skeleton.len());
        Ok(())
    }

    /// Set bone rotations and look-at targets from the bus
    pub fn apply_signals<S: RenderSurface + ?Sized>(&mut self, bus: &JointSignalBus, surface: &mut S) {
        self.ticks = self.ticks.wrapping_add(1);
        let Some(binding) = &self.binding else {
            return;
        };

        for look_at in binding.look_ats() {
            surface.look_at(look_at.bone, self.look_at_target(look_at, bus));
        }

        for bound in binding.drivers() {
            match bus.get(bound.key).and_then(|signal| signal.as_angle()) {
                Some(angle) => surface.set_bone_rotation(bound.bone, bound.driver.rotation(angle)),
                None => debug!("No angle on the bus for {}", bound.key),
            }
        }
    }

    /// Place the avatar from the latest pose; no-op until a mesh is bound
    pub fn apply_placement<S: RenderSurface + ?Sized>(&mut self, pose: Option<&Pose>, surface: &mut S) -> Option<Placement> {
        self.binding.as_ref()?;
        let placement = self.placement.update(pose);
        surface.set_avatar_position(placement.position);
        Some(placement)
    }

    /// One full render tick
    pub fn render_tick<S: RenderSurface + ?Sized>(&mut self, bus: &JointSignalBus, pose: Option<&Pose>, surface: &mut S) {
        self.apply_signals(bus, surface);
        self.apply_placement(pose, surface);
    }

    /// Target point of a look-at controller for the current tick.
    ///
    /// With a signal the configured axes follow its components. The idle
    /// oscillator, if any, sways its axis whenever no signal drives that axis.
    pub fn look_at_target(&self, look_at: &BoundLookAt, bus: &JointSignalBus) -> Point3<f64> {
        let config = &look_at.config;
        let mut target = Point3::from(config.base);
        let offset = bus.get(config.signal).and_then(|signal| signal.as_offset());

        if let Some(offset) = offset {
            for follow in &config.follow {
                let value = match follow.component {
                    Component::X => offset.x,
                    Component::Y => offset.y,
                };
                target[follow.axis.index()] += follow.scale * value;
            }
        }

        if let Some(idle) = &config.idle {
            let followed = offset.is_some() && config.follow.iter().any(|follow| follow.axis == idle.axis);
            if !followed {
                let phase = idle.step * self.ticks as f64;
                target[idle.axis.index()] = config.base[idle.axis.index()] + idle.amplitude * phase.sin();
            }
        }
        target
    }
}
