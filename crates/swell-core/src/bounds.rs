//! Culling bounds for displaced geometry chunks.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::components::MaxDisplacement;

/// Displacements at or below this are treated as a flat sea.
const FLAT_EPSILON: f32 = 1e-4;

/// Axis-aligned box in a chunk's local (unscaled) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub center: Vec3,
    /// Half-size along each axis.
    pub extents: Vec3,
}

impl ChunkBounds {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Grow the box so it contains the chunk under any displacement up to
    /// `max`. `scale_xz` and `scale_y` are the chunk's world scale; the
    /// result stays in local space.
    ///
    /// Returns `self` unchanged when either displacement bound is ~0.
    pub fn expanded(&self, max: MaxDisplacement, scale_xz: f32, scale_y: f32) -> Self {
        if max.horizontal <= FLAT_EPSILON || max.vertical <= FLAT_EPSILON {
            return *self;
        }
        let grow_xz = max.horizontal / scale_xz;
        Self {
            center: self.center,
            extents: Vec3::new(
                self.extents.x + grow_xz,
                max.vertical / scale_y,
                self.extents.z + grow_xz,
            ),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }
}
