//! Viewer altitude → continuous cascade scale.
//!
//! The integer part selects the power-of-two horizontal scale of the LOD
//! rings; the fractional part is the cross-fade weight that hides the jump
//! to the next scale.

use serde::{Deserialize, Serialize};

/// Raw detail level per metre of viewer height.
pub const HEIGHT_LOD_MUL: f32 = 2.0;

/// Fraction of the maximum vertical displacement by which the detail
/// reference plane is lowered below sea level.
const DETAIL_PLANE_DISPLACEMENT_FRACTION: f32 = 0.2;

/// Ceiling on the raw level relative to the configured maximum scale.
const MAX_SCALE_HEADROOM: f32 = 1.99;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodScale {
    /// `floor(log2(level))`.
    pub level: i32,
    /// `log2(level) - floor(log2(level))`, in [0, 1).
    pub blend: f32,
    /// `2^level`.
    pub horizontal_scale: f32,
}

/// Per-LOD weights handed to the geometry collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceWeights {
    /// Morph toward the next scale; only the innermost ring morphs.
    pub mesh_scale_lerp: f32,
    /// Fade of far-field normals; only the outermost ring fades.
    pub far_normals_weight: f32,
    /// Weight of the wave shape sampled from this LOD.
    pub shape_weight: f32,
}

impl LodScale {
    /// Weights for ring `lod` of `lod_count`.
    pub fn instance_weights(&self, lod: usize, lod_count: usize) -> InstanceWeights {
        let last = lod + 1 == lod_count;
        InstanceWeights {
            mesh_scale_lerp: if lod == 0 { self.blend } else { 0.0 },
            far_normals_weight: if last { self.blend } else { 1.0 },
            shape_weight: if last { self.blend } else { 1.0 },
        }
    }
}

/// Viewer height above the detail reference plane, never negative.
///
/// The plane sits a fifth of the maximum vertical displacement below sea
/// level so that a viewer riding a trough still sees full detail.
pub fn detail_height(viewer_y: f32, sea_level: f32, max_vertical_displacement: f32) -> f32 {
    let plane = sea_level - max_vertical_displacement * DETAIL_PLANE_DISPLACEMENT_FRACTION;
    (viewer_y - plane).max(0.0)
}

/// Convert a viewer height into a cascade scale.
///
/// The raw level is `height · HEIGHT_LOD_MUL` clamped to
/// `[min_scale, 1.99 · max_scale]`; `max_scale = None` leaves it unbounded
/// above. `min_scale` must be positive.
pub fn update_scale(viewer_height: f32, min_scale: f32, max_scale: Option<f32>) -> LodScale {
    let mut level = (viewer_height * HEIGHT_LOD_MUL).max(min_scale);
    if let Some(max_scale) = max_scale {
        level = level.min(MAX_SCALE_HEADROOM * max_scale);
    }

    let l2 = level.log2();
    let l2f = l2.floor();

    LodScale {
        level: l2f as i32,
        blend: l2 - l2f,
        horizontal_scale: 2f32.powf(l2f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_viewer_sits_at_min_scale() {
        let s = update_scale(0.0, 16.0, Some(128.0));
        assert_eq!(s.level, 4);
        assert_eq!(s.blend, 0.0);
        assert_eq!(s.horizontal_scale, 16.0);
    }

    #[test]
    fn mid_altitude_splits_level_and_blend() {
        // 100 m → raw level 200 → log2 ≈ 7.644.
        let s = update_scale(100.0, 16.0, Some(128.0));
        assert_eq!(s.level, 7);
        assert_relative_eq!(s.blend, 200f32.log2() - 7.0, epsilon = 1e-5);
        assert_eq!(s.horizontal_scale, 128.0);
    }

    #[test]
    fn max_scale_caps_just_below_next_power() {
        let s = update_scale(10_000.0, 16.0, Some(128.0));
        assert_eq!(s.level, 7);
        assert!(s.blend > 0.99 && s.blend < 1.0, "blend {}", s.blend);
    }

    #[test]
    fn unbounded_max_scale_keeps_growing() {
        let s = update_scale(10_000.0, 16.0, None);
        assert_eq!(s.level, 14);
        assert_eq!(s.horizontal_scale, 16384.0);
    }

    #[test]
    fn continuous_level_is_monotonic_in_height() {
        let mut prev = f32::NEG_INFINITY;
        for step in 0..400 {
            let h = step as f32 * 0.75;
            let s = update_scale(h, 16.0, Some(128.0));
            assert!((0.0..1.0).contains(&s.blend));
            let continuous = s.level as f32 + s.blend;
            assert!(continuous >= prev - 1e-6, "level fell at h={h}");
            prev = continuous;
        }
    }

    #[test]
    fn detail_plane_drops_with_displacement() {
        assert_eq!(detail_height(10.0, 0.0, 0.0), 10.0);
        assert_eq!(detail_height(10.0, 0.0, 5.0), 11.0);
        assert_eq!(detail_height(-3.0, 0.0, 5.0), 0.0);
    }

    #[test]
    fn only_edge_rings_blend() {
        let s = LodScale { level: 5, blend: 0.4, horizontal_scale: 32.0 };
        let inner = s.instance_weights(0, 7);
        assert_eq!(inner.mesh_scale_lerp, 0.4);
        assert_eq!(inner.far_normals_weight, 1.0);
        let middle = s.instance_weights(3, 7);
        assert_eq!(middle, InstanceWeights { mesh_scale_lerp: 0.0, far_normals_weight: 1.0, shape_weight: 1.0 });
        let outer = s.instance_weights(6, 7);
        assert_eq!(outer.far_normals_weight, 0.4);
        assert_eq!(outer.shape_weight, 0.4);
    }
}
