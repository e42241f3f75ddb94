//! CPU-side evaluation of the Gerstner displacement field.
//!
//! The forward map takes an un-displaced *reference* position to its
//! displaced *world* position. Height queries at a world position therefore
//! first invert that map with a fixed number of fixed-point iterations.

use std::ops::Add;

use glam::{Vec2, Vec3};

use crate::cascade::Batch;
use crate::components::ComponentSet;
use crate::spectrum::empirical;

/// Fixed iteration budget of [`WaveField::invert_to_reference`].
///
/// The horizontal error contracts by roughly `chop · Σ a·k` per iteration.
pub const INVERSE_ITERATIONS: usize = 4;

/// Components at or below this amplitude contribute nothing to queries.
const MIN_EVAL_AMPLITUDE: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
struct ResolvedWave {
    k: f32,
    speed: f32,
    dir: Vec2,
    amplitude: f32,
    phase: f32,
}

impl ResolvedWave {
    fn new(wavelength: f32, amplitude: f32, angle_rad: f32, phase: f32, gravity: f32) -> Self {
        Self {
            k: empirical::wavenumber(wavelength),
            speed: empirical::phase_speed(wavelength, gravity),
            dir: Vec2::new(angle_rad.cos(), angle_rad.sin()),
            amplitude,
            phase,
        }
    }

    #[inline]
    fn phase_at(&self, pos: Vec2, time: f32) -> f32 {
        self.k * (self.dir.dot(pos) + self.speed * time) + self.phase
    }
}

/// Partial derivatives of the displaced surface along local x and z.
#[derive(Debug, Clone, Copy)]
struct Partials {
    dx: Vec3,
    dz: Vec3,
}

impl Add for Partials {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { dx: self.dx + rhs.dx, dz: self.dz + rhs.dz }
    }
}

/// Sum a per-wave term. With `threading` the waves are sharded across the
/// rayon pool; the reduction order then differs from the sequential fold,
/// so results agree only within float tolerance.
fn accumulate<T, F>(waves: &[ResolvedWave], zero: T, term: F) -> T
where
    T: Copy + Send + Sync + Add<Output = T>,
    F: Fn(&ResolvedWave) -> T + Send + Sync,
{
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        waves.par_iter().map(term).reduce(|| zero, |a, b| a + b)
    }
    #[cfg(not(feature = "threading"))]
    {
        waves.iter().map(term).fold(zero, |a, b| a + b)
    }
}

/// A queryable snapshot of the surface.
#[derive(Debug, Clone)]
pub struct WaveField {
    waves: Vec<ResolvedWave>,
    chop: f32,
    elapsed_time: f32,
    sea_level: f32,
}

impl WaveField {
    /// Field over a whole component set; directions are relative to
    /// `wind_angle_deg`.
    pub fn from_components(set: &ComponentSet, wind_angle_deg: f32, chop: f32, gravity: f32) -> Self {
        let waves = set
            .iter()
            .filter(|c| c.amplitude > MIN_EVAL_AMPLITUDE)
            .map(|c| {
                let angle = (wind_angle_deg + c.direction_offset_deg).to_radians();
                ResolvedWave::new(c.wavelength, c.amplitude, angle, c.phase, gravity)
            })
            .collect();
        Self { waves, chop, elapsed_time: 0.0, sea_level: 0.0 }
    }

    /// Field over a single cascade batch; batch angles are already absolute.
    pub fn from_batch(batch: &Batch, chop: f32, gravity: f32) -> Self {
        let waves = batch
            .entries
            .iter()
            .filter(|e| e.amplitude > MIN_EVAL_AMPLITUDE)
            .map(|e| ResolvedWave::new(e.wavelength, e.amplitude, e.angle_rad, e.phase, gravity))
            .collect();
        Self { waves, chop, elapsed_time: 0.0, sea_level: 0.0 }
    }

    pub fn at_time(mut self, elapsed_time: f32) -> Self {
        self.elapsed_time = elapsed_time;
        self
    }

    pub fn with_sea_level(mut self, sea_level: f32) -> Self {
        self.sea_level = sea_level;
        self
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    /// Number of components that contribute to queries.
    pub fn active_components(&self) -> usize {
        self.waves.len()
    }

    /// Displacement of the reference point `pos` (only x/z are read).
    pub fn displacement(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        let p = Vec2::new(pos.x, pos.z);
        let t = self.elapsed_time + time_offset;
        let chop = self.chop;
        accumulate(&self.waves, Vec3::ZERO, |w| {
            let phi = w.phase_at(p, t);
            let horizontal = -chop * phi.sin();
            w.amplitude * Vec3::new(w.dir.x * horizontal, phi.cos(), w.dir.y * horizontal)
        })
    }

    /// Unit surface normal at the reference point `pos`.
    pub fn normal(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        let p = Vec2::new(pos.x, pos.z);
        let t = self.elapsed_time + time_offset;
        let chop = self.chop;
        let base = Partials { dx: Vec3::X, dz: Vec3::Z };
        let zero = Partials { dx: Vec3::ZERO, dz: Vec3::ZERO };
        let sum = accumulate(&self.waves, zero, |w| {
            let phi = w.phase_at(p, t);
            let horizontal = -chop * w.k * phi.cos();
            let along_x = w.dir.x * horizontal;
            let along_z = w.dir.y * horizontal;
            let vertical = -w.k * phi.sin();
            Partials {
                dx: w.amplitude * Vec3::new(w.dir.x * along_x, w.dir.x * vertical, w.dir.y * along_x),
                dz: w.amplitude * Vec3::new(w.dir.x * along_z, w.dir.y * vertical, w.dir.y * along_z),
            }
        });
        let d = base + sum;
        d.dz.cross(d.dx).normalize_or(Vec3::Y)
    }

    /// Particle velocity at the reference point `pos`, m/s.
    pub fn surface_velocity(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        let p = Vec2::new(pos.x, pos.z);
        let t = self.elapsed_time + time_offset;
        let chop = self.chop;
        accumulate(&self.waves, Vec3::ZERO, |w| {
            let phi = w.phase_at(p, t);
            let omega = w.k * w.speed;
            let horizontal = -chop * omega * phi.cos();
            w.amplitude * Vec3::new(w.dir.x * horizontal, -omega * phi.sin(), w.dir.y * horizontal)
        })
    }

    /// Reference position whose displaced image lands on `world` (x/z).
    ///
    /// Runs exactly [`INVERSE_ITERATIONS`] fixed-point steps with no
    /// convergence test. The returned y is sea level.
    pub fn invert_to_reference(&self, world: Vec3, time_offset: f32) -> Vec3 {
        let mut reference = world;
        for _ in 0..INVERSE_ITERATIONS {
            let error = reference + self.displacement(reference, time_offset) - world;
            reference.x -= error.x;
            reference.z -= error.z;
        }
        reference.y = self.sea_level;
        reference
    }

    /// Surface height at world position `world` (its y is ignored).
    pub fn height_at(&self, world: Vec3, time_offset: f32) -> f32 {
        let flat = Vec3::new(world.x, self.sea_level, world.z);
        let reference = self.invert_to_reference(flat, time_offset);
        self.sea_level + self.displacement(reference, time_offset).y
    }
}
