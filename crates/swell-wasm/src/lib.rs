//! Browser bindings: an [`Ocean`] handle over `swell_core::OceanSimulation`.
//!
//! Scalar queries return plain numbers or `Vec<f32>` (a `Float32Array` on the
//! JS side); structured results go through `serde-wasm-bindgen`.

use glam::Vec3;
use js_sys::Float32Array;
use swell_core::config::{OceanConfig, WindParams};
use swell_core::OceanSimulation;
use wasm_bindgen::prelude::*;

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct Ocean {
    sim: OceanSimulation,
}

impl Ocean {
    /// Build from a JSON config; an empty string means all defaults.
    pub fn from_json(config_json: &str) -> Result<Self, String> {
        let config = if config_json.trim().is_empty() {
            OceanConfig::default()
        } else {
            OceanConfig::from_json_str(config_json).map_err(|e| format!("Invalid config: {e}"))?
        };
        let sim = OceanSimulation::new(config).map_err(|e| e.to_string())?;
        Ok(Self { sim })
    }

    /// Keeps the configured fetch; the previous wind stays on error.
    pub fn update_wind(&mut self, speed: f32, direction_deg: f32) -> swell_core::Result<()> {
        let wind = self.sim.config().wind;
        self.sim.set_wind(WindParams { speed, direction_deg, ..wind })
    }
}

#[wasm_bindgen]
impl Ocean {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Ocean, JsValue> {
        Self::from_json(config_json).map_err(to_js_error)
    }

    /// Advance by `dt` seconds with the viewer at `(x, y, z)`.
    /// Returns the tick report as a JS object.
    pub fn tick(&mut self, dt: f32, x: f32, y: f32, z: f32) -> Result<JsValue, JsValue> {
        let report = self.sim.tick(dt, Vec3::new(x, y, z)).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&report).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn elapsed_time(&self) -> f32 {
        self.sim.elapsed_time()
    }

    pub fn height_at(&self, x: f32, z: f32, time_offset: f32) -> f32 {
        self.sim.height_at(Vec3::new(x, 0.0, z), time_offset)
    }

    /// `[dx, dy, dz]` at reference position `(x, z)`.
    pub fn displacement(&self, x: f32, z: f32, time_offset: f32) -> Vec<f32> {
        self.sim.displacement(Vec3::new(x, 0.0, z), time_offset).to_array().to_vec()
    }

    pub fn normal(&self, x: f32, z: f32, time_offset: f32) -> Vec<f32> {
        self.sim.normal(Vec3::new(x, 0.0, z), time_offset).to_array().to_vec()
    }

    pub fn surface_velocity(&self, x: f32, z: f32, time_offset: f32) -> Vec<f32> {
        self.sim.surface_velocity(Vec3::new(x, 0.0, z), time_offset).to_array().to_vec()
    }

    /// Row-major `nx × nz` grid of heights starting at `(x0, z0)`.
    pub fn sample_heights(&self, x0: f32, z0: f32, spacing: f32, nx: usize, nz: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(nx * nz);
        for j in 0..nz {
            for i in 0..nx {
                let world = Vec3::new(x0 + i as f32 * spacing, 0.0, z0 + j as f32 * spacing);
                out.push(self.sim.height_at(world, 0.0));
            }
        }
        out
    }

    /// Packed non-empty batches (transition last) for texture baking; each
    /// carries its target `lod`.
    pub fn batches(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.sim.packed_batches()).map_err(to_js_error)
    }

    /// Per-LOD mesh/normal/shape weights for the current scale.
    pub fn instance_weights(&self, lod: usize) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.sim.instance_weights(lod)).map_err(to_js_error)
    }

    /// Current octave table, log10 power per octave.
    pub fn power_log(&self) -> Float32Array {
        Float32Array::from(&self.sim.spectrum().power_log[..])
    }

    pub fn set_power_log(&mut self, octave: usize, power_log: f32) -> Result<(), JsValue> {
        self.sim.edit_spectrum(|s| s.set_power_log(octave, power_log)).map_err(to_js_error)
    }

    pub fn set_octave_enabled(&mut self, octave: usize, enabled: bool) -> Result<(), JsValue> {
        self.sim.edit_spectrum(|s| s.set_octave_enabled(octave, enabled)).map_err(to_js_error)
    }

    pub fn set_wind(&mut self, speed: f32, direction_deg: f32) -> Result<(), JsValue> {
        self.update_wind(speed, direction_deg).map_err(to_js_error)
    }
}
