//! Ocean configuration: spectrum, wind, and the geometry collaborator's
//! cascade inputs, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwellError};
use crate::spectrum::{OctaveSpectrum, MAX_POWER_LOG, MIN_POWER_LOG, STANDARD_GRAVITY};

// ── Parameter groups ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindParams {
    /// m/s at 10 m above the surface.
    pub speed: f32,
    /// Global wind direction, degrees.
    pub direction_deg: f32,
    /// Distance over which the wind has blown, metres. JONSWAP only.
    pub fetch: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self { speed: 5.0, direction_deg: 0.0, fetch: 1000.0 }
    }
}

/// Inputs owned by the geometry collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    pub min_scale: f32,
    /// `None` leaves the scale unbounded above.
    pub max_scale: Option<f32>,
    pub min_texels_per_wave: f32,
    pub base_vert_density: f32,
    pub lod_count: usize,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            min_scale: 16.0,
            max_scale: Some(128.0),
            min_texels_per_wave: 5.0,
            base_vert_density: 32.0,
            lod_count: 7,
        }
    }
}

/// Where the octave table comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpectrumSource {
    /// Use `spectrum.power_log` as given.
    #[default]
    Manual,
    Phillips,
    PiersonMoskowitz,
    Jonswap,
}

// ── Top-level config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    pub spectrum: OctaveSpectrum,
    pub wind: WindParams,
    pub geometry: GeometryParams,
    pub spectrum_source: SpectrumSource,
    /// m/s². Overrides `spectrum.gravity` when a simulation is built.
    pub gravity: f32,
    pub sea_level: f32,
    pub seed: u64,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            spectrum: OctaveSpectrum::default(),
            wind: WindParams::default(),
            geometry: GeometryParams::default(),
            spectrum_source: SpectrumSource::default(),
            gravity: STANDARD_GRAVITY,
            sea_level: 0.0,
            seed: 0,
        }
    }
}

impl OceanConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Range-check every recognized option.
    pub fn validate(&self) -> Result<()> {
        validate_spectrum_shape(&self.spectrum)?;
        for &p in &self.spectrum.power_log {
            in_range("spectrum.power_log", p, MIN_POWER_LOG, MAX_POWER_LOG)?;
        }
        self.wind.validate()?;

        let g = &self.geometry;
        if g.lod_count == 0 {
            return Err(SwellError::InvalidLodCount(g.lod_count));
        }
        positive("geometry.min_scale", g.min_scale)?;
        if let Some(max_scale) = g.max_scale {
            in_range("geometry.max_scale", max_scale, g.min_scale, f32::MAX)?;
        }
        positive("geometry.min_texels_per_wave", g.min_texels_per_wave)?;
        positive("geometry.base_vert_density", g.base_vert_density)?;

        positive("gravity", self.gravity)?;
        finite("sea_level", self.sea_level)?;
        Ok(())
    }
}

impl WindParams {
    pub fn validate(&self) -> Result<()> {
        in_range("wind.speed", self.speed, 0.0, f32::MAX)?;
        finite("wind.direction_deg", self.direction_deg)?;
        positive("wind.fetch", self.fetch)
    }
}

/// Checks on the shaping scalars of a live spectrum.
///
/// Power values only need to be finite here: the empirical spectra have no
/// upper clamp, so a filled table may sit above `MAX_POWER_LOG`.
pub fn validate_spectrum_shape(s: &OctaveSpectrum) -> Result<()> {
    if s.components_per_octave == 0 {
        return Err(SwellError::config("spectrum.components_per_octave", "must be at least 1"));
    }
    in_range("spectrum.direction_variance_deg", s.direction_variance_deg, 0.0, 180.0)?;
    in_range("spectrum.chop", s.chop, 0.0, 2.0)?;
    in_range("spectrum.weight", s.weight, 0.0, 1.0)?;
    for &p in &s.power_log {
        finite("spectrum.power_log", p)?;
    }
    Ok(())
}

fn in_range(field: &'static str, value: f32, lo: f32, hi: f32) -> Result<()> {
    if value.is_finite() && (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(SwellError::config(field, format!("must be in [{lo}, {hi}], got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SwellError::config(field, format!("must be positive, got {value}")))
    }
}

fn finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SwellError::config(field, format!("must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::NUM_OCTAVES;

    #[test]
    fn defaults_are_valid() {
        let c = OceanConfig::default();
        c.validate().expect("default config must validate");
        assert_eq!(c.spectrum.components_per_octave, 5);
        assert_eq!(c.spectrum.power_log, [MIN_POWER_LOG; NUM_OCTAVES]);
        assert_eq!(c.wind.speed, 5.0);
        assert_eq!(c.geometry.lod_count, 7);
        assert_eq!(c.geometry.max_scale, Some(128.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = OceanConfig::from_json_str(
            r#"{ "wind": { "speed": 12.0 }, "spectrum_source": "pierson-moskowitz", "seed": 7 }"#,
        )
        .expect("partial config should parse");
        assert_eq!(c.wind.speed, 12.0);
        assert_eq!(c.wind.fetch, 1000.0);
        assert_eq!(c.spectrum_source, SpectrumSource::PiersonMoskowitz);
        assert_eq!(c.seed, 7);
        assert_eq!(c.geometry, GeometryParams::default());
    }

    #[test]
    fn null_max_scale_is_unbounded() {
        let c = OceanConfig::from_json_str(r#"{ "geometry": { "max_scale": null } }"#).unwrap();
        assert_eq!(c.geometry.max_scale, None);
    }

    #[test]
    fn zero_lods_is_a_lod_count_error() {
        let err = OceanConfig::from_json_str(r#"{ "geometry": { "lod_count": 0 } }"#).unwrap_err();
        assert!(matches!(err, SwellError::InvalidLodCount(0)), "got {err}");
    }

    #[test]
    fn out_of_range_options_name_their_field() {
        let cases: [(&str, &str); 6] = [
            (r#"{ "spectrum": { "chop": 2.5 } }"#, "spectrum.chop"),
            (r#"{ "spectrum": { "weight": -0.1 } }"#, "spectrum.weight"),
            (r#"{ "spectrum": { "components_per_octave": 0 } }"#, "spectrum.components_per_octave"),
            (r#"{ "spectrum": { "direction_variance_deg": 200.0 } }"#, "spectrum.direction_variance_deg"),
            (r#"{ "geometry": { "min_scale": 64.0, "max_scale": 32.0 } }"#, "geometry.max_scale"),
            (r#"{ "wind": { "fetch": 0.0 } }"#, "wind.fetch"),
        ];
        for (json, expected) in cases {
            match OceanConfig::from_json_str(json) {
                Err(SwellError::InvalidConfig { field, .. }) => assert_eq!(field, expected, "for {json}"),
                other => panic!("{json}: expected InvalidConfig for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(OceanConfig::from_json_str("{ nope"), Err(SwellError::Parse(_))));
        assert!(matches!(
            OceanConfig::from_json_str(r#"{ "spectrum_source": "tsunami" }"#),
            Err(SwellError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = OceanConfig::from_path("/nonexistent/swell/ocean.json").unwrap_err();
        assert!(matches!(err, SwellError::Io(_)));
    }

    #[test]
    fn wind_checks_stand_alone() {
        assert!(WindParams::default().validate().is_ok());
        let nan = WindParams { direction_deg: f32::NAN, ..WindParams::default() };
        assert!(matches!(nan.validate(), Err(SwellError::InvalidConfig { field: "wind.direction_deg", .. })));
        let calm = WindParams { speed: 0.0, ..WindParams::default() };
        assert!(calm.validate().is_ok(), "zero wind is allowed");
    }

    #[test]
    fn spectrum_shape_allows_power_above_manual_range() {
        let mut s = OctaveSpectrum::default();
        s.power_log[11] = MAX_POWER_LOG + 2.0;
        assert!(validate_spectrum_shape(&s).is_ok());
        s.power_log[11] = f32::INFINITY;
        assert!(validate_spectrum_shape(&s).is_err());
    }

    #[test]
    fn config_survives_json() {
        let mut c = OceanConfig::default();
        c.spectrum.set_octave_enabled(3, false);
        c.spectrum_source = SpectrumSource::Jonswap;
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(OceanConfig::from_json_str(&json).unwrap(), c);
    }
}
