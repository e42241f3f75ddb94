//! Closed-form empirical ocean spectra.
//!
//! All functions take a wavelength in metres and return spectral power.
//! Deep-water dispersion throughout: ω = √(g·k), k = 2π/λ.

use std::f32::consts::TAU;

/// Phillips constant.
pub const PHILLIPS_ALPHA: f32 = 0.0081;
/// JONSWAP peak-enhancement factor.
pub const JONSWAP_GAMMA: f32 = 3.3;

#[inline]
pub fn wavenumber(wavelength: f32) -> f32 {
    TAU / wavelength
}

/// Angular frequency of a deep-water wave.
#[inline]
pub fn angular_frequency(wavelength: f32, gravity: f32) -> f32 {
    (gravity * wavenumber(wavelength)).sqrt()
}

/// Deep-water phase speed C = √(g/k).
#[inline]
pub fn phase_speed(wavelength: f32, gravity: f32) -> f32 {
    (gravity / wavenumber(wavelength)).sqrt()
}

/// Directional Phillips spectrum P(k) = a·(k̂·ŵ)²·exp(−1/(k²L²)) / k⁴, L = V²/g.
///
/// The wave vector is laid along `wave_angle_deg`; `wind_dir` is the unit
/// wind direction on the XZ plane.
pub fn phillips(wind_speed: f32, wind_dir: [f32; 2], gravity: f32, wavelength: f32, wave_angle_deg: f32) -> f32 {
    let k = wavenumber(wavelength);
    let angle = wave_angle_deg.to_radians();
    let kx = angle.cos() * k;
    let kz = angle.sin() * k;
    let k2 = kx * kx + kz * kz;
    let kdotw = wind_dir[0] * kx + wind_dir[1] * kz;
    let l = wind_speed * wind_speed / gravity;
    PHILLIPS_ALPHA * kdotw * kdotw * (-1.0 / (k2 * l * l)).exp() / (k2 * k2)
}

/// Base spectrum S0 = α·g²/ω⁵.
pub fn base(gravity: f32, alpha: f32, wavelength: f32) -> f32 {
    let omega = angular_frequency(wavelength, gravity);
    alpha * gravity * gravity / omega.powi(5)
}

/// Pierson-Moskowitz with the peak derived from wind speed (ωp = 0.855·g/V).
pub fn pierson_moskowitz(gravity: f32, wind_speed: f32, wavelength: f32) -> f32 {
    let omega_peak = 0.855 * gravity / wind_speed;
    pierson_moskowitz_with_peak(gravity, omega_peak, PHILLIPS_ALPHA, wavelength)
}

/// Pierson-Moskowitz shape for an explicit peak frequency and α.
pub fn pierson_moskowitz_with_peak(gravity: f32, omega_peak: f32, alpha: f32, wavelength: f32) -> f32 {
    let omega = angular_frequency(wavelength, gravity);
    base(gravity, alpha, wavelength) * (-(omega_peak / omega).powi(4) * 5.0 / 4.0).exp()
}

/// JONSWAP: fetch-limited Pierson-Moskowitz with peak enhancement γ^r.
pub fn jonswap(gravity: f32, wind_speed: f32, wavelength: f32, fetch: f32) -> f32 {
    let alpha = 0.076 * (wind_speed * wind_speed / (fetch * gravity)).powf(0.22);
    let omega = angular_frequency(wavelength, gravity);
    let omega_peak = 22.0 * (gravity * gravity / (wind_speed * fetch)).powf(1.0 / 3.0);
    let sigma = if omega <= omega_peak { 0.07 } else { 0.09 };
    let r = (-(omega - omega_peak).powi(2) / (2.0 * sigma * sigma * omega_peak * omega_peak)).exp();
    pierson_moskowitz_with_peak(gravity, omega_peak, alpha, wavelength) * JONSWAP_GAMMA.powf(r)
}
