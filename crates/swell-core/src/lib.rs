//! Spectral Gerstner ocean: octave power spectrum, stochastic wave
//! components, LOD cascade batching, and CPU-side surface queries.

pub mod bounds;
pub mod cascade;
pub mod components;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lod;
pub mod simulation;
pub mod spectrum;

pub use config::OceanConfig;
pub use error::{Result, SwellError};
pub use evaluator::WaveField;
pub use simulation::{OceanSimulation, TickReport};

pub use glam;
