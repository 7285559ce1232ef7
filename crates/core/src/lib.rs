//! Core library for City Groove.
//!
//! The crate turns a stream of magnitude spectra into beat events and
//! smoothly animated lighting parameters. Each tick runs synchronously in a
//! fixed order: band splitting, spectral flux, beat detection, then reactive
//! mapping. Spectrum acquisition and rendering live outside this crate;
//! [`SpectrumAnalyzer`] is only a small reference source for hosts and tests.

pub mod analysis;
pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod spectrum;
pub mod timeline;

pub use analysis::{
    AnalysisEngine, AnalysisFrame, BandEnergies, BandSplitter, BeatAnalysis, BeatDetector,
    FluxComputer, MovingAverageRing,
};
pub use config::{AppConfig, AudioConfig, BandConfig, BeatConfig, BeatStrategy, LightingResponseConfig};
pub use curve::{Interpolation, Keyframe, ResponseCurve};
pub use engine::{BeatEvent, BeatListener, LightingEngine, TickOutput};
pub use error::{CityGrooveError, Result};
pub use mapping::{LightingOutput, ReactiveMapper, ReactiveState, Rgb};
pub use spectrum::{SpectrumAnalyzer, SpectrumWindow};
pub use timeline::PlaybackClock;
