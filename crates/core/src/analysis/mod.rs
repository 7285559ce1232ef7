//! Per-tick spectrum analysis: band energies, spectral flux and beat
//! detection.

mod bands;
mod beat;
mod flux;
mod ring;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use bands::{BandEnergies, BandSplitter};
pub use beat::{dynamic_threshold, BeatAnalysis, BeatDetector};
pub(crate) use beat::clamp01;
pub use flux::FluxComputer;
pub use ring::MovingAverageRing;

use crate::{AppConfig, CityGrooveError, PlaybackClock, Result};

/// Feature set produced for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFrame {
    /// Seconds since the engine started (or was reset).
    pub timestamp: f64,
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub flux: f32,
    pub low_delta: f32,
    pub beat_score: f32,
    pub threshold: f32,
    pub beat_fired: bool,
}

/// Synchronous analysis pipeline: one spectrum in, one [`AnalysisFrame`] out.
pub struct AnalysisEngine {
    splitter: BandSplitter,
    flux: FluxComputer,
    detector: BeatDetector,
    clock: PlaybackClock,
}

impl AnalysisEngine {
    /// Builds the pipeline from an already validated configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let bins = config.band.fft_size;
        let splitter = BandSplitter::new(bins, config.audio.sample_rate, &config.band)?;

        debug!(
            bins,
            sample_rate = config.audio.sample_rate,
            low_max_bin = splitter.low_max_bin(),
            mid_max_bin = splitter.mid_max_bin(),
            "analysis engine created"
        );

        Ok(Self {
            splitter,
            flux: FluxComputer::new(bins),
            detector: BeatDetector::new(&config.beat),
            clock: PlaybackClock::default(),
        })
    }

    /// Number of bins every spectrum must have.
    pub fn bins(&self) -> usize {
        self.splitter.bins()
    }

    pub fn splitter(&self) -> &BandSplitter {
        &self.splitter
    }

    /// Time reached by the last processed tick.
    pub fn time(&self) -> f64 {
        self.clock.time_seconds
    }

    /// Analyses one spectrum observed `dt` seconds after the previous one.
    pub fn process(&mut self, spectrum: &[f32], dt: f32) -> Result<AnalysisFrame> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(CityGrooveError::InvalidInput(
                "frame delta must be a finite, non-negative number of seconds",
            ));
        }

        let bands = self.splitter.split(spectrum)?;
        let flux = self.flux.compute(spectrum)?;

        self.clock.advance(f64::from(dt));
        let timestamp = self.clock.time_seconds;
        let beat = self.detector.process(bands.low, flux, timestamp);

        Ok(AnalysisFrame {
            timestamp,
            low: bands.low,
            mid: bands.mid,
            high: bands.high,
            flux,
            low_delta: beat.low_delta,
            beat_score: beat.score,
            threshold: beat.threshold,
            beat_fired: beat.fired,
        })
    }

    /// Clears all history while preserving configuration.
    pub fn reset(&mut self) {
        self.flux.reset();
        self.detector.reset();
        self.clock.reset();
    }
}

impl fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("splitter", &self.splitter)
            .field("time", &self.clock.time_seconds)
            .field("last_beat", &self.detector.last_beat())
            .finish()
    }
}
