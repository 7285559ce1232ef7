use tracing::{debug, trace};

use super::MovingAverageRing;
use crate::{BeatConfig, BeatStrategy};

/// Averages at or below this are treated as silence instead of divided by.
const AVERAGE_EPSILON: f32 = 0.001;
/// Threshold used while the flux history is silent.
const BASE_THRESHOLD: f32 = 0.6;
const THRESHOLD_FLUX_SCALE: f32 = 10.0;
const THRESHOLD_MIN: f32 = 0.3;
const THRESHOLD_MAX: f32 = 0.8;
const LOW_WEIGHT: f32 = 0.4;
const FLUX_WEIGHT: f32 = 0.4;
const DELTA_WEIGHT: f32 = 0.2;
const FLUX_SENSITIVITY: f32 = 1.5;
/// Low energy must exceed its average by this factor for a beat to fire.
const LOW_GATE: f32 = 1.2;
const FLUX_THRESHOLD_OFFSET: f32 = 0.0005;

/// Everything the detector derived from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeatAnalysis {
    pub low_average: f32,
    pub flux_average: f32,
    pub low_delta: f32,
    /// Composite onset score in `[0, 1]` for [`BeatStrategy::Adaptive`], raw
    /// flux for [`BeatStrategy::FluxThreshold`].
    pub score: f32,
    /// Threshold the score was compared against, in the same units.
    pub threshold: f32,
    pub fired: bool,
}

/// Adaptive onset detector over low-band energy and spectral flux.
///
/// Both histories and the previous low value are updated on every call,
/// whether or not a beat fires. A beat is never reported twice within the
/// configured cooldown.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    strategy: BeatStrategy,
    cooldown: f64,
    flux_threshold_mul: f32,
    dynamic_threshold_sensitivity: f32,
    delta_sensitivity: f32,
    low_history: MovingAverageRing,
    flux_history: MovingAverageRing,
    previous_low: f32,
    /// Seconds of the most recent beat. Starts at zero so the cooldown also
    /// gates the first ticks after construction.
    last_beat: f64,
}

impl BeatDetector {
    pub fn new(config: &BeatConfig) -> Self {
        debug!(
            strategy = ?config.strategy,
            history = config.flux_history_len,
            cooldown = config.beat_cooldown,
            "beat detector created"
        );

        Self {
            strategy: config.strategy,
            cooldown: f64::from(config.beat_cooldown),
            flux_threshold_mul: config.flux_threshold_mul,
            dynamic_threshold_sensitivity: config.dynamic_threshold_sensitivity,
            delta_sensitivity: config.delta_sensitivity,
            low_history: MovingAverageRing::new(config.flux_history_len),
            flux_history: MovingAverageRing::new(config.flux_history_len),
            previous_low: 0.0,
            last_beat: 0.0,
        }
    }

    /// Time of the most recent beat, or zero if none fired since construction
    /// or reset.
    pub fn last_beat(&self) -> f64 {
        self.last_beat
    }

    /// Feeds one tick of low-band energy and flux observed at `now` seconds.
    pub fn process(&mut self, low: f32, flux: f32, now: f64) -> BeatAnalysis {
        let low_average = self.low_history.push(low);
        let flux_average = self.flux_history.push(flux);
        let low_delta = low - self.previous_low;
        self.previous_low = low;

        let cooled_down = now - self.last_beat > self.cooldown;

        let (score, threshold, fired) = match self.strategy {
            BeatStrategy::Adaptive => {
                let score = self.composite_score(low, low_average, flux, flux_average, low_delta);
                let threshold = dynamic_threshold(flux_average);
                let fired = score > threshold && cooled_down && low > low_average * LOW_GATE;
                (score, threshold, fired)
            }
            BeatStrategy::FluxThreshold => {
                let threshold = flux_average * self.flux_threshold_mul + FLUX_THRESHOLD_OFFSET;
                (flux, threshold, flux > threshold && cooled_down)
            }
        };

        if fired {
            trace!(now, score, threshold, "beat");
            self.last_beat = now;
        }

        BeatAnalysis {
            low_average,
            flux_average,
            low_delta,
            score,
            threshold,
            fired,
        }
    }

    /// Clears histories and beat timing while keeping configuration.
    pub fn reset(&mut self) {
        self.low_history.reset();
        self.flux_history.reset();
        self.previous_low = 0.0;
        self.last_beat = 0.0;
    }

    fn composite_score(
        &self,
        low: f32,
        low_average: f32,
        flux: f32,
        flux_average: f32,
        low_delta: f32,
    ) -> f32 {
        let low_relative =
            relative_to_average(low, low_average, self.dynamic_threshold_sensitivity);
        let flux_relative = relative_to_average(flux, flux_average, FLUX_SENSITIVITY);
        let delta_relative = clamp01(low_delta.abs() * self.delta_sensitivity);

        LOW_WEIGHT * low_relative + FLUX_WEIGHT * flux_relative + DELTA_WEIGHT * delta_relative
    }
}

/// Score threshold for the adaptive strategy. A non-silent flux history
/// replaces the base threshold outright.
pub fn dynamic_threshold(flux_average: f32) -> f32 {
    if flux_average > AVERAGE_EPSILON {
        (flux_average * THRESHOLD_FLUX_SCALE).clamp(THRESHOLD_MIN, THRESHOLD_MAX)
    } else {
        BASE_THRESHOLD
    }
}

fn relative_to_average(value: f32, average: f32, sensitivity: f32) -> f32 {
    if average > AVERAGE_EPSILON {
        clamp01((value / average - 1.0) * sensitivity)
    } else {
        0.0
    }
}

pub(crate) fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
