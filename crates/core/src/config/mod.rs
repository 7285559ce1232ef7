use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CityGrooveError, ResponseCurve, Result, SpectrumWindow};

/// Smallest spectrum length the analysis accepts.
pub const MIN_FFT_SIZE: usize = 256;
/// Bounds of the moving-average history length.
pub const MIN_HISTORY_LEN: usize = 16;
pub const MAX_HISTORY_LEN: usize = 256;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub band: BandConfig,
    pub beat: BeatConfig,
    pub lighting: LightingResponseConfig,
}

impl AppConfig {
    /// Parses a (possibly partial) JSON preset. Missing fields keep their
    /// defaults. The result is not validated yet.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects configuration that cannot be used and clamps everything else
    /// into its documented range.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            audio: self.audio.validated()?,
            band: self.band.validated()?,
            beat: self.beat.validated()?,
            lighting: self.lighting.validated()?,
        })
    }
}

/// Configuration of the audio stream feeding the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
        }
    }
}

impl AudioConfig {
    pub fn validated(self) -> Result<Self> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(CityGrooveError::config(format!(
                "sample rate must be a positive number, got {}",
                self.sample_rate
            )));
        }
        Ok(self)
    }
}

/// Spectrum size and band boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Number of magnitude bins per spectrum.
    pub fft_size: usize,
    pub low_max_hz: u32,
    pub mid_max_hz: u32,
    /// Window the spectrum source applies before its transform.
    pub window: SpectrumWindow,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            low_max_hz: 200,
            mid_max_hz: 2000,
            window: SpectrumWindow::BlackmanHarris,
        }
    }
}

impl BandConfig {
    pub fn validated(mut self) -> Result<Self> {
        if self.fft_size < MIN_FFT_SIZE {
            return Err(CityGrooveError::config(format!(
                "fft_size must be at least {MIN_FFT_SIZE}, got {}",
                self.fft_size
            )));
        }
        clamp_min_u32("band.low_max_hz", &mut self.low_max_hz, 50);
        clamp_min_u32("band.mid_max_hz", &mut self.mid_max_hz, 1000);
        Ok(self)
    }
}

/// Rule used to turn the analysed signal into beat events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatStrategy {
    /// Composite score of relative low energy, relative flux and low delta
    /// against a flux-driven dynamic threshold.
    #[default]
    Adaptive,
    /// Flux against its moving average scaled by `flux_threshold_mul`.
    FluxThreshold,
}

/// Beat detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    pub strategy: BeatStrategy,
    pub flux_threshold_mul: f32,
    /// Minimum seconds between two beat events.
    pub beat_cooldown: f32,
    pub flux_history_len: usize,
    pub dynamic_threshold_sensitivity: f32,
    pub delta_sensitivity: f32,
    pub beat_emphasis_multiplier: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            strategy: BeatStrategy::Adaptive,
            flux_threshold_mul: 1.5,
            beat_cooldown: 0.12,
            flux_history_len: 43,
            dynamic_threshold_sensitivity: 2.0,
            delta_sensitivity: 100.0,
            beat_emphasis_multiplier: 0.5,
        }
    }
}

impl BeatConfig {
    pub fn validated(mut self) -> Result<Self> {
        if self.flux_history_len < MIN_HISTORY_LEN {
            return Err(CityGrooveError::config(format!(
                "flux_history_len must be at least {MIN_HISTORY_LEN}, got {}",
                self.flux_history_len
            )));
        }
        if self.flux_history_len > MAX_HISTORY_LEN {
            warn!(
                field = "beat.flux_history_len",
                value = self.flux_history_len,
                clamped = MAX_HISTORY_LEN,
                "configuration value out of range, clamping"
            );
            self.flux_history_len = MAX_HISTORY_LEN;
        }

        clamp_f32("beat.flux_threshold_mul", &mut self.flux_threshold_mul, 0.5, 3.0)?;
        clamp_f32("beat.beat_cooldown", &mut self.beat_cooldown, 0.05, 0.3)?;
        clamp_f32(
            "beat.dynamic_threshold_sensitivity",
            &mut self.dynamic_threshold_sensitivity,
            0.5,
            3.0,
        )?;
        clamp_f32("beat.delta_sensitivity", &mut self.delta_sensitivity, 10.0, 200.0)?;
        clamp_f32(
            "beat.beat_emphasis_multiplier",
            &mut self.beat_emphasis_multiplier,
            0.1,
            2.0,
        )?;
        Ok(self)
    }
}

/// Gains, decays, colour and response curves of the reactive lighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingResponseConfig {
    pub base_intensity: f32,
    pub low_gain: f32,
    /// Amount added to the flash and emphasis accumulators per beat.
    pub beat_flash: f32,
    /// Units per second the flash accumulator falls towards zero.
    pub flash_decay: f32,
    /// Units per second the emphasis accumulator falls towards zero.
    pub beat_emphasis_decay: f32,
    pub emission_base: f32,
    pub emission_gain: f32,
    /// Hue a fresh [`crate::ReactiveState`] starts from.
    pub base_hue: f32,
    /// Hue revolutions per second at full high-band response.
    pub hue_speed: f32,
    pub saturation: f32,
    pub value: f32,
    pub low_to_intensity: ResponseCurve,
    pub high_to_hue_speed: ResponseCurve,
}

impl Default for LightingResponseConfig {
    fn default() -> Self {
        Self {
            base_intensity: 1.2,
            low_gain: 30.0,
            beat_flash: 2.0,
            flash_decay: 5.0,
            beat_emphasis_decay: 2.0,
            emission_base: 1.0,
            emission_gain: 8.0,
            base_hue: 0.6,
            hue_speed: 0.1,
            saturation: 0.9,
            value: 1.0,
            low_to_intensity: ResponseCurve::ease_in_out(),
            high_to_hue_speed: ResponseCurve::linear(),
        }
    }
}

impl LightingResponseConfig {
    pub fn validated(mut self) -> Result<Self> {
        for (name, value) in [
            ("lighting.base_intensity", &mut self.base_intensity),
            ("lighting.low_gain", &mut self.low_gain),
            ("lighting.beat_flash", &mut self.beat_flash),
            ("lighting.flash_decay", &mut self.flash_decay),
            ("lighting.beat_emphasis_decay", &mut self.beat_emphasis_decay),
            ("lighting.emission_base", &mut self.emission_base),
            ("lighting.emission_gain", &mut self.emission_gain),
            ("lighting.hue_speed", &mut self.hue_speed),
        ] {
            clamp_f32(name, value, 0.0, f32::MAX)?;
        }

        clamp_f32("lighting.base_hue", &mut self.base_hue, 0.0, 1.0)?;
        clamp_f32("lighting.saturation", &mut self.saturation, 0.0, 1.0)?;
        clamp_f32("lighting.value", &mut self.value, 0.0, 2.0)?;

        self.low_to_intensity.validate()?;
        self.high_to_hue_speed.validate()?;
        Ok(self)
    }
}

fn clamp_f32(name: &'static str, value: &mut f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(CityGrooveError::config(format!(
            "{name} must be finite, got {value}"
        )));
    }

    let clamped = value.clamp(min, max);
    if clamped != *value {
        warn!(
            field = name,
            value = *value,
            clamped,
            "configuration value out of range, clamping"
        );
        *value = clamped;
    }
    Ok(())
}

fn clamp_min_u32(name: &'static str, value: &mut u32, min: u32) {
    if *value < min {
        warn!(
            field = name,
            value = *value,
            clamped = min,
            "configuration value out of range, clamping"
        );
        *value = min;
    }
}
