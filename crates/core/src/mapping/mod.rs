//! Maps analysis frames onto continuous lighting parameters.
//!
//! All persistent values live in [`ReactiveState`], which the caller owns and
//! threads through every tick. The mapper itself only holds configuration.

use serde::{Deserialize, Serialize};

use crate::{analysis::clamp01, AnalysisFrame, LightingResponseConfig};

/// Fixed rescale of raw band energy onto `[0, 1]`. Coarse: the real loudness
/// range depends on the source material.
pub fn normalize(value: f32) -> f32 {
    clamp01(value * 10.0)
}

/// Values carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactiveState {
    /// Position on the colour wheel, always in `[0, 1)`.
    pub hue: f32,
    /// Short beat flash, decays quickly.
    pub flash_add: f32,
    /// Longer beat glow, decays slowly.
    pub beat_emphasis: f32,
}

impl ReactiveState {
    /// Fresh state starting at the configured base hue with no transients.
    pub fn from_config(config: &LightingResponseConfig) -> Self {
        Self {
            hue: wrap_hue(config.base_hue),
            flash_add: 0.0,
            beat_emphasis: 0.0,
        }
    }
}

impl Default for ReactiveState {
    fn default() -> Self {
        Self::from_config(&LightingResponseConfig::default())
    }
}

/// Linear RGB colour. Components exceed 1.0 when value or emission does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Converts hue/saturation/value to RGB. Hue wraps, saturation is
    /// clamped to `[0, 1]` and value is used as given.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let saturation = clamp01(saturation);
        let sector = wrap_hue(hue) * 6.0;
        let index = sector.floor();
        let fraction = sector - index;

        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * fraction);
        let t = value * (1.0 - saturation * (1.0 - fraction));

        match index as u8 {
            0 => Self::new(value, t, p),
            1 => Self::new(q, value, p),
            2 => Self::new(p, value, t),
            3 => Self::new(p, q, value),
            4 => Self::new(t, p, value),
            _ => Self::new(value, p, q),
        }
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

/// Lighting parameters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingOutput {
    pub hue: f32,
    pub color: Rgb,
    pub intensity: f32,
    pub emission: f32,
    /// `color` scaled by `emission`.
    pub emission_color: Rgb,
}

#[derive(Debug, Clone)]
pub struct ReactiveMapper {
    config: LightingResponseConfig,
    emphasis_multiplier: f32,
}

impl ReactiveMapper {
    /// `emphasis_multiplier` scales the beat flash into the emphasis
    /// accumulator.
    pub fn new(config: LightingResponseConfig, emphasis_multiplier: f32) -> Self {
        Self {
            config,
            emphasis_multiplier,
        }
    }

    pub fn config(&self) -> &LightingResponseConfig {
        &self.config
    }

    /// Adds one beat's worth of flash and emphasis.
    pub fn trigger_flash(&self, state: &mut ReactiveState) {
        state.flash_add += self.config.beat_flash;
        state.beat_emphasis += self.config.beat_flash * self.emphasis_multiplier;
    }

    /// Advances `state` by `dt` seconds using `frame` and returns the lighting
    /// parameters for this tick.
    ///
    /// A beat in `frame` is applied before the outputs are computed, so the
    /// tick that detected it already shows the full flash. Both accumulators
    /// decay after the outputs are taken.
    pub fn apply(&self, state: &mut ReactiveState, frame: &AnalysisFrame, dt: f32) -> LightingOutput {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let config = &self.config;

        if frame.beat_fired {
            self.trigger_flash(state);
        }

        let hue_rate = config.high_to_hue_speed.evaluate(normalize(frame.high));
        state.hue = wrap_hue(state.hue + hue_rate * config.hue_speed * dt);

        let low_response = config.low_to_intensity.evaluate(normalize(frame.low));
        let transient = state.flash_add + state.beat_emphasis;
        let intensity =
            (config.base_intensity + low_response * config.low_gain + transient).max(0.0);
        let emission =
            (config.emission_base + low_response * config.emission_gain + transient).max(0.0);

        let color = Rgb::from_hsv(state.hue, config.saturation, config.value);

        state.flash_add = move_towards_zero(state.flash_add, config.flash_decay * dt);
        state.beat_emphasis = move_towards_zero(state.beat_emphasis, config.beat_emphasis_decay * dt);

        LightingOutput {
            hue: state.hue,
            color,
            intensity,
            emission,
            emission_color: color.scale(emission),
        }
    }
}

/// Wraps onto `[0, 1)`.
pub fn wrap_hue(hue: f32) -> f32 {
    let wrapped = hue.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped.is_nan() || wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

fn move_towards_zero(value: f32, max_step: f32) -> f32 {
    if value <= 0.0 || !value.is_finite() {
        0.0
    } else {
        (value - max_step.max(0.0)).max(0.0)
    }
}
