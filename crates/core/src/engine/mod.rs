//! One-call tick driving analysis, beat notification and reactive mapping.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AnalysisEngine, AnalysisFrame, AppConfig, LightingOutput, ReactiveMapper, ReactiveState,
    Result,
};

/// Notification that a beat was detected at `timestamp` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    pub timestamp: f64,
    pub score: f32,
}

/// Receiver of beat notifications. Called synchronously from
/// [`LightingEngine::advance`], at most once per tick.
pub trait BeatListener {
    fn on_beat(&mut self, event: &BeatEvent);
}

impl<F> BeatListener for F
where
    F: FnMut(&BeatEvent),
{
    fn on_beat(&mut self, event: &BeatEvent) {
        self(event)
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub frame: AnalysisFrame,
    pub lighting: LightingOutput,
}

/// Analysis plus reactive mapping behind a single `advance` call.
pub struct LightingEngine {
    config: AppConfig,
    analysis: AnalysisEngine,
    mapper: ReactiveMapper,
    listeners: Vec<Box<dyn BeatListener>>,
}

impl LightingEngine {
    /// Validates `config` and builds the pipeline.
    pub fn new(config: AppConfig) -> Result<Self> {
        let config = config.validated()?;
        let analysis = AnalysisEngine::new(&config)?;
        let mapper = ReactiveMapper::new(
            config.lighting.clone(),
            config.beat.beat_emphasis_multiplier,
        );

        debug!(strategy = ?config.beat.strategy, "lighting engine created");

        Ok(Self {
            config,
            analysis,
            mapper,
            listeners: Vec::new(),
        })
    }

    /// The validated configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Spectrum length every tick must supply.
    pub fn bins(&self) -> usize {
        self.analysis.bins()
    }

    pub fn mapper(&self) -> &ReactiveMapper {
        &self.mapper
    }

    /// State a fresh session should start from.
    pub fn initial_state(&self) -> ReactiveState {
        ReactiveState::from_config(&self.config.lighting)
    }

    /// Registers a listener for beat notifications.
    pub fn add_listener(&mut self, listener: impl BeatListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Runs one tick: analyses `spectrum`, notifies listeners if a beat fired
    /// and maps the frame onto `state`.
    pub fn advance(
        &mut self,
        spectrum: &[f32],
        dt: f32,
        state: &mut ReactiveState,
    ) -> Result<TickOutput> {
        let frame = self.analysis.process(spectrum, dt)?;

        if frame.beat_fired {
            let event = BeatEvent {
                timestamp: frame.timestamp,
                score: frame.beat_score,
            };
            for listener in &mut self.listeners {
                listener.on_beat(&event);
            }
        }

        let lighting = self.mapper.apply(state, &frame, dt);
        Ok(TickOutput { frame, lighting })
    }

    /// Clears analysis history and timing. Listeners and configuration stay.
    pub fn reset(&mut self) {
        self.analysis.reset();
    }
}

impl fmt::Debug for LightingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightingEngine")
            .field("analysis", &self.analysis)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
