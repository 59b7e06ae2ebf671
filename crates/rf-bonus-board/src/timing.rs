//! Timing profiles for effect presentation
//!
//! Gameplay never waits on these values. They only stamp each
//! [`EffectRecord`](crate::EffectRecord) so a presentation layer can pace
//! animations, and they supply the delay between autoplay steps.

use serde::{Deserialize, Serialize};

use crate::effects::Effect;

/// Timing profile for effect playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (instant for testing)
    Studio,
}

/// Per-effect durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectTiming {
    /// Profile type
    pub profile: TimingProfile,

    /// Symbol landing in a cell
    pub spawn_ms: f64,

    /// Symbol effect highlight before its consequences play
    pub fire_ms: f64,

    /// Coin value multiplication (collect, snipe, click)
    pub multiply_ms: f64,

    /// New coin dropping into an empty cell
    pub coin_spawn_ms: f64,

    /// In-place symbol swap or persistent symbol plant
    pub replace_ms: f64,

    /// Row unlock / window growth
    pub unlock_ms: f64,

    /// Respin counter bump
    pub respin_ms: f64,

    /// Delay between autoplay steps
    pub autoplay_pacing_ms: f64,

    /// Minimum time between events
    pub min_event_interval_ms: f64,
}

impl EffectTiming {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            spawn_ms: 120.0,
            fire_ms: 250.0,
            multiply_ms: 300.0,
            coin_spawn_ms: 200.0,
            replace_ms: 400.0,
            unlock_ms: 800.0,
            respin_ms: 350.0,
            autoplay_pacing_ms: 900.0,
            min_event_interval_ms: 20.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            spawn_ms: 40.0,
            fire_ms: 80.0,
            multiply_ms: 100.0,
            coin_spawn_ms: 60.0,
            replace_ms: 150.0,
            unlock_ms: 300.0,
            respin_ms: 120.0,
            autoplay_pacing_ms: 250.0,
            min_event_interval_ms: 10.0,
        }
    }

    /// Studio mode: every event lands on the same instant
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            spawn_ms: 0.0,
            fire_ms: 0.0,
            multiply_ms: 0.0,
            coin_spawn_ms: 0.0,
            replace_ms: 0.0,
            unlock_ms: 0.0,
            respin_ms: 0.0,
            autoplay_pacing_ms: 0.0,
            min_event_interval_ms: 0.0,
        }
    }

    /// Get timing for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
        }
    }

    /// Duration allotted to one effect
    pub fn duration_of(&self, effect: &Effect) -> f64 {
        match effect {
            Effect::SymbolSpawned { .. } => self.spawn_ms,
            Effect::SymbolFired { .. } => self.fire_ms,
            Effect::CoinMultiplied { .. } => self.multiply_ms,
            Effect::CoinSpawned { .. } => self.coin_spawn_ms,
            Effect::SymbolReplaced { .. } | Effect::PersistentPlanted { .. } => self.replace_ms,
            Effect::RowUnlocked { .. } => self.unlock_ms,
            Effect::RespinsAdded { .. } => self.respin_ms,
        }
    }
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self::normal()
    }
}

/// Timestamp generator for sequential events
#[derive(Debug, Clone)]
pub struct TimestampGenerator {
    current_ms: f64,
    config: EffectTiming,
}

impl TimestampGenerator {
    /// Create new generator
    pub fn new(config: EffectTiming) -> Self {
        Self {
            current_ms: 0.0,
            config,
        }
    }

    /// Get current timestamp
    pub fn current(&self) -> f64 {
        self.current_ms
    }

    /// Advance by duration and return new timestamp
    pub fn advance(&mut self, duration_ms: f64) -> f64 {
        self.current_ms += duration_ms.max(self.config.min_event_interval_ms);
        self.current_ms
    }

    /// Advance past one effect
    pub fn effect(&mut self, effect: &Effect) -> f64 {
        let duration = self.config.duration_of(effect);
        self.advance(duration)
    }
}
