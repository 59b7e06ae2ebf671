//! Effect queue: ordered record of everything a step did
//!
//! Resolution never sleeps or animates. Each mutation is appended here
//! with the state it produced and a presentation timestamp; a
//! [`Presenter`] replays the list at its own pace.

use serde::{Deserialize, Serialize};

use crate::board::CellPos;
use crate::error::BonusResult;
use crate::symbols::Symbol;
use crate::timing::{EffectTiming, TimestampGenerator};
use crate::unlock::UnlockEvent;

/// Why a coin's value grew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiplyCause {
    /// Collected into this cell
    Collector { collector: CellPos },
    Sniper { sniper: CellPos },
    /// Player click
    Click,
}

/// Who dropped a new coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoinSource {
    Payer { payer: CellPos },
    Necromancer { necromancer: CellPos },
}

/// One engine effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// A sampled symbol landed in an empty cell
    SymbolSpawned { pos: CellPos, symbol: Symbol },
    /// A symbol's effect started (one-shot at spawn, or persistent re-fire)
    SymbolFired {
        pos: CellPos,
        symbol: Symbol,
        persistent: bool,
    },
    CoinMultiplied {
        pos: CellPos,
        from: u64,
        to: u64,
        cause: MultiplyCause,
    },
    CoinSpawned {
        pos: CellPos,
        value: u64,
        source: CoinSource,
    },
    /// Arms Dealer swapped a coin for a persistent symbol
    SymbolReplaced {
        pos: CellPos,
        from: Symbol,
        to: Symbol,
    },
    /// Upgrader dropped a persistent symbol into an empty cell
    PersistentPlanted {
        pos: CellPos,
        symbol: Symbol,
        upgrader: CellPos,
        source_coin: CellPos,
    },
    RowUnlocked { event: UnlockEvent },
    RespinsAdded { from: u32, to: u32 },
}

/// Engine state right after an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectState {
    /// Capped board total
    pub total: u64,
    pub respins: u32,
    pub rows: usize,
}

/// A sequenced, timestamped effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub seq: u32,
    pub timestamp_ms: f64,
    pub effect: Effect,
    pub state: EffectState,
}

/// Append-only effect list for one step
#[derive(Debug, Clone)]
pub struct EffectLog {
    records: Vec<EffectRecord>,
    timestamps: TimestampGenerator,
}

impl EffectLog {
    pub fn new(timing: EffectTiming) -> Self {
        Self {
            records: Vec::new(),
            timestamps: TimestampGenerator::new(timing),
        }
    }

    pub fn push(&mut self, effect: Effect, state: EffectState) {
        let timestamp_ms = self.timestamps.effect(&effect);
        self.records.push(EffectRecord {
            seq: self.records.len() as u32,
            timestamp_ms,
            effect,
            state,
        });
    }

    pub fn records(&self) -> &[EffectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Presentation time the whole list needs
    pub fn duration_ms(&self) -> f64 {
        self.timestamps.current()
    }

    pub fn into_records(self) -> Vec<EffectRecord> {
        self.records
    }
}

/// Presentation layer hook
///
/// Every method has a no-op default so hosts implement only what they
/// render.
pub trait Presenter {
    /// Called for each effect of a step, in order
    fn on_effect(&mut self, _record: &EffectRecord) {}

    /// Called for each symbol removed by a board reset
    fn teardown(&mut self, _pos: CellPos, _symbol: &Symbol) -> BonusResult<()> {
        Ok(())
    }
}

/// Presenter that renders nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
