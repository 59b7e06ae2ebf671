//! Weight tables: phase-indexed spawn probabilities

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BonusError, BonusResult};
use crate::symbols::SymbolTag;

/// Named weight phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Opening phase, coin-heavy
    Base,
    /// Bonus respin phase, richer in special symbols
    Deep,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Base, Phase::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = BonusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "deep" => Ok(Self::Deep),
            other => Err(BonusError::UnknownPhase(other.to_string())),
        }
    }
}

/// Weights for one phase, walked in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTable {
    entries: Vec<(SymbolTag, u32)>,
}

impl WeightTable {
    /// Create from (tag, weight) pairs
    pub fn new(entries: Vec<(SymbolTag, u32)>) -> Self {
        Self { entries }
    }

    /// Built-in base phase weights
    pub fn base() -> Self {
        Self::new(vec![
            (SymbolTag::Coin, 70),
            (SymbolTag::Collector, 6),
            (SymbolTag::Payer, 6),
            (SymbolTag::ComboCp, 2),
            (SymbolTag::Sniper, 5),
            (SymbolTag::Necromancer, 2),
            (SymbolTag::Unlock, 3),
            (SymbolTag::ArmsDealer, 2),
            (SymbolTag::Upgrader, 2),
            (SymbolTag::ResetPlus, 2),
        ])
    }

    /// Built-in deep phase weights
    pub fn deep() -> Self {
        Self::new(vec![
            (SymbolTag::Coin, 55),
            (SymbolTag::Collector, 9),
            (SymbolTag::Payer, 8),
            (SymbolTag::ComboCp, 4),
            (SymbolTag::Sniper, 7),
            (SymbolTag::Necromancer, 3),
            (SymbolTag::Unlock, 5),
            (SymbolTag::ArmsDealer, 3),
            (SymbolTag::Upgrader, 3),
            (SymbolTag::ResetPlus, 3),
        ])
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|&(_, w)| w as u64).sum()
    }

    /// Weight of a single tag (0 if absent)
    pub fn weight_of(&self, tag: SymbolTag) -> u32 {
        self.entries
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|&(_, w)| w)
            .sum()
    }

    /// Draw a tag proportionally to its weight
    pub fn sample<R: Rng + ?Sized>(&self, phase: Phase, rng: &mut R) -> BonusResult<SymbolTag> {
        let total = self.total_weight();
        if total == 0 {
            return Err(BonusError::InvalidWeightTable {
                phase: phase.to_string(),
            });
        }

        let mut roll = rng.random_range(0..total);
        for &(tag, weight) in &self.entries {
            let weight = weight as u64;
            if roll < weight {
                log::trace!("{phase}: drew {tag:?}");
                return Ok(tag);
            }
            roll -= weight;
        }

        // roll < total guarantees a hit above
        Err(BonusError::InvalidWeightTable {
            phase: phase.to_string(),
        })
    }
}

/// Both phase tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTables {
    pub base: WeightTable,
    pub deep: WeightTable,
}

impl WeightTables {
    /// Get the table for a phase
    pub fn table(&self, phase: Phase) -> &WeightTable {
        match phase {
            Phase::Base => &self.base,
            Phase::Deep => &self.deep,
        }
    }

    /// Reject a phase whose weights sum to zero
    pub fn validate(&self, phase: Phase) -> BonusResult<()> {
        if self.table(phase).total_weight() == 0 {
            return Err(BonusError::InvalidWeightTable {
                phase: phase.to_string(),
            });
        }
        Ok(())
    }

    /// Pick a symbol tag for a phase
    pub fn pick<R: Rng + ?Sized>(&self, phase: Phase, rng: &mut R) -> BonusResult<SymbolTag> {
        self.table(phase).sample(phase, rng)
    }
}

impl Default for WeightTables {
    fn default() -> Self {
        Self {
            base: WeightTable::base(),
            deep: WeightTable::deep(),
        }
    }
}
