//! Symbol definitions
//!
//! Symbols are plain data owned by their cell. Behaviour lives in
//! [`crate::resolve`], dispatched on the variant.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most cells a freshly spawned Payer fills
pub const PAYER_MAX_VALUE: u32 = 3;

/// Coin values a spawn can land with, and their weights
pub const COIN_VALUE_LADDER: [(u64, u32); 5] = [(1, 50), (2, 25), (3, 12), (5, 8), (10, 5)];

/// Symbol type tag, the key of a weight table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolTag {
    Coin,
    Collector,
    Payer,
    ComboCp,
    Sniper,
    Necromancer,
    Unlock,
    ArmsDealer,
    Upgrader,
    ResetPlus,
}

impl SymbolTag {
    pub const ALL: [SymbolTag; 10] = [
        SymbolTag::Coin,
        SymbolTag::Collector,
        SymbolTag::Payer,
        SymbolTag::ComboCp,
        SymbolTag::Sniper,
        SymbolTag::Necromancer,
        SymbolTag::Unlock,
        SymbolTag::ArmsDealer,
        SymbolTag::Upgrader,
        SymbolTag::ResetPlus,
    ];

    /// Types an Arms Dealer can turn a coin into
    pub const ARMS_DEALER_STOCK: [SymbolTag; 3] =
        [SymbolTag::Collector, SymbolTag::Payer, SymbolTag::ComboCp];

    /// Types that carry a persistent flag
    pub const PERSISTABLE: [SymbolTag; 5] = [
        SymbolTag::Collector,
        SymbolTag::Payer,
        SymbolTag::ComboCp,
        SymbolTag::Sniper,
        SymbolTag::ArmsDealer,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Coin => "COIN",
            Self::Collector => "COLLECTOR",
            Self::Payer => "PAYER",
            Self::ComboCp => "COMBO_CP",
            Self::Sniper => "SNIPER",
            Self::Necromancer => "NECROMANCER",
            Self::Unlock => "UNLOCK",
            Self::ArmsDealer => "ARMS_DEALER",
            Self::Upgrader => "UPGRADER",
            Self::ResetPlus => "RESET_PLUS",
        }
    }

    pub fn can_persist(&self) -> bool {
        Self::PERSISTABLE.contains(self)
    }

    /// Create a fresh, non-persistent symbol of this type
    pub fn instantiate<R: Rng + ?Sized>(self, rng: &mut R) -> Symbol {
        self.build(false, rng)
    }

    /// Create a persistent symbol of this type
    ///
    /// Types that cannot persist come back as their one-shot form.
    pub fn instantiate_persistent<R: Rng + ?Sized>(self, rng: &mut R) -> Symbol {
        self.build(true, rng)
    }

    fn build<R: Rng + ?Sized>(self, persistent: bool, rng: &mut R) -> Symbol {
        match self {
            Self::Coin => Symbol::Coin {
                value: roll_coin_value(rng),
            },
            Self::Collector => Symbol::Collector { persistent },
            Self::Payer => Symbol::Payer {
                value: rng.random_range(1..=PAYER_MAX_VALUE),
                persistent,
            },
            Self::ComboCp => Symbol::ComboCp { persistent },
            Self::Sniper => Symbol::Sniper { persistent },
            Self::Necromancer => Symbol::Necromancer,
            Self::Unlock => Symbol::Unlock,
            Self::ArmsDealer => Symbol::ArmsDealer { persistent },
            Self::Upgrader => Symbol::Upgrader,
            Self::ResetPlus => Symbol::ResetPlus,
        }
    }
}

fn roll_coin_value<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    let total: u32 = COIN_VALUE_LADDER.iter().map(|&(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for &(value, weight) in &COIN_VALUE_LADDER {
        if roll < weight {
            return value;
        }
        roll -= weight;
    }
    1
}

/// A symbol on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Symbol {
    /// Pays its value; no effect of its own
    Coin { value: u64 },
    /// Multiplies every coin by 1.5
    Collector { persistent: bool },
    /// Drops up to `value` one-credit coins into empty cells
    Payer { value: u32, persistent: bool },
    /// Fires every collector, then every payer
    ComboCp { persistent: bool },
    /// Multiplies one random coin by 1.5
    Sniper { persistent: bool },
    /// Revives an empty cell above the window with a coin
    Necromancer,
    /// Forces a row unlock check
    Unlock,
    /// Turns a random coin into a persistent collector, payer or combo
    ArmsDealer { persistent: bool },
    /// Plants a persistent generator when a coin is worth more than 1
    Upgrader,
    /// Adds two respins, capped at the round's base
    ResetPlus,
}

impl Symbol {
    pub fn coin(value: u64) -> Self {
        Self::Coin { value }
    }

    pub fn tag(&self) -> SymbolTag {
        match self {
            Self::Coin { .. } => SymbolTag::Coin,
            Self::Collector { .. } => SymbolTag::Collector,
            Self::Payer { .. } => SymbolTag::Payer,
            Self::ComboCp { .. } => SymbolTag::ComboCp,
            Self::Sniper { .. } => SymbolTag::Sniper,
            Self::Necromancer => SymbolTag::Necromancer,
            Self::Unlock => SymbolTag::Unlock,
            Self::ArmsDealer { .. } => SymbolTag::ArmsDealer,
            Self::Upgrader => SymbolTag::Upgrader,
            Self::ResetPlus => SymbolTag::ResetPlus,
        }
    }

    /// Re-fires every step while on the board
    pub fn is_persistent(&self) -> bool {
        match *self {
            Self::Collector { persistent }
            | Self::Payer { persistent, .. }
            | Self::ComboCp { persistent }
            | Self::Sniper { persistent }
            | Self::ArmsDealer { persistent } => persistent,
            _ => false,
        }
    }

    pub fn is_coin(&self) -> bool {
        matches!(self, Self::Coin { .. })
    }

    /// Coin value, `None` for non-coins
    pub fn coin_value(&self) -> Option<u64> {
        match *self {
            Self::Coin { value } => Some(value),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.tag().name()
    }
}

/// Coin value after a 1.5x boost, truncated toward zero
pub fn boost_value(value: u64) -> u64 {
    value.saturating_mul(3) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_boost_truncates() {
        assert_eq!(boost_value(1), 1);
        assert_eq!(boost_value(2), 3);
        assert_eq!(boost_value(4), 6);
        assert_eq!(boost_value(5), 7);
        assert_eq!(boost_value(0), 0);
    }

    #[test]
    fn test_tag_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        for tag in SymbolTag::ALL {
            assert_eq!(tag.instantiate(&mut rng).tag(), tag);
        }
    }

    #[test]
    fn test_instantiate_is_one_shot() {
        let mut rng = StdRng::seed_from_u64(5);
        for tag in SymbolTag::ALL {
            assert!(!tag.instantiate(&mut rng).is_persistent(), "{tag:?}");
        }
    }

    #[test]
    fn test_persistent_only_where_supported() {
        let mut rng = StdRng::seed_from_u64(5);
        for tag in SymbolTag::ALL {
            let symbol = tag.instantiate_persistent(&mut rng);
            assert_eq!(symbol.is_persistent(), tag.can_persist(), "{tag:?}");
        }
    }

    #[test]
    fn test_spawn_values_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            match SymbolTag::Payer.instantiate(&mut rng) {
                Symbol::Payer { value, .. } => assert!((1..=PAYER_MAX_VALUE).contains(&value)),
                other => panic!("unexpected {other:?}"),
            }
            let coin = SymbolTag::Coin.instantiate(&mut rng).coin_value().unwrap();
            assert!(COIN_VALUE_LADDER.iter().any(|&(v, _)| v == coin));
        }
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Symbol::Payer {
            value: 2,
            persistent: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"payer","value":2,"persistent":true}"#);
    }
}
