//! Bonus board configuration

use serde::{Deserialize, Serialize};

use crate::error::{BonusError, BonusResult};
use crate::timing::TimingProfile;
use crate::weights::Phase;

/// Board columns
pub const COLS: usize = 6;
/// Row capacity of the grid
pub const MAX_ROWS: usize = 8;
/// Visible rows at round start
pub const DEFAULT_ROWS: usize = 4;
/// Bet the coin values are denominated in
pub const BASE_BET: f64 = 1.00;
/// Total at which a round counts as a big win
pub const BIG_WIN_THRESHOLD: u64 = 100;
/// Hard cap on the round total
pub const MAX_WIN_CAP: u64 = 15_000;
/// Respins granted at round start
pub const RESPIN_BASE: u32 = 3;

/// Complete bonus round configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Board columns
    pub cols: usize,
    /// Row capacity
    pub max_rows: usize,
    /// Visible rows after start/reset
    pub default_rows: usize,
    /// Bet amount coin values are multiplied by for reporting
    pub base_bet: f64,
    /// Informational big win threshold (board total)
    pub big_win_threshold: u64,
    /// Terminal win cap (board total)
    pub max_win_cap: u64,
    /// Respins granted by `start_bonus`
    pub respin_base: u32,
    /// Weight phase sampled by spin steps
    pub step_phase: Phase,
    /// Effect timing profile
    pub timing: TimingProfile,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            cols: COLS,
            max_rows: MAX_ROWS,
            default_rows: DEFAULT_ROWS,
            base_bet: BASE_BET,
            big_win_threshold: BIG_WIN_THRESHOLD,
            max_win_cap: MAX_WIN_CAP,
            respin_base: RESPIN_BASE,
            step_phase: Phase::Deep,
            timing: TimingProfile::Normal,
        }
    }
}

impl BonusConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> BonusResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> BonusResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder: set timing profile
    pub fn with_timing(mut self, timing: TimingProfile) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set respin base
    pub fn with_respin_base(mut self, respins: u32) -> Self {
        self.respin_base = respins;
        self
    }

    /// Check structural consistency
    pub fn validate(&self) -> BonusResult<()> {
        if self.cols == 0 {
            return Err(BonusError::InvalidConfig("cols must be > 0".into()));
        }
        if self.default_rows == 0 || self.default_rows > self.max_rows {
            return Err(BonusError::InvalidConfig(format!(
                "default_rows {} must be within 1..={}",
                self.default_rows, self.max_rows
            )));
        }
        if self.respin_base == 0 {
            return Err(BonusError::InvalidConfig("respin_base must be > 0".into()));
        }
        if self.max_win_cap == 0 {
            return Err(BonusError::InvalidConfig("max_win_cap must be > 0".into()));
        }
        if self.big_win_threshold > self.max_win_cap {
            return Err(BonusError::InvalidConfig(format!(
                "big_win_threshold {} exceeds max_win_cap {}",
                self.big_win_threshold, self.max_win_cap
            )));
        }
        if !self.base_bet.is_finite() || self.base_bet <= 0.0 {
            return Err(BonusError::InvalidConfig("base_bet must be positive".into()));
        }
        Ok(())
    }

    /// Currency value of a board total
    pub fn win_amount(&self, total: u64) -> f64 {
        total as f64 * self.base_bet
    }
}
