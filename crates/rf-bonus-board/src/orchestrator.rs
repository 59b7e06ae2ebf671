//! Spin orchestrator: bonus round state machine
//!
//! ```text
//! Idle ──start_bonus──▶ Armed ──spin_step──▶ Stepping ──┬──▶ Armed   (respins left)
//!   ▲                                                   └──▶ Ended   (respins out / cap hit)
//!   └──────────────────────── reset_board ◀────────────────────┘
//! ```
//!
//! One step: decrement respins, proactive unlock check, spawn into every
//! empty active cell (one-shot symbols resolve as they land), re-fire
//! persistent symbols, second unlock check, total and cap check.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::accumulator::WinAccumulator;
use crate::board::{Board, CellPos};
use crate::config::BonusConfig;
use crate::effects::{Effect, EffectLog, EffectRecord, MultiplyCause, NullPresenter, Presenter};
use crate::error::{BonusError, BonusResult};
use crate::resolve::{ResolveCtx, resolve_symbol};
use crate::symbols::Symbol;
use crate::timing::{EffectTiming, TimingProfile};
use crate::unlock::RowUnlockController;
use crate::weights::WeightTables;

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Respins ran out
    Normal,
    /// Board total reached the win cap
    MaxWin,
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    Idle,
    Armed,
    /// A step is running. `spin_step` holds `&mut self` throughout, so
    /// direct callers never see this; [`BonusSession::phase`] reports it
    /// while its in-flight flag is set.
    ///
    /// [`BonusSession::phase`]: crate::session::BonusSession::phase
    Stepping,
    Ended(EndReason),
}

impl RoundPhase {
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

/// Counters mutated only by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinState {
    pub respins: u32,
    pub respin_base: u32,
    pub playing: bool,
    pub autoplay: bool,
    pub turbo: bool,
}

impl SpinState {
    pub fn new(respin_base: u32) -> Self {
        Self {
            respins: 0,
            respin_base,
            playing: false,
            autoplay: false,
            turbo: false,
        }
    }
}

/// Final result of a bonus round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub reason: EndReason,
    /// Capped board total
    pub total: u64,
    /// `total × base_bet`
    pub win_amount: f64,
    pub big_win: bool,
    pub steps: u32,
    pub rows: usize,
    pub full_rows_awarded: usize,
}

impl RoundReport {
    pub fn is_max_win(&self) -> bool {
        self.reason == EndReason::MaxWin
    }
}

/// Result of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based step index within the round
    pub step: u32,
    pub respins: u32,
    pub rows: usize,
    pub full_rows_awarded: usize,
    pub total: u64,
    pub win_amount: f64,
    pub big_win: bool,
    /// Symbols drawn from the weight table this step
    pub spawned: usize,
    /// Ordered effects for presentation
    pub effects: Vec<EffectRecord>,
    /// Presentation time the effects need
    pub duration_ms: f64,
    /// Set when this step ended the round
    pub outcome: Option<RoundReport>,
}

impl StepReport {
    pub fn is_round_over(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Serializable view of the round for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub state: SpinState,
    pub rows: usize,
    pub top: usize,
    pub full_rows_awarded: usize,
    pub total: u64,
    /// Active window, top row first
    pub grid: Vec<Vec<Option<Symbol>>>,
}

/// Aggregate over many rounds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds: u64,
    pub total_win: f64,
    pub max_win_hits: u64,
    pub big_wins: u64,
    pub total_steps: u64,
    pub total_rows: u64,
    pub best_total: u64,
}

impl SessionStats {
    pub fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        self.total_win += report.win_amount;
        self.total_steps += report.steps as u64;
        self.total_rows += report.rows as u64;
        self.best_total = self.best_total.max(report.total);
        if report.big_win {
            self.big_wins += 1;
        }
        if report.is_max_win() {
            self.max_win_hits += 1;
        }
    }

    pub fn average_win(&self) -> f64 {
        if self.rounds > 0 {
            self.total_win / self.rounds as f64
        } else {
            0.0
        }
    }

    pub fn average_rows(&self) -> f64 {
        if self.rounds > 0 {
            self.total_rows as f64 / self.rounds as f64
        } else {
            0.0
        }
    }

    /// Max-win rate in percent
    pub fn max_win_rate(&self) -> f64 {
        if self.rounds > 0 {
            self.max_win_hits as f64 / self.rounds as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Bonus round driver
pub struct SpinOrchestrator {
    config: BonusConfig,
    tables: WeightTables,
    board: Board,
    unlock: RowUnlockController,
    accumulator: WinAccumulator,
    state: SpinState,
    phase: RoundPhase,
    rng: StdRng,
    steps: u32,
    last_report: Option<RoundReport>,
}

impl SpinOrchestrator {
    /// Create with the default config and built-in weight tables
    pub fn new() -> BonusResult<Self> {
        Self::with_config(BonusConfig::default())
    }

    /// Create with a specific config
    pub fn with_config(config: BonusConfig) -> BonusResult<Self> {
        Self::with_tables(config, WeightTables::default())
    }

    /// Create with explicit weight tables (simulation and testing)
    pub fn with_tables(config: BonusConfig, tables: WeightTables) -> BonusResult<Self> {
        config.validate()?;
        tables.validate(config.step_phase)?;

        Ok(Self {
            board: Board::new(config.cols, config.max_rows, config.default_rows)?,
            unlock: RowUnlockController::new(config.max_rows),
            accumulator: WinAccumulator::new(config.max_win_cap),
            state: SpinState::new(config.respin_base),
            phase: RoundPhase::Idle,
            rng: StdRng::from_os_rng(),
            steps: 0,
            last_report: None,
            config,
            tables,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Seed RNG for reproducible rounds
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn config(&self) -> &BonusConfig {
        &self.config
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Steps played in the current round
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn last_report(&self) -> Option<&RoundReport> {
        self.last_report.as_ref()
    }

    /// Capped board total
    pub fn total(&self) -> u64 {
        self.accumulator.total(&self.board)
    }

    pub fn set_turbo(&mut self, turbo: bool) {
        self.state.turbo = turbo;
    }

    pub(crate) fn set_autoplay(&mut self, autoplay: bool) {
        self.state.autoplay = autoplay;
    }

    /// Effect timing in force (turbo overrides the configured profile)
    pub fn timing(&self) -> EffectTiming {
        if self.state.turbo {
            EffectTiming::turbo()
        } else {
            EffectTiming::from_profile(self.config.timing)
        }
    }

    pub fn is_turbo(&self) -> bool {
        self.state.turbo || self.config.timing == TimingProfile::Turbo
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase,
            state: self.state.clone(),
            rows: self.board.rows(),
            top: self.board.top(),
            full_rows_awarded: self.board.full_rows_awarded(),
            total: self.total(),
            grid: self.board.grid(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ROUND LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════

    /// Clear the board and arm a new round
    pub fn start_bonus(&mut self) -> BonusResult<()> {
        if self.phase == RoundPhase::Stepping {
            return Err(BonusError::StepInProgress);
        }
        self.clear_round(&mut NullPresenter);

        self.state.respins = self.state.respin_base;
        self.state.playing = true;
        self.phase = RoundPhase::Armed;

        log::info!(
            "Bonus round armed: {} respins, {}x{} board",
            self.state.respins,
            self.board.cols(),
            self.board.rows()
        );
        Ok(())
    }

    /// Advance the round by one step
    pub fn spin_step(&mut self) -> BonusResult<StepReport> {
        self.spin_step_with(&mut NullPresenter)
    }

    /// Advance one step, feeding every effect to `presenter`
    pub fn spin_step_with(&mut self, presenter: &mut dyn Presenter) -> BonusResult<StepReport> {
        match self.phase {
            RoundPhase::Idle => return Err(BonusError::NotArmed),
            RoundPhase::Ended(_) => return Err(BonusError::RoundEnded),
            RoundPhase::Stepping => return Err(BonusError::StepInProgress),
            RoundPhase::Armed => {}
        }

        self.phase = RoundPhase::Stepping;
        let report = match self.run_step() {
            Ok(report) => report,
            Err(e) => {
                self.phase = RoundPhase::Armed;
                return Err(e);
            }
        };

        if let Some(outcome) = &report.outcome {
            self.phase = RoundPhase::Ended(outcome.reason);
            self.state.playing = false;
            self.last_report = Some(outcome.clone());
            log::info!(
                "Bonus round ended ({:?}) after {} steps: total {} ({:.2})",
                outcome.reason,
                outcome.steps,
                outcome.total,
                outcome.win_amount
            );
        } else {
            self.phase = RoundPhase::Armed;
        }

        for record in &report.effects {
            presenter.on_effect(record);
        }
        Ok(report)
    }

    fn run_step(&mut self) -> BonusResult<StepReport> {
        self.steps += 1;
        self.state.respins = self.state.respins.saturating_sub(1);

        let phase = self.config.step_phase;
        let mut log = EffectLog::new(self.timing());
        let mut ctx = ResolveCtx {
            board: &mut self.board,
            unlock: &mut self.unlock,
            accumulator: &self.accumulator,
            state: &mut self.state,
            rng: &mut self.rng,
            log: &mut log,
        };

        // Unlock symbols resolved last step may have completed a row
        ctx.run_unlock();

        let mut spawned = 0;
        for pos in ctx.board.empty_cells() {
            // an earlier payer may have filled it
            if !ctx.board.is_empty_at(pos) {
                continue;
            }
            let tag = self.tables.pick(phase, &mut *ctx.rng)?;
            let symbol = tag.instantiate(&mut *ctx.rng);
            ctx.board.place(pos, symbol)?;
            ctx.emit(Effect::SymbolSpawned { pos, symbol });
            spawned += 1;

            if !symbol.is_persistent() {
                resolve_symbol(&mut ctx, pos, false)?;
            }
        }

        for pos in ctx.board.persistent_symbols() {
            resolve_symbol(&mut ctx, pos, true)?;
        }

        ctx.run_unlock();

        let total = self.accumulator.total(&self.board);
        let outcome = if total >= self.config.max_win_cap {
            Some(EndReason::MaxWin)
        } else if self.state.respins == 0 {
            Some(EndReason::Normal)
        } else {
            None
        };

        log::debug!(
            "Step {}: spawned {spawned}, total {total}, respins {}, rows {}",
            self.steps,
            self.state.respins,
            self.board.rows()
        );

        let win_amount = self.config.win_amount(total);
        let big_win = total >= self.config.big_win_threshold;
        let duration_ms = log.duration_ms();

        Ok(StepReport {
            step: self.steps,
            respins: self.state.respins,
            rows: self.board.rows(),
            full_rows_awarded: self.board.full_rows_awarded(),
            total,
            win_amount,
            big_win,
            spawned,
            effects: log.into_records(),
            duration_ms,
            outcome: outcome.map(|reason| RoundReport {
                reason,
                total,
                win_amount,
                big_win,
                steps: self.steps,
                rows: self.board.rows(),
                full_rows_awarded: self.board.full_rows_awarded(),
            }),
        })
    }

    /// Player click: multiply the clicked coin by 1.5
    ///
    /// Clicking anything but an active coin does nothing.
    pub fn click_cell(&mut self, col: usize, row: usize) -> BonusResult<Option<EffectRecord>> {
        let pos = CellPos::new(col, row);
        self.board.cell(pos)?;
        match self.phase {
            RoundPhase::Idle => return Err(BonusError::NotArmed),
            RoundPhase::Ended(_) => return Err(BonusError::RoundEnded),
            RoundPhase::Stepping => return Err(BonusError::StepInProgress),
            RoundPhase::Armed => {}
        }
        if !self.board.in_window(pos) {
            return Ok(None);
        }

        let mut log = EffectLog::new(self.timing());
        let mut ctx = ResolveCtx {
            board: &mut self.board,
            unlock: &mut self.unlock,
            accumulator: &self.accumulator,
            state: &mut self.state,
            rng: &mut self.rng,
            log: &mut log,
        };
        ctx.boost_coin(pos, MultiplyCause::Click);
        Ok(log.into_records().into_iter().next())
    }

    /// Clear every cell and return to Idle
    pub fn reset_board(&mut self) -> BonusResult<()> {
        self.reset_board_with(&mut NullPresenter)
    }

    /// Reset, giving `presenter` a teardown call per removed symbol.
    /// Teardown failures are logged and skipped.
    pub fn reset_board_with(&mut self, presenter: &mut dyn Presenter) -> BonusResult<()> {
        if self.phase == RoundPhase::Stepping {
            return Err(BonusError::StepInProgress);
        }
        self.clear_round(presenter);
        self.phase = RoundPhase::Idle;
        log::debug!("Board reset");
        Ok(())
    }

    fn clear_round(&mut self, presenter: &mut dyn Presenter) {
        for (pos, symbol) in self.board.clear() {
            if let Err(e) = presenter.teardown(pos, &symbol) {
                log::warn!("Teardown of {} at {pos} failed: {e}", symbol.name());
            }
        }
        self.unlock.reset();
        self.state.respins = 0;
        self.state.playing = false;
        self.steps = 0;
        self.last_report = None;
    }

    /// Start a round and step it to the end
    pub fn play_round(&mut self) -> BonusResult<RoundReport> {
        self.start_bonus()?;
        loop {
            let report = self.spin_step()?;
            if let Some(outcome) = report.outcome {
                return Ok(outcome);
            }
        }
    }
}
