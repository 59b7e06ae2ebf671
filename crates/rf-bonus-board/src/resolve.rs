//! Symbol resolution: the gameplay effect of every variant
//!
//! One dispatch function over the closed [`Symbol`] enum. Effects read the
//! board as it is at call time, mutate it in place and append what they
//! did to the step's [`EffectLog`].
//!
//! | Variant     | Effect                                                  |
//! |-------------|---------------------------------------------------------|
//! | Coin        | none (its value is summed by the accumulator)           |
//! | Collector   | every active coin x1.5                                  |
//! | Payer(n)    | `Coin(1)` into up to `n` empty cells                    |
//! | ComboCP     | every collector, then every payer                       |
//! | Sniper      | one random coin x1.5                                    |
//! | Necromancer | `Coin(1)` into a random empty cell above the window     |
//! | Unlock      | row unlock check                                        |
//! | ArmsDealer  | random coin -> persistent Collector / Payer / ComboCP   |
//! | Upgrader    | persistent generator into a random empty cell           |
//! | ResetPlus   | respins + 2, capped at the base                         |

use rand::Rng;

use crate::accumulator::WinAccumulator;
use crate::board::{Board, CellPos};
use crate::effects::{CoinSource, Effect, EffectLog, EffectState, MultiplyCause};
use crate::error::BonusResult;
use crate::orchestrator::SpinState;
use crate::symbols::{PAYER_MAX_VALUE, Symbol, SymbolTag, boost_value};
use crate::unlock::{RowUnlockController, UnlockEvent};

/// Respins granted by one Reset Plus
pub const RESET_PLUS_RESPINS: u32 = 2;

/// Everything an effect may touch
pub(crate) struct ResolveCtx<'a, R: Rng + ?Sized> {
    pub board: &'a mut Board,
    pub unlock: &'a mut RowUnlockController,
    pub accumulator: &'a WinAccumulator,
    pub state: &'a mut SpinState,
    pub rng: &'a mut R,
    pub log: &'a mut EffectLog,
}

impl<R: Rng + ?Sized> ResolveCtx<'_, R> {
    fn snapshot(&self) -> EffectState {
        EffectState {
            total: self.accumulator.total(self.board),
            respins: self.state.respins,
            rows: self.board.rows(),
        }
    }

    pub fn emit(&mut self, effect: Effect) {
        let state = self.snapshot();
        self.log.push(effect, state);
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.rng.random_range(0..items.len())])
    }

    /// Run the unlock controller once, logging any growth
    pub fn run_unlock(&mut self) -> Option<UnlockEvent> {
        let event = self.unlock.check_and_unlock(self.board)?;
        self.emit(Effect::RowUnlocked { event });
        Some(event)
    }

    /// Multiply one coin by 1.5
    pub fn boost_coin(&mut self, pos: CellPos, cause: MultiplyCause) -> Option<u64> {
        let from = self.board.symbol_at(pos)?.coin_value()?;
        let to = boost_value(from);
        self.board.set_coin_value(pos, to);
        self.emit(Effect::CoinMultiplied {
            pos,
            from,
            to,
            cause,
        });
        Some(to)
    }
}

/// Fire the symbol at `pos`
///
/// `persistent` marks a re-fire of a persistent symbol rather than the
/// one-shot resolution at spawn. Empty cells resolve to nothing.
pub(crate) fn resolve_symbol<R: Rng + ?Sized>(
    ctx: &mut ResolveCtx<'_, R>,
    pos: CellPos,
    persistent: bool,
) -> BonusResult<()> {
    let Some(symbol) = ctx.board.symbol_at(pos).copied() else {
        return Ok(());
    };
    if symbol.is_coin() {
        return Ok(());
    }

    log::debug!("Resolving {} at {pos} (persistent: {persistent})", symbol.name());
    ctx.emit(Effect::SymbolFired {
        pos,
        symbol,
        persistent,
    });

    match symbol {
        Symbol::Coin { .. } => {}
        Symbol::Collector { .. } => collect(ctx, pos),
        Symbol::Payer { value, .. } => pay(ctx, pos, value)?,
        Symbol::ComboCp { .. } => combo(ctx)?,
        Symbol::Sniper { .. } => snipe(ctx, pos),
        Symbol::Necromancer => necromance(ctx, pos)?,
        Symbol::Unlock => {
            ctx.run_unlock();
        }
        Symbol::ArmsDealer { .. } => arm(ctx, pos)?,
        Symbol::Upgrader => upgrade(ctx, pos)?,
        Symbol::ResetPlus => reset_plus(ctx),
    }
    Ok(())
}

fn collect<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, collector: CellPos) {
    for coin in ctx.board.coins() {
        ctx.boost_coin(coin, MultiplyCause::Collector { collector });
    }
}

fn pay<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, payer: CellPos, count: u32) -> BonusResult<()> {
    let targets: Vec<CellPos> = ctx
        .board
        .empty_cells()
        .into_iter()
        .take(count as usize)
        .collect();

    for pos in targets {
        ctx.board.place(pos, Symbol::coin(1))?;
        ctx.emit(Effect::CoinSpawned {
            pos,
            value: 1,
            source: CoinSource::Payer { payer },
        });
    }
    Ok(())
}

fn combo<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>) -> BonusResult<()> {
    let symbols = ctx.board.symbols();

    for &(pos, symbol) in &symbols {
        if let Symbol::Collector { .. } = symbol {
            collect(ctx, pos);
        }
    }
    for &(pos, symbol) in &symbols {
        if let Symbol::Payer { value, .. } = symbol {
            pay(ctx, pos, value)?;
        }
    }
    Ok(())
}

fn snipe<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, sniper: CellPos) {
    let coins = ctx.board.coins();
    if let Some(target) = ctx.pick(&coins) {
        ctx.boost_coin(target, MultiplyCause::Sniper { sniper });
    }
}

fn necromance<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, necromancer: CellPos) -> BonusResult<()> {
    let hidden = ctx.board.empty_cells_above();
    let Some(pos) = ctx.pick(&hidden) else {
        return Ok(());
    };
    ctx.board.place(pos, Symbol::coin(1))?;
    ctx.emit(Effect::CoinSpawned {
        pos,
        value: 1,
        source: CoinSource::Necromancer { necromancer },
    });
    Ok(())
}

fn arm<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, _dealer: CellPos) -> BonusResult<()> {
    let coins = ctx.board.coins();
    let Some(pos) = ctx.pick(&coins) else {
        return Ok(());
    };
    let Some(tag) = ctx.pick(&SymbolTag::ARMS_DEALER_STOCK) else {
        return Ok(());
    };

    let to = tag.instantiate_persistent(&mut *ctx.rng);
    if let Some(from) = ctx.board.replace(pos, to)? {
        ctx.emit(Effect::SymbolReplaced { pos, from, to });
    }
    Ok(())
}

fn upgrade<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>, upgrader: CellPos) -> BonusResult<()> {
    let eligible: Vec<CellPos> = ctx
        .board
        .coins()
        .into_iter()
        .filter(|&pos| ctx.board.symbol_at(pos).and_then(Symbol::coin_value).unwrap_or(0) > 1)
        .collect();
    let Some(source_coin) = ctx.pick(&eligible) else {
        return Ok(());
    };

    let empty = ctx.board.empty_cells();
    let Some(pos) = ctx.pick(&empty) else {
        return Ok(());
    };
    let Some(tag) = ctx.pick(&SymbolTag::PERSISTABLE) else {
        return Ok(());
    };

    let mut symbol = tag.instantiate_persistent(&mut *ctx.rng);
    if let Symbol::Payer { value, .. } = &mut symbol {
        let coin_value = ctx
            .board
            .symbol_at(source_coin)
            .and_then(Symbol::coin_value)
            .unwrap_or(1);
        *value = coin_value.min(PAYER_MAX_VALUE as u64) as u32;
    }

    ctx.board.place(pos, symbol)?;
    ctx.emit(Effect::PersistentPlanted {
        pos,
        symbol,
        upgrader,
        source_coin,
    });
    Ok(())
}

fn reset_plus<R: Rng + ?Sized>(ctx: &mut ResolveCtx<'_, R>) {
    let from = ctx.state.respins;
    let to = from.saturating_add(RESET_PLUS_RESPINS).min(ctx.state.respin_base);
    ctx.state.respins = to;
    ctx.emit(Effect::RespinsAdded { from, to });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::EffectTiming;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        board: Board,
        unlock: RowUnlockController,
        accumulator: WinAccumulator,
        state: SpinState,
        rng: StdRng,
        log: EffectLog,
    }

    impl Fixture {
        fn new() -> Self {
            let mut state = SpinState::new(3);
            state.respins = 1;
            Self {
                board: Board::new(6, 8, 4).unwrap(),
                unlock: RowUnlockController::new(8),
                accumulator: WinAccumulator::new(15_000),
                state,
                rng: StdRng::seed_from_u64(7),
                log: EffectLog::new(EffectTiming::studio()),
            }
        }

        fn resolve(&mut self, pos: CellPos) {
            let mut ctx = ResolveCtx {
                board: &mut self.board,
                unlock: &mut self.unlock,
                accumulator: &self.accumulator,
                state: &mut self.state,
                rng: &mut self.rng,
                log: &mut self.log,
            };
            resolve_symbol(&mut ctx, pos, false).unwrap();
        }

        fn place(&mut self, col: usize, row: usize, symbol: Symbol) -> CellPos {
            let pos = CellPos::new(col, row);
            self.board.place(pos, symbol).unwrap();
            pos
        }

        fn coin_values(&self) -> Vec<u64> {
            self.board
                .coins()
                .into_iter()
                .filter_map(|p| self.board.symbol_at(p).and_then(Symbol::coin_value))
                .collect()
        }
    }

    #[test]
    fn test_collector_boosts_every_coin() {
        let mut fx = Fixture::new();
        fx.place(0, 2, Symbol::coin(1));
        fx.place(1, 2, Symbol::coin(2));
        fx.place(2, 2, Symbol::coin(4));
        let collector = fx.place(3, 2, Symbol::Collector { persistent: false });
        assert_eq!(fx.accumulator.total(&fx.board), 7);

        fx.resolve(collector);

        assert_eq!(fx.coin_values(), vec![1, 3, 6]);
        assert_eq!(fx.accumulator.total(&fx.board), 10);
        let collected = fx
            .log
            .records()
            .iter()
            .filter(|r| {
                matches!(r.effect, Effect::CoinMultiplied { cause: MultiplyCause::Collector { collector: c }, .. } if c == collector)
            })
            .count();
        assert_eq!(collected, 3);
    }

    #[test]
    fn test_collector_compounds() {
        let mut fx = Fixture::new();
        fx.place(0, 2, Symbol::coin(4));
        let collector = fx.place(1, 2, Symbol::Collector { persistent: true });
        fx.resolve(collector);
        fx.resolve(collector);
        assert_eq!(fx.coin_values(), vec![9]);
    }

    #[test]
    fn test_payer_uses_available_cells() {
        let mut fx = Fixture::new();
        let payer = fx.place(0, 2, Symbol::Payer { value: 3, persistent: false });
        let empty = fx.board.empty_cells();
        let (&free, rest) = empty.split_last().unwrap();
        for &pos in rest {
            fx.board.place(pos, Symbol::Unlock).unwrap();
        }

        fx.resolve(payer);

        assert_eq!(fx.board.symbol_at(free), Some(&Symbol::coin(1)));
        assert_eq!(fx.board.coins().len(), 1);
        assert!(fx.board.empty_cells().is_empty());
    }

    #[test]
    fn test_payer_discovery_order() {
        let mut fx = Fixture::new();
        let payer = fx.place(3, 3, Symbol::Payer { value: 2, persistent: false });
        fx.resolve(payer);
        assert_eq!(fx.board.coins(), vec![CellPos::new(0, 2), CellPos::new(0, 3)]);
    }

    #[test]
    fn test_combo_collects_then_pays() {
        let mut fx = Fixture::new();
        fx.place(0, 2, Symbol::coin(2));
        fx.place(4, 2, Symbol::Collector { persistent: false });
        fx.place(5, 2, Symbol::Payer { value: 1, persistent: false });
        let combo = fx.place(3, 5, Symbol::ComboCp { persistent: false });

        fx.resolve(combo);

        // collector boosted 2 -> 3 before the payer's new coin existed
        assert_eq!(fx.board.symbol_at(CellPos::new(0, 2)), Some(&Symbol::coin(3)));
        assert_eq!(fx.board.symbol_at(CellPos::new(0, 3)), Some(&Symbol::coin(1)));
        assert_eq!(fx.accumulator.total(&fx.board), 4);
    }

    #[test]
    fn test_sniper_hits_one_coin() {
        let mut fx = Fixture::new();
        fx.place(0, 2, Symbol::coin(4));
        fx.place(1, 2, Symbol::coin(4));
        let sniper = fx.place(2, 2, Symbol::Sniper { persistent: false });
        fx.resolve(sniper);
        let mut values = fx.coin_values();
        values.sort();
        assert_eq!(values, vec![4, 6]);
    }

    #[test]
    fn test_sniper_without_coins_is_noop() {
        let mut fx = Fixture::new();
        let sniper = fx.place(2, 2, Symbol::Sniper { persistent: false });
        fx.resolve(sniper);
        assert_eq!(fx.log.len(), 1, "only the fire marker");
    }

    #[test]
    fn test_necromancer_revives_above_window() {
        let mut fx = Fixture::new();
        let necro = fx.place(0, 2, Symbol::Necromancer);
        fx.resolve(necro);

        let above: Vec<CellPos> = (0..6)
            .flat_map(|col| (0..2).map(move |row| CellPos::new(col, row)))
            .filter(|&p| fx.board.symbol_at(p) == Some(&Symbol::coin(1)))
            .collect();
        assert_eq!(above.len(), 1);
        // hidden coins do not count yet
        assert_eq!(fx.accumulator.total(&fx.board), 0);
    }

    #[test]
    fn test_necromancer_noop_when_nothing_hidden() {
        let mut fx = Fixture::new();
        for pos in fx.board.empty_cells_above() {
            fx.board.place(pos, Symbol::coin(1)).unwrap();
        }
        let necro = fx.place(0, 2, Symbol::Necromancer);
        fx.resolve(necro);
        assert_eq!(fx.log.len(), 1);
    }

    #[test]
    fn test_unlock_symbol_forces_check() {
        let mut fx = Fixture::new();
        let unlock = fx.place(0, 2, Symbol::Unlock);
        fx.resolve(unlock);
        assert_eq!(fx.board.rows(), 4, "no full row, no growth");

        for col in 1..6 {
            fx.place(col, 2, Symbol::coin(1));
        }
        fx.board.replace(CellPos::new(0, 3), Symbol::Unlock).unwrap();
        fx.resolve(CellPos::new(0, 3));
        assert_eq!(fx.board.rows(), 5);
        assert!(fx
            .log
            .records()
            .iter()
            .any(|r| matches!(r.effect, Effect::RowUnlocked { .. })));
    }

    #[test]
    fn test_arms_dealer_converts_coin() {
        let mut fx = Fixture::new();
        let coin = fx.place(0, 2, Symbol::coin(5));
        let dealer = fx.place(1, 2, Symbol::ArmsDealer { persistent: false });
        fx.resolve(dealer);

        let converted = fx.board.symbol_at(coin).copied().unwrap();
        assert!(converted.is_persistent());
        assert!(SymbolTag::ARMS_DEALER_STOCK.contains(&converted.tag()));
        assert!(fx.board.coins().is_empty());
    }

    #[test]
    fn test_upgrader_needs_valuable_coin() {
        let mut fx = Fixture::new();
        fx.place(0, 2, Symbol::coin(1));
        let upgrader = fx.place(1, 2, Symbol::Upgrader);
        fx.resolve(upgrader);
        assert!(fx.board.persistent_symbols().is_empty());

        fx.board.replace(CellPos::new(0, 2), Symbol::coin(2)).unwrap();
        fx.resolve(upgrader);
        let planted = fx.board.persistent_symbols();
        assert_eq!(planted.len(), 1);
        if let Some(Symbol::Payer { value, .. }) = fx.board.symbol_at(planted[0]) {
            assert_eq!(*value, 2);
        }
    }

    #[test]
    fn test_reset_plus_capped() {
        let mut fx = Fixture::new();
        let reset = fx.place(0, 2, Symbol::ResetPlus);
        fx.resolve(reset);
        assert_eq!(fx.state.respins, 3, "1 + 2 = 3 == base");

        fx.resolve(reset);
        assert_eq!(fx.state.respins, 3, "never above the base");
    }

    #[test]
    fn test_empty_cell_resolves_to_nothing() {
        let mut fx = Fixture::new();
        fx.resolve(CellPos::new(0, 2));
        assert!(fx.log.is_empty());
    }
}
