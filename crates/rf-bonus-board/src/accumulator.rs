//! Win accumulator: capped sum of coin values on the active board

use crate::board::Board;

/// Sums coin values, clamped to a cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinAccumulator {
    cap: u64,
}

impl WinAccumulator {
    pub fn new(cap: u64) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Uncapped sum of every active coin
    pub fn raw_total(&self, board: &Board) -> u64 {
        board
            .coins()
            .into_iter()
            .filter_map(|pos| board.symbol_at(pos).and_then(|s| s.coin_value()))
            .fold(0u64, u64::saturating_add)
    }

    /// Board total clamped to the cap
    pub fn total(&self, board: &Board) -> u64 {
        self.raw_total(board).min(self.cap)
    }

    pub fn is_capped(&self, board: &Board) -> bool {
        self.raw_total(board) >= self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CellPos;
    use crate::symbols::Symbol;

    #[test]
    fn test_sums_active_coins_only() {
        let mut board = Board::new(6, 8, 4).unwrap();
        board.place(CellPos::new(0, 2), Symbol::coin(1)).unwrap();
        board.place(CellPos::new(1, 3), Symbol::coin(2)).unwrap();
        board.place(CellPos::new(2, 4), Symbol::coin(4)).unwrap();
        board.place(CellPos::new(3, 4), Symbol::Collector { persistent: true }).unwrap();
        // hidden row above the window
        board.place(CellPos::new(0, 0), Symbol::coin(100)).unwrap();

        let acc = WinAccumulator::new(15_000);
        assert_eq!(acc.total(&board), 7);
        assert!(!acc.is_capped(&board));
    }

    #[test]
    fn test_total_is_capped() {
        let mut board = Board::new(6, 8, 4).unwrap();
        board.place(CellPos::new(0, 2), Symbol::coin(9_000)).unwrap();
        board.place(CellPos::new(0, 3), Symbol::coin(9_000)).unwrap();

        let acc = WinAccumulator::new(15_000);
        assert_eq!(acc.raw_total(&board), 18_000);
        assert_eq!(acc.total(&board), 15_000);
        assert!(acc.is_capped(&board));
    }

    #[test]
    fn test_saturating_sum() {
        let mut board = Board::new(6, 8, 4).unwrap();
        board.place(CellPos::new(0, 2), Symbol::coin(u64::MAX)).unwrap();
        board.place(CellPos::new(0, 3), Symbol::coin(5)).unwrap();
        let acc = WinAccumulator::new(15_000);
        assert_eq!(acc.raw_total(&board), u64::MAX);
        assert_eq!(acc.total(&board), 15_000);
    }
}
