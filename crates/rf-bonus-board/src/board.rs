//! Board: fixed-capacity cell arena with a growable active window
//!
//! Cells are stored row-major in one flat vector sized `cols × max_rows`
//! and addressed by [`CellPos`] (column, absolute row). Only rows inside
//! the active window `[top, bottom]` take part in spawning, resolution and
//! unlock checks.
//!
//! ```text
//!   row 0  . . . . . .   hidden above (Necromancer revives here)
//!   row 1  . . . . . .
//!   row 2  # # # # # #   <- top
//!   row 3  # # # # # #
//!   row 4  # # # # # #
//!   row 5  # # # # # #   <- bottom
//!   row 6  . . . . . .   capacity below
//!   row 7  . . . . . .
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BonusError, BonusResult};
use crate::symbols::Symbol;

/// Cell address: column and absolute row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub col: usize,
    pub row: usize,
}

impl CellPos {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// One grid slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pos: CellPos,
    symbol: Option<Symbol>,
}

impl Cell {
    fn new(pos: CellPos) -> Self {
        Self { pos, symbol: None }
    }

    pub fn pos(&self) -> CellPos {
        self.pos
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
    }
}

/// Growth direction of the active window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowDirection {
    Up,
    Down,
}

/// The bonus board
///
/// The window starts centred, so `top` is not tied to the award count.
/// Upward growth only moves `top`; every downward reveal bumps
/// `full_rows_awarded`, which keeps
/// `bottom == initial_bottom + full_rows_awarded` for the whole round.
#[derive(Debug, Clone)]
pub struct Board {
    cols: usize,
    max_rows: usize,
    default_rows: usize,
    top: usize,
    rows: usize,
    full_rows_awarded: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Allocate every cell once; the window starts centred in the capacity
    pub fn new(cols: usize, max_rows: usize, default_rows: usize) -> BonusResult<Self> {
        if cols == 0 || default_rows == 0 || default_rows > max_rows {
            return Err(BonusError::InvalidConfig(format!(
                "board {cols}x{default_rows} does not fit capacity {max_rows}"
            )));
        }

        let cells = (0..max_rows)
            .flat_map(|row| (0..cols).map(move |col| Cell::new(CellPos::new(col, row))))
            .collect();

        Ok(Self {
            cols,
            max_rows,
            default_rows,
            top: Self::initial_top(max_rows, default_rows),
            rows: default_rows,
            full_rows_awarded: 0,
            cells,
        })
    }

    fn initial_top(max_rows: usize, rows: usize) -> usize {
        (max_rows - rows) / 2
    }

    // ═══════════════════════════════════════════════════════════════════════
    // GEOMETRY
    // ═══════════════════════════════════════════════════════════════════════

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Visible row count
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// First active absolute row
    pub fn top(&self) -> usize {
        self.top
    }

    /// Last active absolute row
    pub fn bottom(&self) -> usize {
        self.top + self.rows - 1
    }

    /// Rows revealed below the starting window
    pub fn full_rows_awarded(&self) -> usize {
        self.full_rows_awarded
    }

    pub fn is_at_capacity(&self) -> bool {
        self.rows >= self.max_rows
    }

    pub fn in_window(&self, pos: CellPos) -> bool {
        pos.col < self.cols && pos.row >= self.top && pos.row <= self.bottom()
    }

    /// Active positions, column-major
    pub fn active_positions(&self) -> impl Iterator<Item = CellPos> + '_ {
        let (top, bottom) = (self.top, self.bottom());
        (0..self.cols).flat_map(move |col| (top..=bottom).map(move |row| CellPos::new(col, row)))
    }

    fn index(&self, pos: CellPos) -> BonusResult<usize> {
        if pos.col >= self.cols || pos.row >= self.max_rows {
            return Err(BonusError::CellOutOfBounds {
                col: pos.col,
                row: pos.row,
            });
        }
        Ok(pos.row * self.cols + pos.col)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CELL ACCESS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn cell(&self, pos: CellPos) -> BonusResult<&Cell> {
        let idx = self.index(pos)?;
        Ok(&self.cells[idx])
    }

    /// Symbol at a position, `None` when empty or out of bounds
    pub fn symbol_at(&self, pos: CellPos) -> Option<&Symbol> {
        self.index(pos).ok().and_then(|idx| self.cells[idx].symbol.as_ref())
    }

    pub fn is_empty_at(&self, pos: CellPos) -> bool {
        self.symbol_at(pos).is_none()
    }

    /// Bind a symbol to an empty cell
    pub fn place(&mut self, pos: CellPos, symbol: Symbol) -> BonusResult<()> {
        let idx = self.index(pos)?;
        let cell = &mut self.cells[idx];
        if cell.symbol.is_some() {
            return Err(BonusError::CellOccupied {
                col: pos.col,
                row: pos.row,
            });
        }
        cell.symbol = Some(symbol);
        Ok(())
    }

    /// Swap the symbol in a cell, returning the previous one
    pub fn replace(&mut self, pos: CellPos, symbol: Symbol) -> BonusResult<Option<Symbol>> {
        let idx = self.index(pos)?;
        Ok(self.cells[idx].symbol.replace(symbol))
    }

    /// Set the value of the coin at `pos`; returns the old value
    pub(crate) fn set_coin_value(&mut self, pos: CellPos, value: u64) -> Option<u64> {
        let idx = self.index(pos).ok()?;
        match self.cells[idx].symbol.as_mut() {
            Some(Symbol::Coin { value: v }) => Some(std::mem::replace(v, value)),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    /// Empty active cells in column-major order
    pub fn empty_cells(&self) -> Vec<CellPos> {
        self.active_positions()
            .filter(|&pos| self.is_empty_at(pos))
            .collect()
    }

    /// Every symbol in the active window, column-major
    pub fn symbols(&self) -> Vec<(CellPos, Symbol)> {
        self.active_positions()
            .filter_map(|pos| self.symbol_at(pos).map(|s| (pos, *s)))
            .collect()
    }

    /// Active coin positions, column-major
    pub fn coins(&self) -> Vec<CellPos> {
        self.active_positions()
            .filter(|&pos| self.symbol_at(pos).is_some_and(Symbol::is_coin))
            .collect()
    }

    /// Active persistent symbols, column-major
    pub fn persistent_symbols(&self) -> Vec<CellPos> {
        self.active_positions()
            .filter(|&pos| self.symbol_at(pos).is_some_and(Symbol::is_persistent))
            .collect()
    }

    /// Empty cells in the hidden rows above the window
    pub fn empty_cells_above(&self) -> Vec<CellPos> {
        (0..self.cols)
            .flat_map(|col| (0..self.top).map(move |row| CellPos::new(col, row)))
            .filter(|&pos| self.is_empty_at(pos))
            .collect()
    }

    /// Every column of an absolute row holds a symbol
    pub fn is_row_full(&self, row: usize) -> bool {
        row < self.max_rows && (0..self.cols).all(|col| !self.is_empty_at(CellPos::new(col, row)))
    }

    pub fn occupied_count(&self) -> usize {
        self.active_positions()
            .filter(|&pos| !self.is_empty_at(pos))
            .count()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WINDOW GROWTH
    // ═══════════════════════════════════════════════════════════════════════

    /// Reveal one row in `direction`, falling back to the other side when
    /// that edge of the capacity is reached. Returns the revealed row.
    pub(crate) fn grow(&mut self, direction: GrowDirection) -> Option<(GrowDirection, usize)> {
        if self.is_at_capacity() {
            return None;
        }
        let can_up = self.top > 0;
        let can_down = self.bottom() + 1 < self.max_rows;

        let actual = match direction {
            GrowDirection::Up if can_up => GrowDirection::Up,
            GrowDirection::Down if can_down => GrowDirection::Down,
            GrowDirection::Up if can_down => GrowDirection::Down,
            GrowDirection::Down if can_up => GrowDirection::Up,
            _ => return None,
        };

        let revealed = match actual {
            GrowDirection::Up => {
                self.top -= 1;
                self.top
            }
            GrowDirection::Down => {
                self.full_rows_awarded += 1;
                self.bottom() + 1
            }
        };
        self.rows += 1;
        Some((actual, revealed))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RESET
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove every symbol and restore the starting window.
    /// Returns the removed symbols for teardown.
    pub fn clear(&mut self) -> Vec<(CellPos, Symbol)> {
        let removed = self
            .cells
            .iter_mut()
            .filter_map(|cell| cell.symbol.take().map(|s| (cell.pos, s)))
            .collect();
        self.rows = self.default_rows;
        self.top = Self::initial_top(self.max_rows, self.default_rows);
        self.full_rows_awarded = 0;
        removed
    }

    /// Active window as rows of optional symbols (top to bottom)
    pub fn grid(&self) -> Vec<Vec<Option<Symbol>>> {
        (self.top..=self.bottom())
            .map(|row| {
                (0..self.cols)
                    .map(|col| self.symbol_at(CellPos::new(col, row)).copied())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(6, 8, 4).unwrap()
    }

    #[test]
    fn test_initial_window() {
        let b = board();
        assert_eq!(b.rows(), 4);
        assert_eq!(b.top(), 2);
        assert_eq!(b.bottom(), 5);
        assert_eq!(b.bottom() - b.top() + 1, b.rows());
        assert_eq!(b.empty_cells().len(), 24);
        assert_eq!(b.full_rows_awarded(), 0);
    }

    #[test]
    fn test_bad_geometry_rejected() {
        assert!(Board::new(6, 4, 5).is_err());
        assert!(Board::new(0, 8, 4).is_err());
        assert!(Board::new(6, 8, 0).is_err());
    }

    #[test]
    fn test_place_and_occupied() {
        let mut b = board();
        let pos = CellPos::new(1, 3);
        b.place(pos, Symbol::coin(2)).unwrap();
        assert_eq!(b.symbol_at(pos), Some(&Symbol::coin(2)));
        assert!(matches!(
            b.place(pos, Symbol::Unlock),
            Err(BonusError::CellOccupied { col: 1, row: 3 })
        ));
        assert!(matches!(
            b.place(CellPos::new(6, 0), Symbol::Unlock),
            Err(BonusError::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_cells_column_major() {
        let b = board();
        let empty = b.empty_cells();
        assert_eq!(empty[0], CellPos::new(0, 2));
        assert_eq!(empty[1], CellPos::new(0, 3));
        assert_eq!(empty[4], CellPos::new(1, 2));
    }

    #[test]
    fn test_queries_ignore_hidden_rows() {
        let mut b = board();
        b.place(CellPos::new(0, 0), Symbol::coin(9)).unwrap();
        b.place(CellPos::new(0, 2), Symbol::coin(1)).unwrap();
        assert_eq!(b.coins(), vec![CellPos::new(0, 2)]);
        assert_eq!(b.symbols().len(), 1);
        assert_eq!(b.empty_cells_above().len(), 6 * 2 - 1);
    }

    #[test]
    fn test_row_full() {
        let mut b = board();
        for col in 0..6 {
            assert!(!b.is_row_full(3));
            b.place(CellPos::new(col, 3), Symbol::Unlock).unwrap();
        }
        assert!(b.is_row_full(3));
        assert!(!b.is_row_full(42));
    }

    #[test]
    fn test_grow_falls_back_at_edge() {
        let mut b = board();
        assert_eq!(b.grow(GrowDirection::Up), Some((GrowDirection::Up, 1)));
        assert_eq!(b.grow(GrowDirection::Up), Some((GrowDirection::Up, 0)));
        assert_eq!(b.full_rows_awarded(), 0);
        // top edge reached: falls back downward
        assert_eq!(b.grow(GrowDirection::Up), Some((GrowDirection::Down, 6)));
        assert_eq!(b.grow(GrowDirection::Down), Some((GrowDirection::Down, 7)));
        assert_eq!(b.full_rows_awarded(), 2);
        assert_eq!(b.rows(), 8);
        assert_eq!(b.grow(GrowDirection::Down), None);
    }

    #[test]
    fn test_bottom_tracks_award_count() {
        let mut b = board();
        let initial_bottom = b.bottom();
        for direction in [
            GrowDirection::Down,
            GrowDirection::Up,
            GrowDirection::Up,
            // top exhausted, reveals below
            GrowDirection::Up,
        ] {
            b.grow(direction).unwrap();
            assert_eq!(b.bottom(), initial_bottom + b.full_rows_awarded());
            assert_eq!(b.bottom() - b.top() + 1, b.rows());
        }
        assert!(b.is_at_capacity());
        assert_ne!(b.top(), b.full_rows_awarded());
    }

    #[test]
    fn test_clear_restores_window() {
        let mut b = board();
        b.place(CellPos::new(2, 2), Symbol::coin(4)).unwrap();
        b.place(CellPos::new(3, 0), Symbol::coin(1)).unwrap();
        b.grow(GrowDirection::Down);

        let removed = b.clear();
        assert_eq!(removed.len(), 2);
        assert_eq!(b.rows(), 4);
        assert_eq!(b.top(), 2);
        assert_eq!(b.full_rows_awarded(), 0);
        assert_eq!(b.occupied_count(), 0);
    }

    #[test]
    fn test_set_coin_value_only_on_coins() {
        let mut b = board();
        b.place(CellPos::new(0, 2), Symbol::coin(2)).unwrap();
        b.place(CellPos::new(1, 2), Symbol::Unlock).unwrap();
        assert_eq!(b.set_coin_value(CellPos::new(0, 2), 3), Some(2));
        assert_eq!(b.set_coin_value(CellPos::new(1, 2), 3), None);
        assert_eq!(b.symbol_at(CellPos::new(0, 2)), Some(&Symbol::coin(3)));
    }
}
