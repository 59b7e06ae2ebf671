//! Row unlock: grows the active window when a row fills up

use serde::{Deserialize, Serialize};

use crate::board::{Board, GrowDirection};

/// One window growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockEvent {
    /// Absolute row whose completion paid for the unlock
    pub full_row: usize,
    /// Where the revealed row was added
    pub direction: GrowDirection,
    /// Absolute row that became visible
    pub revealed_row: usize,
    /// Visible rows after the unlock
    pub rows: usize,
}

/// Detects full rows and grows the board
///
/// A row pays for at most one unlock: once it has been awarded it no
/// longer counts as a candidate, even though it stays full.
#[derive(Debug, Clone)]
pub struct RowUnlockController {
    awarded: Vec<bool>,
    unlocks: usize,
}

impl RowUnlockController {
    pub fn new(max_rows: usize) -> Self {
        Self {
            awarded: vec![false; max_rows],
            unlocks: 0,
        }
    }

    /// Unlock events since the last reset
    pub fn unlocks(&self) -> usize {
        self.unlocks
    }

    pub fn is_awarded(&self, row: usize) -> bool {
        self.awarded.get(row).copied().unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.awarded.iter_mut().for_each(|a| *a = false);
        self.unlocks = 0;
    }

    /// Full, not yet awarded rows as offsets from the window top
    pub fn candidate_offsets(&self, board: &Board) -> Vec<usize> {
        (board.top()..=board.bottom())
            .filter(|&row| board.is_row_full(row) && !self.is_awarded(row))
            .map(|row| row - board.top())
            .collect()
    }

    /// Grow the window by one row if a candidate row exists
    pub fn check_and_unlock(&mut self, board: &mut Board) -> Option<UnlockEvent> {
        if board.is_at_capacity() {
            return None;
        }

        let candidates = self.candidate_offsets(board);
        let middle = board.rows() / 2;

        // closest to the middle, first found on ties
        let mut chosen: Option<usize> = None;
        for &offset in &candidates {
            let better = match chosen {
                None => true,
                Some(best) => offset.abs_diff(middle) < best.abs_diff(middle),
            };
            if better {
                chosen = Some(offset);
            }
        }
        let offset = chosen?;

        let full_row = board.top() + offset;
        let wanted = if offset < middle {
            GrowDirection::Up
        } else {
            GrowDirection::Down
        };

        let (direction, revealed_row) = board.grow(wanted)?;
        if let Some(slot) = self.awarded.get_mut(full_row) {
            *slot = true;
        }
        self.unlocks += 1;

        log::info!(
            "Row {full_row} full: unlocked row {revealed_row} ({direction:?}), rows now {}",
            board.rows()
        );

        Some(UnlockEvent {
            full_row,
            direction,
            revealed_row,
            rows: board.rows(),
        })
    }
}
