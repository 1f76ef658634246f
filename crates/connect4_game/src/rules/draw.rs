//! Draw detection logic for Connect Four.

use crate::types::{Board, COLS};
use tracing::instrument;

/// Checks if the board is full.
///
/// Looking at the top row is enough because columns fill bottom-up.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    (0..COLS).all(|col| board.is_column_full(col))
}

#[cfg(test)]
mod tests {
    use super::super::win::check_winner;
    use super::*;
    use crate::types::{Disc, ROWS};

    fn is_draw(board: &Board) -> bool {
        is_full(board) && check_winner(board).is_none()
    }

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_one_open_cell_not_full() {
        let mut board = Board::new();
        for col in 0..COLS {
            let height = if col == 4 { ROWS - 1 } else { ROWS };
            for _ in 0..height {
                board.drop_disc(col, Disc::PlayerOne);
            }
        }
        assert!(!is_full(&board));
        assert_eq!(board.open_columns(), vec![4]);
    }

    #[test]
    fn test_draw_pattern() {
        // Columns alternate in pairs so no line of four forms anywhere:
        // 112211 / 221122 stacks in a 2-2-2 rhythm across the board.
        let stacks = ["112211", "221122", "112211", "221122", "112211", "221122", "112211"];
        let mut board = Board::new();
        for (col, stack) in stacks.iter().enumerate() {
            for c in stack.chars() {
                let disc = if c == '1' { Disc::PlayerOne } else { Disc::PlayerTwo };
                board.drop_disc(col, disc);
            }
        }
        assert!(is_full(&board));
        assert!(is_draw(&board));
    }
}
