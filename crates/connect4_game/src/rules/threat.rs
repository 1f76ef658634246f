//! Threat counting used by the heuristic opponent.

use crate::types::{Board, COLS, Disc, ROWS};

/// Counts horizontal windows of three consecutive `disc` cells.
///
/// Overlapping windows count separately, so four in a row counts as two.
/// Only rows are scanned.
pub fn count_horizontal_threes(board: &Board, disc: Disc) -> usize {
    let mut count = 0;
    for row in 0..ROWS {
        for col in 0..=COLS - 3 {
            if (col..col + 3).all(|c| board.holds(row, c, disc)) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_threes_on_empty_board() {
        assert_eq!(count_horizontal_threes(&Board::new(), Disc::PlayerOne), 0);
    }

    #[test]
    fn test_single_three() {
        let mut board = Board::new();
        for col in 2..5 {
            board.drop_disc(col, Disc::PlayerTwo);
        }
        assert_eq!(count_horizontal_threes(&board, Disc::PlayerTwo), 1);
        assert_eq!(count_horizontal_threes(&board, Disc::PlayerOne), 0);
    }

    #[test]
    fn test_overlapping_windows() {
        let mut board = Board::new();
        for col in 0..4 {
            board.drop_disc(col, Disc::PlayerOne);
        }
        assert_eq!(count_horizontal_threes(&board, Disc::PlayerOne), 2);
    }

    #[test]
    fn test_vertical_three_not_counted() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.drop_disc(0, Disc::PlayerOne);
        }
        assert_eq!(count_horizontal_threes(&board, Disc::PlayerOne), 0);
    }
}
