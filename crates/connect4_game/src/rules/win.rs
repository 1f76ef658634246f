//! Win detection logic for Connect Four.

use crate::types::{Board, COLS, Disc, ROWS};
use tracing::instrument;

/// Checks if `disc` has four in a row anywhere on the board.
///
/// Scans rows, columns and both diagonals, returning as soon as one line
/// is found.
#[instrument(skip(board))]
pub fn check_win(board: &Board, disc: Disc) -> bool {
    check_horizontal(board, disc)
        || check_vertical(board, disc)
        || check_diagonal_down(board, disc)
        || check_diagonal_up(board, disc)
}

/// Returns the seat holding four in a row, if any.
pub fn check_winner(board: &Board) -> Option<Disc> {
    [Disc::PlayerOne, Disc::PlayerTwo]
        .into_iter()
        .find(|&disc| check_win(board, disc))
}

fn line_of_four(board: &Board, disc: Disc, cells: [(usize, usize); 4]) -> bool {
    cells.iter().all(|&(row, col)| board.holds(row, col, disc))
}

fn check_horizontal(board: &Board, disc: Disc) -> bool {
    (0..ROWS).any(|row| {
        (0..=COLS - 4).any(|col| {
            line_of_four(
                board,
                disc,
                [(row, col), (row, col + 1), (row, col + 2), (row, col + 3)],
            )
        })
    })
}

fn check_vertical(board: &Board, disc: Disc) -> bool {
    (0..COLS).any(|col| {
        (0..=ROWS - 4).any(|row| {
            line_of_four(
                board,
                disc,
                [(row, col), (row + 1, col), (row + 2, col), (row + 3, col)],
            )
        })
    })
}

// Top-left to bottom-right (\).
fn check_diagonal_down(board: &Board, disc: Disc) -> bool {
    (0..=ROWS - 4).any(|row| {
        (0..=COLS - 4).any(|col| {
            line_of_four(
                board,
                disc,
                [
                    (row, col),
                    (row + 1, col + 1),
                    (row + 2, col + 2),
                    (row + 3, col + 3),
                ],
            )
        })
    })
}

// Top-right to bottom-left (/).
fn check_diagonal_up(board: &Board, disc: Disc) -> bool {
    (0..=ROWS - 4).any(|row| {
        (3..COLS).any(|col| {
            line_of_four(
                board,
                disc,
                [
                    (row, col),
                    (row + 1, col - 1),
                    (row + 2, col - 2),
                    (row + 3, col - 3),
                ],
            )
        })
    })
}
