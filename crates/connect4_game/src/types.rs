//! Core domain types for Connect Four.

use serde::{Deserialize, Serialize};

/// Number of rows on the board.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLS: usize = 7;

/// One of the two seats at the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Disc {
    /// First seat, always moves first.
    #[strum(to_string = "player one")]
    PlayerOne,
    /// Second seat.
    #[strum(to_string = "player two")]
    PlayerTwo,
}

impl Disc {
    /// Returns the opposing seat.
    pub fn opponent(self) -> Self {
        match self {
            Disc::PlayerOne => Disc::PlayerTwo,
            Disc::PlayerTwo => Disc::PlayerOne,
        }
    }

    /// Numeric code used on the wire (1 or 2).
    pub fn code(self) -> u8 {
        match self {
            Disc::PlayerOne => 1,
            Disc::PlayerTwo => 2,
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Empty cell.
    Empty,
    /// Cell holding a disc.
    Occupied(Disc),
}

impl Cell {
    /// Numeric code used on the wire (0 for empty).
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(disc) => disc.code(),
        }
    }
}

/// 6x7 Connect Four board.
///
/// Row 0 is the top row and row 5 the bottom. Discs only ever enter through
/// [`Board::drop_disc`], so every column is filled bottom-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Gets the cell at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Returns true when `(row, col)` holds `disc`. Out of bounds is false.
    pub fn holds(&self, row: usize, col: usize, disc: Disc) -> bool {
        self.get(row, col) == Some(Cell::Occupied(disc))
    }

    /// Drops `disc` into `column`, landing on the lowest empty cell.
    ///
    /// Returns `false` and leaves the board untouched when the column is full.
    ///
    /// # Panics
    ///
    /// Panics if `column >= COLS`. Callers range-check first.
    pub fn drop_disc(&mut self, column: usize, disc: Disc) -> bool {
        for row in (0..ROWS).rev() {
            if self.cells[row][column] == Cell::Empty {
                self.cells[row][column] = Cell::Occupied(disc);
                return true;
            }
        }
        false
    }

    /// Checks if a column has no room left. Out-of-range columns count as full.
    pub fn is_column_full(&self, column: usize) -> bool {
        column >= COLS || self.cells[0][column] != Cell::Empty
    }

    /// Columns that can still accept a disc, left to right.
    pub fn open_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&c| !self.is_column_full(c)).collect()
    }

    /// Number of discs in `column`.
    pub fn column_height(&self, column: usize) -> usize {
        (0..ROWS)
            .filter(|&row| self.cells[row][column] != Cell::Empty)
            .count()
    }

    /// The grid as wire codes (0 empty, 1 player one, 2 player two).
    pub fn to_codes(&self) -> [[u8; COLS]; ROWS] {
        let mut codes = [[0u8; COLS]; ROWS];
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                codes[row][col] = cell.code();
            }
        }
        codes
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in &self.cells {
            for cell in row {
                result.push(match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Disc::PlayerOne) => 'X',
                    Cell::Occupied(Disc::PlayerTwo) => 'O',
                });
            }
            result.push('\n');
        }
        result.push_str("0123456");
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                assert_eq!(board.get(row, col), Some(Cell::Empty));
            }
        }
        assert_eq!(board.open_columns(), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_drop_stacks_bottom_up() {
        let mut board = Board::new();
        assert!(board.drop_disc(3, Disc::PlayerOne));
        assert!(board.drop_disc(3, Disc::PlayerTwo));
        assert_eq!(board.get(5, 3), Some(Cell::Occupied(Disc::PlayerOne)));
        assert_eq!(board.get(4, 3), Some(Cell::Occupied(Disc::PlayerTwo)));
        assert_eq!(board.get(3, 3), Some(Cell::Empty));
    }

    #[test]
    fn test_drop_into_full_column_is_rejected() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            assert!(board.drop_disc(0, Disc::PlayerOne));
        }
        let before = board;
        assert!(!board.drop_disc(0, Disc::PlayerTwo));
        assert_eq!(board, before);
        assert!(board.is_column_full(0));
    }

    #[test]
    fn test_n_drops_fill_exactly_bottom_n() {
        for n in 0..=ROWS {
            let mut board = Board::new();
            for i in 0..n {
                let disc = if i % 2 == 0 { Disc::PlayerOne } else { Disc::PlayerTwo };
                assert!(board.drop_disc(2, disc));
            }
            assert_eq!(board.column_height(2), n);
            for row in 0..ROWS {
                let occupied = board.get(row, 2) != Some(Cell::Empty);
                assert_eq!(occupied, row >= ROWS - n, "n={n} row={row}");
            }
        }
    }

    #[test]
    fn test_out_of_range_column_counts_as_full() {
        let board = Board::new();
        assert!(board.is_column_full(COLS));
        assert_eq!(board.get(0, COLS), None);
    }

    #[test]
    fn test_wire_codes() {
        let mut board = Board::new();
        board.drop_disc(0, Disc::PlayerOne);
        board.drop_disc(6, Disc::PlayerTwo);
        let codes = board.to_codes();
        assert_eq!(codes[5][0], 1);
        assert_eq!(codes[5][6], 2);
        assert_eq!(codes[4][0], 0);
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Disc::PlayerOne.opponent(), Disc::PlayerTwo);
        assert_eq!(Disc::PlayerTwo.opponent(), Disc::PlayerOne);
    }
}
