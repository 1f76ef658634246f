//! Heuristic opponent.
//!
//! One ply of lookahead plus one defensive ply, evaluated as a fixed ladder:
//!
//! 1. play a column that wins now;
//! 2. block a column where the opponent would win now;
//! 3. play the column that leaves the most own horizontal threes;
//! 4. play the first column where the opponent would have a horizontal three;
//! 5. prefer the centre, working outwards;
//! 6. pick any open column at random.
//!
//! This is a casual opponent, not a solver.

use crate::rules::{check_win, count_horizontal_threes};
use crate::types::{Board, COLS, Disc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Column order for the positional preference, centre first.
pub const CENTER_OUT: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

/// Column returned when the board has no open column at all.
pub const DEFAULT_COLUMN: usize = 3;

/// Picks a column for `bot` using the thread-local RNG for the final tie-break.
pub fn pick_column(board: &Board, bot: Disc) -> usize {
    pick_column_with(board, bot, &mut rand::thread_rng())
}

/// Picks a column for `bot`, drawing the fallback choice from `rng`.
#[instrument(skip(board, rng))]
pub fn pick_column_with<R: Rng + ?Sized>(board: &Board, bot: Disc, rng: &mut R) -> usize {
    let opponent = bot.opponent();

    if let Some(col) = (0..COLS).find(|&c| wins_after(board, c, bot)) {
        debug!(col, "Taking immediate win");
        return col;
    }

    if let Some(col) = (0..COLS).find(|&c| wins_after(board, c, opponent)) {
        debug!(col, "Blocking opponent win");
        return col;
    }

    // Strictly greater keeps the leftmost column on ties.
    let mut best: Option<(usize, usize)> = None;
    for col in 0..COLS {
        if let Some(threes) = threes_after(board, col, bot)
            && best.is_none_or(|(_, most)| threes > most)
        {
            best = Some((col, threes));
        }
    }
    if let Some((col, threes)) = best
        && threes > 0
    {
        debug!(col, threes, "Building threat");
        return col;
    }

    if let Some(col) =
        (0..COLS).find(|&c| threes_after(board, c, opponent).is_some_and(|threes| threes > 0))
    {
        debug!(col, "Blocking opponent threat");
        return col;
    }

    if let Some(col) = CENTER_OUT.into_iter().find(|&c| !board.is_column_full(c)) {
        return col;
    }

    // Only reachable on a full board, which ends the game before the bot moves.
    board
        .open_columns()
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_COLUMN)
}

fn simulate(board: &Board, column: usize, disc: Disc) -> Option<Board> {
    let mut trial = *board;
    trial.drop_disc(column, disc).then_some(trial)
}

fn wins_after(board: &Board, column: usize, disc: Disc) -> bool {
    simulate(board, column, disc).is_some_and(|b| check_win(&b, disc))
}

fn threes_after(board: &Board, column: usize, disc: Disc) -> Option<usize> {
    simulate(board, column, disc).map(|b| count_horizontal_threes(&b, disc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn play(board: &mut Board, moves: &[(usize, Disc)]) {
        for &(col, disc) in moves {
            assert!(board.drop_disc(col, disc));
        }
    }

    #[test]
    fn test_takes_immediate_win() {
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (0, Disc::PlayerTwo),
                (1, Disc::PlayerTwo),
                (2, Disc::PlayerTwo),
                (0, Disc::PlayerOne),
                (1, Disc::PlayerOne),
                (2, Disc::PlayerOne),
            ],
        );
        // Both sides threaten column 3; the bot prefers winning.
        assert_eq!(pick_column(&board, Disc::PlayerTwo), 3);
    }

    #[test]
    fn test_blocks_opponent_win() {
        let mut board = Board::new();
        play(
            &mut board,
            &[(6, Disc::PlayerOne), (6, Disc::PlayerOne), (6, Disc::PlayerOne)],
        );
        assert_eq!(pick_column(&board, Disc::PlayerTwo), 6);
    }

    #[test]
    fn test_builds_threat() {
        let mut board = Board::new();
        play(&mut board, &[(4, Disc::PlayerTwo), (5, Disc::PlayerTwo)]);
        // Column 3 or 6 completes a three; 3 is scanned first.
        assert_eq!(pick_column(&board, Disc::PlayerTwo), 3);
    }

    #[test]
    fn test_blocks_opponent_threat() {
        let mut board = Board::new();
        play(&mut board, &[(0, Disc::PlayerOne), (1, Disc::PlayerOne)]);
        // Bot has no threes to build; opponent would make one in column 2.
        assert_eq!(pick_column(&board, Disc::PlayerTwo), 2);
    }

    #[test]
    fn test_prefers_center_on_empty_board() {
        assert_eq!(pick_column(&Board::new(), Disc::PlayerTwo), 3);
    }

    #[test]
    fn test_center_out_skips_full_columns() {
        let mut board = Board::new();
        // Alternate in pairs so column 3 fills without any line forming.
        for disc in [
            Disc::PlayerOne,
            Disc::PlayerOne,
            Disc::PlayerTwo,
            Disc::PlayerTwo,
            Disc::PlayerOne,
            Disc::PlayerOne,
        ] {
            board.drop_disc(3, disc);
        }
        assert_eq!(pick_column(&board, Disc::PlayerTwo), 2);
    }

    #[test]
    fn test_full_board_returns_default() {
        let stacks = ["112211", "221122", "112211", "221122", "112211", "221122", "112211"];
        let mut board = Board::new();
        for (col, stack) in stacks.iter().enumerate() {
            for c in stack.chars() {
                let disc = if c == '1' { Disc::PlayerOne } else { Disc::PlayerTwo };
                board.drop_disc(col, disc);
            }
        }
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_column_with(&board, Disc::PlayerTwo, &mut rng), DEFAULT_COLUMN);
    }

    #[test]
    fn test_choice_is_always_legal() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut board = Board::new();
        let mut disc = Disc::PlayerOne;
        while !board.open_columns().is_empty() {
            let col = pick_column_with(&board, disc, &mut rng);
            assert!(!board.is_column_full(col), "picked full column {col}");
            board.drop_disc(col, disc);
            if check_win(&board, disc) {
                break;
            }
            disc = disc.opponent();
        }
    }
}
