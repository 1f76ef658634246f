//! Win detection by construction: plant a line, assert it is found.

use connect4_game::rules::{check_win, check_winner};
use connect4_game::{Board, COLS, Disc, Game, MoveOutcome, ROWS};

/// Direction steps as (row delta, col delta).
const ORIENTATIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Builds a legal (gravity-respecting) board with `disc` on `cells`, every
/// supporting cell beneath them holding the opponent.
fn plant(cells: &[(usize, usize)], disc: Disc) -> Board {
    let mut board = Board::new();
    for col in 0..COLS {
        let Some(top) = cells.iter().filter(|&&(_, c)| c == col).map(|&(r, _)| r).min() else {
            continue;
        };
        for row in (top..ROWS).rev() {
            let fill = if cells.contains(&(row, col)) { disc } else { disc.opponent() };
            assert!(board.drop_disc(col, fill));
        }
    }
    board
}

fn line(start: (usize, usize), step: (isize, isize), len: usize) -> Option<Vec<(usize, usize)>> {
    (0..len as isize)
        .map(|i| {
            let r = start.0 as isize + step.0 * i;
            let c = start.1 as isize + step.1 * i;
            ((0..ROWS as isize).contains(&r) && (0..COLS as isize).contains(&c))
                .then_some((r as usize, c as usize))
        })
        .collect()
}

#[test]
fn test_every_line_of_four_is_detected() {
    let mut planted = 0;
    for step in ORIENTATIONS {
        for row in 0..ROWS {
            for col in 0..COLS {
                let Some(cells) = line((row, col), step, 4) else {
                    continue;
                };
                for disc in [Disc::PlayerOne, Disc::PlayerTwo] {
                    let board = plant(&cells, disc);
                    assert!(
                        check_win(&board, disc),
                        "missed {disc} line at {cells:?}\n{}",
                        board.display()
                    );
                }
                planted += 1;
            }
        }
    }
    // 24 horizontal + 21 vertical + 12 + 12 diagonal windows.
    assert_eq!(planted, 69);
}

#[test]
fn test_no_line_of_three_is_a_win() {
    for step in ORIENTATIONS {
        for row in 0..ROWS {
            for col in 0..COLS {
                let Some(cells) = line((row, col), step, 3) else {
                    continue;
                };
                let board = plant(&cells, Disc::PlayerOne);
                assert!(!check_win(&board, Disc::PlayerOne), "false positive at {cells:?}");
            }
        }
    }
}

#[test]
fn test_check_winner_reports_seat() {
    let cells = line((5, 2), (0, 1), 4).expect("fits");
    assert_eq!(check_winner(&plant(&cells, Disc::PlayerTwo)), Some(Disc::PlayerTwo));
    assert_eq!(check_winner(&Board::new()), None);
}

#[test]
fn test_full_game_to_draw() {
    // A full 42-move game in which neither side ever completes a line.
    const MOVES: [i64; 42] = [
        5, 4, 5, 0, 6, 2, 4, 5, 5, 0, 4, 1, 1, 0, 4, 5, 6, 5, 3, 1, 1, 2, 2, 6, 2, 6, 6, 3, 6,
        2, 0, 3, 0, 3, 3, 4, 3, 1, 4, 2, 1, 0,
    ];
    let mut game = Game::new();
    for (i, &col) in MOVES.iter().enumerate() {
        let outcome = game.apply_move(col, game.turn()).expect("legal move");
        if i + 1 < MOVES.len() {
            assert_eq!(outcome, MoveOutcome::Continue, "move {i} ended the game");
        } else {
            assert_eq!(outcome, MoveOutcome::Draw);
        }
    }
    assert!(game.is_over());
    assert_eq!(game.moves(), ROWS * COLS);
    assert_eq!(check_winner(game.board()), None);
}
