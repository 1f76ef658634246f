//! Game rules for Connect Four.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from board
//! storage so the session engine and the heuristic opponent share them.

pub mod draw;
pub mod threat;
pub mod win;

pub use draw::is_full;
pub use threat::count_horizontal_threes;
pub use win::{check_win, check_winner};
