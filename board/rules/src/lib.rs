//! The rules of chess over a [`board::Position`]: which moves are legal, whether a king is in
//! check, whether the game is over, and what a move does to the board.
//!
//! Everything here is a pure function of its arguments and answers every input, including
//! squares that are off the board.

mod apply;
mod attack;
mod legality;
mod terminal;

pub use crate::apply::{apply_move, resolve_promotion, Applied};
pub use crate::attack::{is_king_in_check, is_square_attacked};
pub use crate::legality::{is_legal_move, LegalityOptions};
pub use crate::terminal::{game_state, has_any_legal_move, legal_moves, legal_targets};
