use board::{GameState, Move, Piece, Position, Side, Square};

use crate::{
    attack::is_king_in_check,
    legality::{is_legal_move, LegalityOptions},
};

/// Every square `piece` may legally move to
pub fn legal_targets(
    position: &Position,
    piece: Piece,
    en_passant: Option<Square>,
) -> impl Iterator<Item = Square> + '_ {
    let options = LegalityOptions::with_en_passant(en_passant);
    Square::all_squares().filter(move |&to| is_legal_move(position, piece, to, options))
}

/// Every legal move for `side`, in board order
pub fn legal_moves(
    side: Side,
    position: &Position,
    en_passant: Option<Square>,
) -> impl Iterator<Item = Move> + '_ {
    position.pieces_of(side).flat_map(move |piece| {
        legal_targets(position, piece, en_passant).map(move |to| Move {
            from: piece.square,
            to,
        })
    })
}

/// Whether `side` has at least one legal move
///
/// Stops at the first one found.
pub fn has_any_legal_move(side: Side, position: &Position, en_passant: Option<Square>) -> bool {
    legal_moves(side, position, en_passant).next().is_some()
}

/// Classify the position for the side about to move
///
/// ```
/// # use board::{GameState, Position, Side};
/// # use rules::game_state;
/// assert_eq!(game_state(&Position::initial(), Side::Light, None), GameState::InProgress);
/// ```
pub fn game_state(
    position: &Position,
    side_to_move: Side,
    en_passant: Option<Square>,
) -> GameState {
    let in_check = is_king_in_check(position, side_to_move);
    match (in_check, has_any_legal_move(side_to_move, position, en_passant)) {
        (true, true) => GameState::Check(side_to_move),
        (true, false) => GameState::Checkmate(side_to_move.other()),
        (false, true) => GameState::InProgress,
        (false, false) => GameState::Stalemate,
    }
}
