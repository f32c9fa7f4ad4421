use board::{Piece, PieceKind, Position, Side, Square};

use crate::{apply, attack};

/// The context a move is judged in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegalityOptions {
    /// The square a pawn skipped over on the immediately preceding move, if any
    pub en_passant: Option<Square>,
    /// Whether to reject moves that leave the mover's own king in check
    ///
    /// Always off when asking about attacks, since check detection is itself built on attacks.
    pub verify_king_safety: bool,
}
impl LegalityOptions {
    /// Options for asking whether a piece attacks a square
    pub const ATTACKS: Self = Self {
        en_passant: None,
        verify_king_safety: false,
    };

    /// Full legality, with the given en passant target
    pub const fn with_en_passant(en_passant: Option<Square>) -> Self {
        Self {
            en_passant,
            verify_king_safety: true,
        }
    }
}
impl Default for LegalityOptions {
    fn default() -> Self {
        Self::with_en_passant(None)
    }
}

/// Check if `piece` may move to `to` in `position`.
///
/// Whose turn it is doesn't matter here; the caller enforces that. The piece is looked up on its
/// own square, and a piece that isn't actually standing there (or whose square is off the board)
/// is never legal to move.
pub fn is_legal_move(
    position: &Position,
    piece: Piece,
    to: Square,
    options: LegalityOptions,
) -> bool {
    let from = piece.square;
    if !from.is_valid() || !to.is_valid() || from == to {
        return false;
    }
    // The board's copy is authoritative for `has_moved`
    let Some(piece) = position
        .get(from)
        .filter(|stored| stored.is(piece.kind, piece.side))
    else {
        return false;
    };
    let Some((rows, cols)) = from.delta_to(to) else {
        return false;
    };
    let geometry = match piece.kind {
        PieceKind::Pawn => pawn_move(position, piece, to, rows, cols, options.en_passant),
        PieceKind::Knight => {
            matches!((rows.abs(), cols.abs()), (1, 2) | (2, 1)) && !own(position, piece.side, to)
        }
        PieceKind::Bishop => bishop_move(position, piece, to, rows, cols),
        PieceKind::Rook => rook_move(position, piece, to, rows, cols),
        PieceKind::Queen => {
            rook_move(position, piece, to, rows, cols)
                || bishop_move(position, piece, to, rows, cols)
        }
        PieceKind::King => king_move(position, piece, to, rows, cols),
    };
    if !geometry {
        return false;
    }
    if !options.verify_king_safety {
        return true;
    }
    if is_castle(piece, rows, cols) && !castle_path_safe(position, piece, cols) {
        return false;
    }
    let after = apply::apply_move(position, piece, to, options.en_passant);
    !attack::is_king_in_check(&after.position, piece.side)
}

/// Whether `to` holds a piece belonging to `side`
fn own(position: &Position, side: Side, to: Square) -> bool {
    position.get(to).is_some_and(|piece| piece.side == side)
}

/// Whether every square strictly between `from` and `to` is empty
///
/// Only meaningful for squares on a shared rank, file, or diagonal.
fn path_clear(position: &Position, from: Square, to: Square, rows: i8, cols: i8) -> bool {
    let (row_step, col_step) = (rows.signum(), cols.signum());
    let mut square = from.offset(row_step, col_step);
    while square.is_valid() && square != to {
        if !position.is_empty(square) {
            return false;
        }
        square = square.offset(row_step, col_step);
    }
    square == to
}

fn pawn_move(
    position: &Position,
    pawn: Piece,
    to: Square,
    rows: i8,
    cols: i8,
    en_passant: Option<Square>,
) -> bool {
    let forward = pawn.side.forward();
    if cols == 0 && rows == forward {
        return position.is_empty(to);
    }
    if cols == 0 && rows == 2 * forward {
        let on_start_row = pawn
            .square
            .to_row_col()
            .is_some_and(|(row, _)| row == pawn.side.pawn_row());
        return !pawn.has_moved
            && on_start_row
            && position.is_empty(pawn.square.offset(forward, 0))
            && position.is_empty(to);
    }
    if cols.abs() == 1 && rows == forward {
        if let Some(target) = position.get(to) {
            return target.side != pawn.side;
        }
        // En passant: the pawn being taken sits beside us, not on the target
        return en_passant == Some(to)
            && position
                .get(pawn.square.offset(0, cols))
                .is_some_and(|beside| beside.is(PieceKind::Pawn, pawn.side.other()));
    }
    false
}

fn rook_move(position: &Position, piece: Piece, to: Square, rows: i8, cols: i8) -> bool {
    (rows == 0 || cols == 0)
        && path_clear(position, piece.square, to, rows, cols)
        && !own(position, piece.side, to)
}

fn bishop_move(position: &Position, piece: Piece, to: Square, rows: i8, cols: i8) -> bool {
    rows != 0
        && rows.abs() == cols.abs()
        && path_clear(position, piece.square, to, rows, cols)
        && !own(position, piece.side, to)
}

fn is_castle(piece: Piece, rows: i8, cols: i8) -> bool {
    piece.kind == PieceKind::King && rows == 0 && cols.abs() == 2
}

fn king_move(position: &Position, king: Piece, to: Square, rows: i8, cols: i8) -> bool {
    if rows.abs() <= 1 && cols.abs() <= 1 {
        return !own(position, king.side, to);
    }
    if !is_castle(king, rows, cols) || king.has_moved {
        return false;
    }
    // Castling starts from the king's home file
    let Some((row, 4)) = king.square.to_row_col() else {
        return false;
    };
    let corner = Square::new(row as i8, if cols > 0 { 7 } else { 0 });
    let rook_ready = position
        .get(corner)
        .is_some_and(|rook| rook.is(PieceKind::Rook, king.side) && !rook.has_moved);
    let Some((_, towards_rook)) = king.square.delta_to(corner) else {
        return false;
    };
    rook_ready && path_clear(position, king.square, corner, 0, towards_rook)
}

/// A king may not castle out of check or across an attacked square
///
/// Where the king lands is covered by the usual self-check test.
fn castle_path_safe(position: &Position, king: Piece, cols: i8) -> bool {
    let enemy = king.side.other();
    !attack::is_square_attacked(position, king.square, enemy)
        && !attack::is_square_attacked(position, king.square.offset(0, cols.signum()), enemy)
}
