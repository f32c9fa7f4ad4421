//! FEN-style text for positions
//!
//! This is what gets sent to move-suggestion services, and what the command line accepts for a
//! starting position.

use crate::{Piece, PieceKind, Position, Side, Square, SquareParseError};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FenError {
    #[error("FEN was missing its piece placement")]
    MissingPlacement,
    #[error("expected 8 ranks in the piece placement, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 squares")]
    RankWidth { rank: usize },
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
    #[error("unknown active side {0:?}")]
    UnknownSide(String),
    #[error("invalid en passant square: {0}")]
    EnPassant(#[from] SquareParseError),
    #[error("invalid move counter {0:?}")]
    Counter(String),
}

/// Everything read back out of a FEN string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Setup {
    pub position: Position,
    pub side_to_move: Side,
    pub en_passant: Option<Square>,
    pub fullmove: u32,
}

/// Encode a position for a move-suggestion service
///
/// The counters are written as `0 1`; use [`encode_with_counters`] to supply real ones.
///
/// ```
/// # use board::{encode, Position, Side};
/// assert_eq!(
///     encode(&Position::initial(), Side::Light, None),
///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
/// );
/// ```
pub fn encode(position: &Position, side_to_move: Side, en_passant: Option<Square>) -> String {
    encode_with_counters(position, side_to_move, en_passant, 0, 1)
}

/// Encode a position along with its half-move clock and full-move number
///
/// Castling availability is derived from the `has_moved` flags of each king and its corner rooks.
pub fn encode_with_counters(
    position: &Position,
    side_to_move: Side,
    en_passant: Option<Square>,
    halfmove: u32,
    fullmove: u32,
) -> String {
    format!(
        "{} {} {} {} {} {}",
        placement(position),
        side_to_move.fen_letter(),
        castling(position),
        en_passant.and_then(Square::as_str_legal).unwrap_or("-"),
        halfmove,
        fullmove,
    )
}

/// The piece placement field alone
pub(crate) fn placement(position: &Position) -> String {
    let mut out = String::with_capacity(71);
    for row in 0..8 {
        if row > 0 {
            out.push('/');
        }
        let mut empty = 0u8;
        for col in 0..8 {
            match position.get(Square::new(row, col)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    out.push(piece.fen_letter());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push(char::from(b'0' + empty));
        }
    }
    out
}

/// The corner columns, with the castling letter for the light side
const CORNERS: [(i8, char); 2] = [(7, 'K'), (0, 'Q')];

fn castling(position: &Position) -> String {
    let mut rights = String::with_capacity(4);
    for side in [Side::Light, Side::Dark] {
        let home = side.home_row() as i8;
        let unmoved = |col: i8, kind: PieceKind| {
            position
                .get(Square::new(home, col))
                .is_some_and(|piece| piece.is(kind, side) && !piece.has_moved)
        };
        if !unmoved(4, PieceKind::King) {
            continue;
        }
        for (col, letter) in CORNERS {
            if unmoved(col, PieceKind::Rook) {
                rights.push(match side {
                    Side::Light => letter,
                    Side::Dark => letter.to_ascii_lowercase(),
                });
            }
        }
    }
    if rights.is_empty() {
        rights.push('-');
    }
    rights
}

/// Parse FEN text back into a position
///
/// Only the piece placement is required; the other fields default to light to move, no en passant
/// target, and full-move number 1. `has_moved` is inferred: pawns off their starting row and kings
/// off their home square have moved, and a corner rook has moved unless the castling field grants
/// its right (or is absent altogether).
pub fn parse(fen: &str) -> Result<Setup, FenError> {
    let mut terms = fen.split_whitespace();
    let placement = terms.next().ok_or(FenError::MissingPlacement)?;
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }
    let mut position = Position::EMPTY;
    for (row, rank) in ranks.into_iter().enumerate() {
        let width_error = FenError::RankWidth { rank: 8 - row };
        let mut col = 0;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                col += skip;
                continue;
            }
            let kind = PieceKind::from_fen_letter(c).ok_or(FenError::UnknownPiece(c))?;
            if col >= 8 {
                return Err(width_error);
            }
            let side = if c.is_ascii_uppercase() {
                Side::Light
            } else {
                Side::Dark
            };
            let square = Square::new(row as i8, col as i8);
            position.place(square, Piece::new(kind, side, square));
            col += 1;
        }
        if col != 8 {
            return Err(width_error);
        }
    }
    let side_to_move = match terms.next() {
        None | Some("w") => Side::Light,
        Some("b") => Side::Dark,
        Some(other) => return Err(FenError::UnknownSide(other.to_string())),
    };
    let castling = terms.next();
    let en_passant = match terms.next() {
        None | Some("-") => None,
        Some(square) => Some(square.parse()?),
    };
    // The half-move clock is validated but not kept
    terms.next().map(parse_counter).transpose()?;
    let fullmove = terms.next().map(parse_counter).transpose()?.unwrap_or(1);
    infer_history(&mut position, castling);
    Ok(Setup {
        position,
        side_to_move,
        en_passant,
        fullmove,
    })
}

fn parse_counter(term: &str) -> Result<u32, FenError> {
    term.parse()
        .map_err(|_| FenError::Counter(term.to_string()))
}

fn infer_history(position: &mut Position, castling: Option<&str>) {
    for square in Square::all_squares() {
        let Some(mut piece) = position.get(square) else {
            continue;
        };
        let Some((row, col)) = square.to_row_col() else {
            continue;
        };
        let home = piece.side.home_row();
        piece.has_moved = match piece.kind {
            PieceKind::Pawn => row != piece.side.pawn_row(),
            PieceKind::King => (row, col) != (home, 4),
            PieceKind::Rook => {
                let corner = CORNERS
                    .into_iter()
                    .find(|&(corner, _)| corner as u8 == col)
                    .filter(|_| row == home);
                match (corner, castling) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some((_, letter)), Some(rights)) => !rights.contains(match piece.side {
                        Side::Light => letter,
                        Side::Dark => letter.to_ascii_lowercase(),
                    }),
                }
            }
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Queen => false,
        };
        position.place(square, piece);
    }
}
