use board::{PendingPromotion, Piece, PieceKind, Position, Square};

/// What committing a move did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub position: Position,
    /// The square skipped over if this was a pawn's double step
    pub en_passant: Option<Square>,
    /// Set when a pawn reached the far rank and is waiting to be promoted
    pub promotion: Option<PendingPromotion>,
    /// The piece taken off the board, including a pawn taken en passant
    pub captured: Option<Piece>,
}

/// Apply a move to a copy of `position`
///
/// Legality is not checked here; use [`crate::is_legal_move`] first. The moved piece is marked as
/// having moved, a castling king brings its rook along, and a pawn capturing onto `en_passant`
/// removes the pawn beside it. A piece that isn't on its square, or an off-board target, leaves
/// the position as it was.
///
/// ```
/// # use board::{Position, Square};
/// # use rules::apply_move;
/// let position = Position::initial();
/// let pawn = position.get(Square::E2).unwrap();
/// let applied = apply_move(&position, pawn, Square::E4, None);
/// assert_eq!(applied.en_passant, Some(Square::E3));
/// assert!(applied.position.get(Square::E4).unwrap().has_moved);
/// ```
pub fn apply_move(
    position: &Position,
    piece: Piece,
    to: Square,
    en_passant: Option<Square>,
) -> Applied {
    let unchanged = Applied {
        position: *position,
        en_passant: None,
        promotion: None,
        captured: None,
    };
    let from = piece.square;
    let Some((rows, cols)) = from.delta_to(to) else {
        return unchanged;
    };
    let mut next = *position;
    let Some(piece) = next.clear(from) else {
        return unchanged;
    };
    let mut captured = next.clear(to);
    next.place(to, piece.moved_to(to));

    let mut skipped = None;
    let mut promotion = None;
    match piece.kind {
        PieceKind::King if rows == 0 && cols.abs() == 2 => {
            let corner = match from.to_row_col() {
                Some((row, 4)) => Square::new(row as i8, if cols > 0 { 7 } else { 0 }),
                _ => Square::INVALID,
            };
            if let Some(rook) = next.clear(corner) {
                let beside = from.offset(0, cols.signum());
                next.place(beside, rook.moved_to(beside));
            }
        }
        PieceKind::Pawn => {
            if rows.abs() == 2 {
                skipped = Some(from.offset(rows / 2, 0));
            } else if cols != 0 && captured.is_none() && en_passant == Some(to) {
                captured = next.clear(from.offset(0, cols));
            }
            if to.to_row_col().is_some_and(|(row, _)| row == piece.side.promotion_row()) {
                promotion = Some(PendingPromotion {
                    square: to,
                    side: piece.side,
                });
            }
        }
        _ => {}
    }
    Applied {
        position: next,
        en_passant: skipped,
        promotion,
        captured,
    }
}

/// Replace the pawn waiting on `pending` with a piece of `kind`
///
/// Returns `None` if `kind` isn't something a pawn can become, or if the square doesn't hold a
/// pawn of the promoting side.
pub fn resolve_promotion(
    position: &Position,
    pending: PendingPromotion,
    kind: PieceKind,
) -> Option<Position> {
    if !kind.is_promotable() {
        return None;
    }
    let pawn = position
        .get(pending.square)
        .filter(|piece| piece.is(PieceKind::Pawn, pending.side))?;
    let mut next = *position;
    next.place(pending.square, Piece { kind, ..pawn });
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    use board::{encode, parse, Side};

    #[test]
    fn test_simple_move_and_capture() {
        let position = parse("4k3/8/8/3p4/4N3/8/8/4K3 w - - 0 1").unwrap().position;
        let knight = position.get(Square::E4).unwrap();
        let applied = apply_move(&position, knight, Square::D6, None);
        assert_eq!(applied.captured, None);
        assert_eq!(applied.position.get(Square::E4), None);
        assert!(applied.position.get(Square::D6).unwrap().has_moved);

        let pawn_taken = apply_move(&position, knight, Square::D5, None);
        assert_eq!(pawn_taken.captured.map(|piece| piece.kind), Some(PieceKind::Pawn));
        assert_eq!(pawn_taken.position.pieces().count(), 3);
    }

    #[test]
    fn test_en_passant_removes_pawn_beside() {
        let position = Position::EMPTY
            .with(Piece::new(PieceKind::Pawn, Side::Light, Square::E5).moved_to(Square::E5))
            .with(Piece::new(PieceKind::Pawn, Side::Dark, Square::F5).moved_to(Square::F5));
        let pawn = position.get(Square::new(3, 4)).unwrap();
        let applied = apply_move(&position, pawn, Square::new(2, 5), Some(Square::new(2, 5)));
        assert_eq!(applied.position.get(Square::new(3, 5)), None);
        assert_eq!(applied.position.get(Square::new(2, 5)).unwrap().kind, PieceKind::Pawn);
        assert_eq!(applied.captured.map(|piece| piece.side), Some(Side::Dark));
        assert_eq!(applied.en_passant, None);
    }

    #[test]
    fn test_diagonal_step_without_target_leaves_neighbour() {
        let position = Position::EMPTY
            .with(Piece::new(PieceKind::Pawn, Side::Light, Square::E5))
            .with(Piece::new(PieceKind::Pawn, Side::Dark, Square::F5));
        let pawn = position.get(Square::E5).unwrap();
        let applied = apply_move(&position, pawn, Square::F6, None);
        assert!(applied.position.get(Square::F5).is_some());
    }

    #[test]
    fn test_castling_moves_rook() {
        let position = Position::EMPTY
            .with(Piece::new(PieceKind::King, Side::Light, Square::new(7, 4)))
            .with(Piece::new(PieceKind::Rook, Side::Light, Square::new(7, 7)))
            .with(Piece::new(PieceKind::Rook, Side::Light, Square::new(7, 0)));
        let king = position.get(Square::new(7, 4)).unwrap();

        let short = apply_move(&position, king, Square::new(7, 6), None).position;
        assert_eq!(short.get(Square::new(7, 7)), None);
        let rook = short.get(Square::new(7, 5)).unwrap();
        assert!(rook.is(PieceKind::Rook, Side::Light) && rook.has_moved);

        let long = apply_move(&position, king, Square::new(7, 2), None).position;
        assert_eq!(long.get(Square::new(7, 0)), None);
        assert!(long.get(Square::new(7, 3)).unwrap().is(PieceKind::Rook, Side::Light));
        assert_eq!(encode(&long, Side::Dark, None), "8/8/8/8/8/8/8/2KR3R b - - 0 1");
    }

    #[test]
    fn test_promotion_is_pending_then_resolved() {
        let position = Position::EMPTY
            .with(Piece::new(PieceKind::Pawn, Side::Dark, Square::B2).moved_to(Square::B2));
        let pawn = position.get(Square::B2).unwrap();
        let applied = apply_move(&position, pawn, Square::B1, None);
        let pending = applied.promotion.unwrap();
        assert_eq!(pending, PendingPromotion { square: Square::B1, side: Side::Dark });

        assert_eq!(resolve_promotion(&applied.position, pending, PieceKind::King), None);
        assert_eq!(resolve_promotion(&applied.position, pending, PieceKind::Pawn), None);
        let promoted = resolve_promotion(&applied.position, pending, PieceKind::Knight).unwrap();
        let knight = promoted.get(Square::B1).unwrap();
        assert!(knight.is(PieceKind::Knight, Side::Dark));
        assert!(knight.has_moved);
    }

    #[test]
    fn test_promotion_needs_pawn_of_side() {
        let position = Position::EMPTY.with(Piece::new(PieceKind::Pawn, Side::Light, Square::A8));
        let wrong_side = PendingPromotion {
            square: Square::A8,
            side: Side::Dark,
        };
        assert_eq!(resolve_promotion(&position, wrong_side, PieceKind::Queen), None);
        let empty = PendingPromotion {
            square: Square::B8,
            side: Side::Light,
        };
        assert_eq!(resolve_promotion(&position, empty, PieceKind::Queen), None);
    }

    #[test]
    fn test_invalid_input_leaves_position() {
        let position = Position::initial();
        let pawn = position.get(Square::E2).unwrap();
        assert_eq!(apply_move(&position, pawn, Square::INVALID, None).position, position);
        let ghost = Piece::new(PieceKind::Queen, Side::Light, Square::E4);
        assert_eq!(apply_move(&position, ghost, Square::E5, None).position, position);
    }
}
