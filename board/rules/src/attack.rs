use board::{Piece, PieceKind, Position, Side, Square};

use crate::legality::{is_legal_move, LegalityOptions};

/// Whether any piece of `by` could capture something standing on `square`
///
/// Pawns only attack diagonally, so an empty square (or one held by `by` itself) is treated as if
/// an enemy king stood there. Pinned pieces still attack.
///
/// ```
/// # use board::{Position, Side, Square};
/// # use rules::is_square_attacked;
/// let position = Position::initial();
/// assert!(is_square_attacked(&position, Square::F3, Side::Light));
/// assert!(!is_square_attacked(&position, Square::E4, Side::Light));
/// ```
pub fn is_square_attacked(position: &Position, square: Square, by: Side) -> bool {
    if !square.is_valid() {
        return false;
    }
    let mut trial = *position;
    if position.get(square).map_or(true, |piece| piece.side == by) {
        trial.place(square, Piece::new(PieceKind::King, by.other(), square));
    }
    let attacked = trial
        .pieces_of(by)
        .any(|attacker| is_legal_move(&trial, attacker, square, LegalityOptions::ATTACKS));
    attacked
}

/// Whether `side`'s king is attacked
///
/// A side with no king on the board is never in check.
pub fn is_king_in_check(position: &Position, side: Side) -> bool {
    position
        .king_square(side)
        .is_some_and(|king| is_square_attacked(position, king, side.other()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use board::parse;

    #[test]
    fn test_no_check_at_start() {
        let position = Position::initial();
        assert!(!is_king_in_check(&position, Side::Light));
        assert!(!is_king_in_check(&position, Side::Dark));
    }

    #[test]
    fn test_missing_king_is_not_in_check() {
        let position = Position::EMPTY.with(Piece::new(PieceKind::Queen, Side::Dark, Square::E2));
        assert!(!is_king_in_check(&position, Side::Light));
    }

    #[test]
    fn test_checks_by_each_kind() {
        for fen in [
            "4k3/8/8/8/8/8/3p4/4K3",
            "4k3/8/8/8/8/5n2/8/4K3",
            "4k3/8/8/b7/8/8/8/4K3",
            "4k3/8/8/8/8/8/8/r3K3",
            "4k3/8/8/8/4q3/8/8/4K3",
        ] {
            let position = parse(fen).unwrap().position;
            assert!(is_king_in_check(&position, Side::Light), "{fen}");
            assert!(!is_king_in_check(&position, Side::Dark), "{fen}");
        }
    }

    #[test]
    fn test_adjacent_kings_check_each_other() {
        let position = parse("8/8/8/8/8/8/3k4/4K3").unwrap().position;
        assert!(is_king_in_check(&position, Side::Light));
        assert!(is_king_in_check(&position, Side::Dark));
    }

    #[test]
    fn test_blocked_line_is_not_check() {
        let position = parse("4k3/8/8/8/4q3/8/4P3/4K3").unwrap().position;
        assert!(!is_king_in_check(&position, Side::Light));
    }

    #[test]
    fn test_pawns_attack_diagonally_only() {
        let position = Position::EMPTY.with(Piece::new(PieceKind::Pawn, Side::Light, Square::E2));
        assert!(is_square_attacked(&position, Square::D3, Side::Light));
        assert!(is_square_attacked(&position, Square::F3, Side::Light));
        assert!(!is_square_attacked(&position, Square::E3, Side::Light));
        assert!(!is_square_attacked(&position, Square::E4, Side::Light));
    }

    #[test]
    fn test_defended_piece_counts_as_attacked() {
        let position = Position::EMPTY
            .with(Piece::new(PieceKind::Rook, Side::Dark, Square::A8))
            .with(Piece::new(PieceKind::Knight, Side::Dark, Square::A4));
        assert!(is_square_attacked(&position, Square::A4, Side::Dark));
    }

    #[test]
    fn test_pinned_piece_still_attacks() {
        // The dark knight can't legally move, but the light king still may not step next to it
        let position = parse("4r3/8/8/8/8/8/4n3/4K3").unwrap().position;
        assert!(is_square_attacked(&position, Square::G1, Side::Dark));
        assert!(!is_square_attacked(&position, Square::INVALID, Side::Dark));
    }
}
