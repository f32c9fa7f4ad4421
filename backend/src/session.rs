//! The state of a game between moves, and every way a turn can advance it
//!
//! A [`Session`] is never changed in place. Each transition hands back the next session together
//! with an [`Event`] saying what happened; refused inputs give back an identical session.

use board::{
    decode, encode_with_counters, GameState, Move, PendingPromotion, Piece, PieceKind, Position,
    Setup, Side, Square,
};
use rules::{apply_move, game_state, is_legal_move, resolve_promotion, LegalityOptions};
use tracing::{debug, info};

/// A game in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    position: Position,
    side_to_move: Side,
    en_passant: Option<Square>,
    pending_promotion: Option<PendingPromotion>,
    selection: Option<Piece>,
    last_move: Option<Move>,
    state: GameState,
    fullmove: u32,
}

/// What a transition did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Selected(Square),
    Deselected,
    Moved(Move),
    /// The move was made, but the pawn must be promoted before the turn ends
    AwaitingPromotion(PendingPromotion),
    Promoted(PieceKind),
    Ignored(Refusal),
}

/// Why an input was not acted on
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Refusal {
    #[error("the game is over")]
    GameOver,
    #[error("a pawn is waiting to be promoted")]
    PromotionPending,
    #[error("there is no piece of the side to move there")]
    NotYourPiece,
    #[error("no pawn is waiting to be promoted")]
    NoPromotionPending,
    #[error("a pawn can't become that")]
    NotPromotable,
    #[error("the move could not be read")]
    Undecodable,
    #[error("that move is not legal")]
    IllegalMove,
}

impl Session {
    /// A new game from the usual starting position
    pub fn new() -> Self {
        Self::from_setup(Setup {
            position: Position::initial(),
            side_to_move: Side::Light,
            en_passant: None,
            fullmove: 1,
        })
    }

    /// A game continuing from an arbitrary position
    pub fn from_setup(setup: Setup) -> Self {
        Self {
            position: setup.position,
            side_to_move: setup.side_to_move,
            en_passant: setup.en_passant,
            pending_promotion: None,
            selection: None,
            last_move: None,
            state: game_state(&setup.position, setup.side_to_move, setup.en_passant),
            fullmove: setup.fullmove,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn selection(&self) -> Option<Piece> {
        self.selection
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn fullmove(&self) -> u32 {
        self.fullmove
    }

    /// The position as FEN, for sending to a move-suggestion service
    pub fn encode(&self) -> String {
        encode_with_counters(
            &self.position,
            self.side_to_move,
            self.en_passant,
            0,
            self.fullmove,
        )
    }

    /// Where the selected piece may move, for highlighting
    pub fn legal_targets(&self) -> Vec<Square> {
        self.selection
            .map(|piece| rules::legal_targets(&self.position, piece, self.en_passant).collect())
            .unwrap_or_default()
    }

    fn options(&self) -> LegalityOptions {
        LegalityOptions::with_en_passant(self.en_passant)
    }

    fn refuse(&self, refusal: Refusal) -> (Self, Event) {
        debug!(%refusal, "input ignored");
        (*self, Event::Ignored(refusal))
    }

    /// Something checked before any input is acted on
    fn accepting_input(&self) -> Option<Refusal> {
        if self.state.is_terminal() {
            Some(Refusal::GameOver)
        } else if self.pending_promotion.is_some() {
            Some(Refusal::PromotionPending)
        } else {
            None
        }
    }

    /// React to the player picking a square
    ///
    /// With nothing selected, picking one of the mover's pieces selects it. With a piece selected,
    /// picking another of the mover's pieces selects that one instead, picking the selected piece
    /// or a square it can't reach drops the selection, and picking a legal target makes the move.
    pub fn select_or_move(&self, square: Square) -> (Self, Event) {
        if let Some(refusal) = self.accepting_input() {
            return self.refuse(refusal);
        }
        let own = self
            .position
            .get(square)
            .filter(|piece| piece.side == self.side_to_move);
        match (self.selection, own) {
            (Some(selected), _) if selected.square == square => (
                Self {
                    selection: None,
                    ..*self
                },
                Event::Deselected,
            ),
            (_, Some(piece)) => {
                debug!(%square, kind = %piece.kind, "selected");
                (
                    Self {
                        selection: Some(piece),
                        ..*self
                    },
                    Event::Selected(square),
                )
            }
            (None, None) => self.refuse(Refusal::NotYourPiece),
            (Some(selected), None) => {
                if is_legal_move(&self.position, selected, square, self.options()) {
                    self.commit(selected, square)
                } else {
                    debug!(from = %selected.square, to = %square, "not a legal target");
                    (
                        Self {
                            selection: None,
                            ..*self
                        },
                        Event::Deselected,
                    )
                }
            }
        }
    }

    /// Finish a promotion by choosing what the pawn becomes
    pub fn choose_promotion(&self, kind: PieceKind) -> (Self, Event) {
        if self.state.is_terminal() {
            return self.refuse(Refusal::GameOver);
        }
        let Some(pending) = self.pending_promotion else {
            return self.refuse(Refusal::NoPromotionPending);
        };
        let Some(position) = resolve_promotion(&self.position, pending, kind) else {
            return self.refuse(Refusal::NotPromotable);
        };
        info!(square = %pending.square, %kind, "pawn promoted");
        let next = Self {
            position,
            pending_promotion: None,
            ..*self
        };
        (next.end_turn(), Event::Promoted(kind))
    }

    /// Play a move suggested in `<file><rank><file><rank>` form
    ///
    /// The suggestion gets no more trust than a click: it must name a piece of the side to move
    /// and a legal target. A pawn reaching the far rank this way becomes a queen.
    pub fn apply_suggestion(&self, text: &str) -> (Self, Event) {
        if let Some(refusal) = self.accepting_input() {
            return self.refuse(refusal);
        }
        let Some(mv) = decode(text, &self.position) else {
            return self.refuse(Refusal::Undecodable);
        };
        let Some(piece) = self
            .position
            .get(mv.from)
            .filter(|piece| piece.side == self.side_to_move)
        else {
            return self.refuse(Refusal::NotYourPiece);
        };
        if !is_legal_move(&self.position, piece, mv.to, self.options()) {
            return self.refuse(Refusal::IllegalMove);
        }
        match self.commit(piece, mv.to) {
            (next, Event::AwaitingPromotion(_)) => {
                let (promoted, _) = next.choose_promotion(PieceKind::Queen);
                (promoted, Event::Moved(mv))
            }
            committed => committed,
        }
    }

    /// Apply a move already known to be legal
    fn commit(&self, piece: Piece, to: Square) -> (Self, Event) {
        let mv = Move {
            from: piece.square,
            to,
        };
        let applied = apply_move(&self.position, piece, to, self.en_passant);
        if let Some(captured) = applied.captured {
            debug!(kind = %captured.kind, side = %captured.side, "captured");
        }
        let next = Self {
            position: applied.position,
            en_passant: applied.en_passant,
            selection: None,
            last_move: Some(mv),
            pending_promotion: applied.promotion,
            ..*self
        };
        info!(side = %self.side_to_move, %mv, "move played");
        match applied.promotion {
            Some(pending) => (next, Event::AwaitingPromotion(pending)),
            None => (next.end_turn(), Event::Moved(mv)),
        }
    }

    /// Hand the move to the other side and see where that leaves the game
    fn end_turn(self) -> Self {
        let side_to_move = self.side_to_move.other();
        let fullmove = match self.side_to_move {
            Side::Dark => self.fullmove.saturating_add(1),
            Side::Light => self.fullmove,
        };
        let state = game_state(&self.position, side_to_move, self.en_passant);
        if state.is_terminal() {
            info!(%state, "game over");
        } else {
            debug!(%state, "turn passed");
        }
        Self {
            side_to_move,
            fullmove,
            state,
            ..self
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use board::parse;

    fn play(session: Session, moves: &[&str]) -> Session {
        moves.iter().fold(session, |session, text| {
            let (next, event) = session.apply_suggestion(text);
            assert!(matches!(event, Event::Moved(_)), "{text}: {event:?}");
            next
        })
    }

    fn click(session: &Session, square: Square) -> (Session, Event) {
        session.select_or_move(square)
    }

    #[test]
    fn test_select_then_move() {
        let session = Session::new();
        let (selected, event) = click(&session, Square::E2);
        assert_eq!(event, Event::Selected(Square::E2));
        assert_eq!(selected.legal_targets(), vec![Square::E4, Square::E3]);

        let (moved, event) = click(&selected, Square::E4);
        let mv = Move {
            from: Square::E2,
            to: Square::E4,
        };
        assert_eq!(event, Event::Moved(mv));
        assert_eq!(moved.side_to_move(), Side::Dark);
        assert_eq!(moved.en_passant(), Some(Square::E3));
        assert_eq!(moved.last_move(), Some(mv));
        assert_eq!(moved.selection(), None);
        assert_eq!(moved.fullmove(), 1);
        assert_eq!(
            moved.encode(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_opponent_piece_not_selectable() {
        let session = Session::new();
        let (next, event) = click(&session, Square::E7);
        assert_eq!(event, Event::Ignored(Refusal::NotYourPiece));
        assert_eq!(next, session);
        let (_, event) = click(&session, Square::E4);
        assert_eq!(event, Event::Ignored(Refusal::NotYourPiece));
    }

    #[test]
    fn test_illegal_target_deselects() {
        let (selected, _) = click(&Session::new(), Square::E2);
        let (next, event) = click(&selected, Square::E5);
        assert_eq!(event, Event::Deselected);
        assert_eq!(next.selection(), None);
        assert_eq!(next.position(), &Position::initial());
        assert_eq!(next.side_to_move(), Side::Light);
    }

    #[test]
    fn test_reselect_and_toggle() {
        let (selected, _) = click(&Session::new(), Square::E2);
        let (reselected, event) = click(&selected, Square::G1);
        assert_eq!(event, Event::Selected(Square::G1));
        assert_eq!(reselected.selection().map(|piece| piece.kind), Some(PieceKind::Knight));
        let (dropped, event) = click(&reselected, Square::G1);
        assert_eq!(event, Event::Deselected);
        assert_eq!(dropped.selection(), None);
    }

    #[test]
    fn test_fullmove_counts_after_dark() {
        let session = play(Session::new(), &["e2e4", "e7e5", "g1f3"]);
        assert_eq!(session.fullmove(), 2);
        assert_eq!(session.side_to_move(), Side::Dark);
        assert!(session.encode().ends_with(" b KQkq - 0 2"));
    }

    #[test]
    fn test_fullmove_saturates() {
        let setup = parse("4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295").unwrap();
        let (session, event) = Session::from_setup(setup).apply_suggestion("e8d8");
        assert!(matches!(event, Event::Moved(_)));
        assert_eq!(session.fullmove(), u32::MAX);
        assert_eq!(session.side_to_move(), Side::Light);
    }

    #[test]
    fn test_fools_mate_ends_game() {
        let session = play(Session::new(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(session.state(), GameState::Checkmate(Side::Dark));
        let (after, event) = click(&session, Square::E1);
        assert_eq!(event, Event::Ignored(Refusal::GameOver));
        assert_eq!(after, session);
        assert_eq!(
            session.apply_suggestion("a2a3").1,
            Event::Ignored(Refusal::GameOver)
        );
    }

    #[test]
    fn test_check_reported() {
        let session = play(Session::new(), &["e2e4", "f7f6", "d2d4", "g7g5"]);
        let (checked, _) = session.apply_suggestion("d1h5");
        assert_eq!(checked.state(), GameState::Checkmate(Side::Light));

        let session = play(Session::new(), &["e2e4", "f7f5", "d1h5"]);
        assert_eq!(session.state(), GameState::Check(Side::Dark));
    }

    #[test]
    fn test_promotion_waits_for_choice() {
        let setup = parse("4k3/1P6/8/8/8/8/8/4K3 w - - 0 40").unwrap();
        let session = Session::from_setup(setup);
        let (selected, _) = click(&session, Square::B7);
        let (waiting, event) = click(&selected, Square::B8);
        let pending = PendingPromotion {
            square: Square::B8,
            side: Side::Light,
        };
        assert_eq!(event, Event::AwaitingPromotion(pending));
        assert_eq!(waiting.side_to_move(), Side::Light);
        assert_eq!(waiting.pending_promotion(), Some(pending));

        assert_eq!(
            click(&waiting, Square::E1).1,
            Event::Ignored(Refusal::PromotionPending)
        );
        assert_eq!(
            waiting.choose_promotion(PieceKind::King).1,
            Event::Ignored(Refusal::NotPromotable)
        );

        let (promoted, event) = waiting.choose_promotion(PieceKind::Rook);
        assert_eq!(event, Event::Promoted(PieceKind::Rook));
        assert_eq!(promoted.side_to_move(), Side::Dark);
        assert_eq!(promoted.pending_promotion(), None);
        assert!(promoted
            .position()
            .get(Square::B8)
            .is_some_and(|piece| piece.is(PieceKind::Rook, Side::Light)));
        assert_eq!(promoted.state(), GameState::Check(Side::Dark));
    }

    #[test]
    fn test_promotion_without_pawn_refused() {
        assert_eq!(
            Session::new().choose_promotion(PieceKind::Queen).1,
            Event::Ignored(Refusal::NoPromotionPending)
        );
    }

    #[test]
    fn test_suggested_promotion_becomes_queen() {
        let setup = parse("8/8/8/8/8/8/p7/4K2k b - - 0 50").unwrap();
        let session = Session::from_setup(setup);
        let (next, event) = session.apply_suggestion("a2a1");
        assert_eq!(
            event,
            Event::Moved(Move {
                from: Square::A2,
                to: Square::A1
            })
        );
        assert!(next
            .position()
            .get(Square::A1)
            .is_some_and(|piece| piece.is(PieceKind::Queen, Side::Dark)));
        assert_eq!(next.side_to_move(), Side::Light);
        assert_eq!(next.state(), GameState::Check(Side::Light));
        assert_eq!(next.fullmove(), 51);
    }

    #[test]
    fn test_bad_suggestions_refused() {
        let session = Session::new();
        for (text, refusal) in [
            ("e2e5", Refusal::IllegalMove),
            ("e7e5", Refusal::NotYourPiece),
            ("e3e4", Refusal::Undecodable),
            ("e2-e4", Refusal::Undecodable),
            ("", Refusal::Undecodable),
        ] {
            let (next, event) = session.apply_suggestion(text);
            assert_eq!(event, Event::Ignored(refusal), "{text}");
            assert_eq!(next, session);
        }
    }

    #[test]
    fn test_castling_by_clicks() {
        let setup = parse("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let session = Session::from_setup(setup);
        let (selected, _) = click(&session, Square::E1);
        assert!(selected.legal_targets().contains(&Square::G1));
        let (castled, event) = click(&selected, Square::G1);
        assert!(matches!(event, Event::Moved(_)));
        assert!(castled
            .position()
            .get(Square::F1)
            .is_some_and(|piece| piece.is(PieceKind::Rook, Side::Light)));
        assert!(castled.encode().contains(" b kq "));
    }

    #[test]
    fn test_en_passant_in_play() {
        let session = play(Session::new(), &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(session.en_passant(), Some(Square::D6));
        let taken = play(session, &["e5d6"]);
        assert_eq!(taken.position().get(Square::D5), None);
        assert_eq!(taken.en_passant(), None);
    }
}
