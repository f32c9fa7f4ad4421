//! Runs a game between a human at the terminal and either another human or a move-suggestion
//! service

use std::{
    io::{self, BufRead, Write},
    time::Duration,
};

use board::{FenError, GameState, Side};
use players::Suggester;
use terminal_ui::{Command, Frame, TerminalUi};
use tracing::{info, warn};

pub mod automation;
pub mod session;

use crate::{
    automation::{Automation, FailurePolicy},
    session::{Event, Session},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid starting position: {0}")]
    Fen(#[from] FenError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// How a game should be set up, as chosen on the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub oracle_url: String,
    /// The side the human plays when the other side is automated
    pub human: Side,
    /// Both sides typed in at the terminal
    pub two_player: bool,
    /// Extra attempts after an unusable suggestion
    pub retries: u32,
    pub on_oracle_failure: FailurePolicy,
    /// Never contact the service, and play random moves instead
    pub offline: bool,
    pub timeout: Duration,
    /// FEN of the starting position
    pub start: Option<String>,
}

impl GameConfig {
    /// The session this configuration starts from
    pub fn session(&self) -> Result<Session> {
        match &self.start {
            Some(fen) => Ok(Session::from_setup(board::parse(fen)?)),
            None => Ok(Session::new()),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            oracle_url: remote::DEFAULT_BASE_URL.to_string(),
            human: Side::Light,
            two_player: false,
            retries: 2,
            on_oracle_failure: FailurePolicy::Random,
            offline: false,
            timeout: Duration::from_secs(10),
            start: None,
        }
    }
}

/// What happened after one step of the game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The automated side failed to move and the human chose to stop
    Quit,
}

/// A driver which asks whoever's turn it is for input until the game is done
pub struct Backend<R, W, S> {
    session: Session,
    ui: TerminalUi<R, W>,
    /// Plays the side the human doesn't, if any
    automation: Option<Automation<S>>,
    human: Side,
}

impl<R: BufRead, W: Write, S: Suggester + Send + 'static> Backend<R, W, S> {
    pub fn new(
        session: Session,
        ui: TerminalUi<R, W>,
        automation: Option<Automation<S>>,
        human: Side,
    ) -> Self {
        Self {
            session,
            ui,
            automation,
            human,
        }
    }

    /// Get the state of the game right now
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn is_automated_turn(&self) -> bool {
        self.automation.is_some() && self.session.side_to_move() != self.human
    }

    fn render(&mut self) -> io::Result<()> {
        let targets = self.session.legal_targets();
        let frame = Frame {
            position: self.session.position(),
            side_to_move: self.session.side_to_move(),
            selected: self.session.selection().map(|piece| piece.square),
            targets: &targets,
            last_move: self.session.last_move(),
            state: self.session.state(),
            promotion: self.session.pending_promotion(),
        };
        self.ui.render(&frame)
    }

    /// Let whoever is to move act once
    ///
    /// For the human that is one command: a click, a whole move, or a promotion choice. The
    /// automated side plays its whole turn.
    pub fn play_half_move(&mut self) -> Result<Flow> {
        if self.is_automated_turn() {
            return self.play_automated();
        }
        self.render()?;
        let events = match self.ui.read_command()? {
            Command::Quit => return Ok(Flow::Quit),
            Command::Square(square) => vec![self.apply(|session| session.select_or_move(square))],
            Command::Move(mv) => {
                // Clicking the selected piece again would drop it
                let picked = if self.session.selection().is_some_and(|p| p.square == mv.from) {
                    Event::Selected(mv.from)
                } else {
                    self.apply(|session| session.select_or_move(mv.from))
                };
                if matches!(picked, Event::Selected(_)) {
                    vec![picked, self.apply(|session| session.select_or_move(mv.to))]
                } else {
                    vec![picked]
                }
            }
            Command::Promote(kind) => vec![self.apply(|session| session.choose_promotion(kind))],
        };
        for event in events {
            match event {
                Event::Ignored(refusal) => self.ui.notify(format!("Ignored: {refusal}"))?,
                Event::Deselected => self.ui.notify("Selection cleared")?,
                _ => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn apply(&mut self, transition: impl FnOnce(&Session) -> (Session, Event)) -> Event {
        let (next, event) = transition(&self.session);
        self.session = next;
        event
    }

    fn play_automated(&mut self) -> Result<Flow> {
        let Some(automation) = self.automation.as_mut() else {
            return Ok(Flow::Continue);
        };
        self.ui
            .notify(format!("Waiting for {}'s move...", self.session.side_to_move()))?;
        if let Some(next) = automation.play(&self.session) {
            self.session = next;
            if let Some(mv) = self.session.last_move() {
                self.ui.notify(format!("Opponent made move: {mv}"))?;
            }
            return Ok(Flow::Continue);
        }
        warn!("automated side did not move");
        if self
            .ui
            .confirm("The engine did not move. Ask it again? [Y/n]")?
        {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Quit)
        }
    }

    /// Play the game until it ends
    ///
    /// Returns the final state, or `None` if the game was abandoned.
    pub fn play_game(&mut self) -> Result<Option<GameState>> {
        while !self.session.state().is_terminal() {
            if self.play_half_move()? == Flow::Quit {
                info!("game abandoned");
                return Ok(None);
            }
        }
        self.render()?;
        info!(state = %self.session.state(), "game finished");
        Ok(Some(self.session.state()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use board::{PieceKind, Square};
    use monke::MonkePlayer;
    use players::SuggestError;

    /// Never answers usefully
    struct Silent;

    impl Suggester for Silent {
        fn suggest(&mut self, _fen: &str) -> Result<String, SuggestError> {
            Err(SuggestError::NoMove)
        }
    }

    /// Replies with each move in turn
    struct Replay(std::vec::IntoIter<&'static str>);

    impl Suggester for Replay {
        fn suggest(&mut self, _fen: &str) -> Result<String, SuggestError> {
            self.0
                .next()
                .map(str::to_string)
                .ok_or(SuggestError::NoMove)
        }
    }

    type TestUi = TerminalUi<Cursor<Vec<u8>>, Vec<u8>>;

    fn ui(input: &str) -> TestUi {
        TerminalUi::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_two_players_reach_fools_mate() {
        let input = "f2f3\ne7e5\ng2\ng4\nd8h4\n";
        let mut backend: Backend<_, _, Silent> =
            Backend::new(Session::new(), ui(input), None, Side::Light);
        let state = backend.play_game().unwrap();
        assert_eq!(state, Some(GameState::Checkmate(Side::Dark)));
        assert_eq!(backend.session().fullmove(), 3);
    }

    #[test]
    fn test_human_against_replayed_engine() {
        let engine = Replay(vec!["e7e5", "d8h4"].into_iter());
        let automation = Automation::new(engine, FailurePolicy::Pass, 0, Duration::from_secs(5));
        let mut backend = Backend::new(
            Session::new(),
            ui("f2f3\ng2g4\n"),
            Some(automation),
            Side::Light,
        );
        let state = backend.play_game().unwrap();
        assert_eq!(state, Some(GameState::Checkmate(Side::Dark)));
    }

    #[test]
    fn test_typed_move_after_selecting_same_piece() {
        let mut backend: Backend<_, _, Silent> =
            Backend::new(Session::new(), ui("e2\ne2e4\n"), None, Side::Light);
        backend.play_half_move().unwrap();
        assert_eq!(backend.session().selection().map(|piece| piece.square), Some(Square::E2));
        backend.play_half_move().unwrap();
        assert_eq!(backend.session().side_to_move(), Side::Dark);
        assert!(backend.session().position().get(Square::E4).is_some());
        let shown = String::from_utf8(backend.ui.into_output()).unwrap();
        assert!(!shown.contains("Selection cleared"));
    }

    #[test]
    fn test_quit_at_end_of_input() {
        let mut backend: Backend<_, _, Silent> =
            Backend::new(Session::new(), ui("e2e4\n"), None, Side::Light);
        assert_eq!(backend.play_game().unwrap(), None);
        assert_eq!(backend.session().side_to_move(), Side::Dark);
    }

    #[test]
    fn test_refusals_reported() {
        let mut backend: Backend<_, _, Silent> =
            Backend::new(Session::new(), ui("e7\nqueen\n"), None, Side::Light);
        assert_eq!(backend.play_half_move().unwrap(), Flow::Continue);
        assert_eq!(backend.play_half_move().unwrap(), Flow::Continue);
        let shown = String::from_utf8(backend.ui.into_output()).unwrap();
        assert!(shown.contains("Ignored: there is no piece of the side to move there"));
        assert!(shown.contains("Ignored: no pawn is waiting to be promoted"));
    }

    #[test]
    fn test_promotion_typed_in() {
        let setup = board::parse("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut backend: Backend<_, _, Silent> = Backend::new(
            Session::from_setup(setup),
            ui("b7b8\nknight\n"),
            None,
            Side::Light,
        );
        backend.play_half_move().unwrap();
        assert!(backend.session().pending_promotion().is_some());
        backend.play_half_move().unwrap();
        let promoted = backend.session().position().get(Square::B8).unwrap();
        assert!(promoted.is(PieceKind::Knight, Side::Light));
        assert_eq!(backend.session().side_to_move(), Side::Dark);
    }

    #[test]
    fn test_failed_engine_with_pass_asks_human() {
        let automation = Automation::new(Silent, FailurePolicy::Pass, 1, Duration::from_secs(5));
        let mut backend = Backend::new(Session::new(), ui("n\n"), Some(automation), Side::Dark);
        assert_eq!(backend.play_half_move().unwrap(), Flow::Quit);
        assert_eq!(backend.session(), &Session::new());
    }

    #[test]
    fn test_failed_engine_with_random_still_moves() {
        let automation = Automation::new(Silent, FailurePolicy::Random, 0, Duration::from_secs(5))
            .with_fallback(MonkePlayer::seeded(11));
        let mut backend = Backend::new(Session::new(), ui(""), Some(automation), Side::Dark);
        assert_eq!(backend.play_half_move().unwrap(), Flow::Continue);
        assert_eq!(backend.session().side_to_move(), Side::Dark);
    }

    #[test]
    fn test_config_starting_position() {
        let config = GameConfig {
            start: Some("4k3/8/8/8/8/8/8/4K3 b - - 0 9".to_string()),
            ..GameConfig::default()
        };
        let session = config.session().unwrap();
        assert_eq!(session.side_to_move(), Side::Dark);
        assert_eq!(session.fullmove(), 9);

        let broken = GameConfig {
            start: Some("not/a/position".to_string()),
            ..GameConfig::default()
        };
        assert!(matches!(broken.session(), Err(Error::Fen(_))));
    }
}
