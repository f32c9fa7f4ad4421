//! Input and drawing for a human playing in the terminal

use std::io::{self, BufRead, Write};

use board::{GameState, Move, PendingPromotion, PieceKind, Position, Side, Square};

/// Everything drawn for one turn
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub position: &'a Position,
    pub side_to_move: Side,
    pub selected: Option<Square>,
    /// Where the selected piece may go
    pub targets: &'a [Square],
    pub last_move: Option<Move>,
    pub state: GameState,
    pub promotion: Option<PendingPromotion>,
}

/// Something the human typed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// A square to select, or to move the selection to
    Square(Square),
    /// Both squares at once (`e2e4`)
    Move(Move),
    /// What a waiting pawn should become
    Promote(PieceKind),
    Quit,
}

/// An input for a human typing in the terminal
pub struct TerminalUi<R, W> {
    input: R,
    output: W,
}

impl TerminalUi<io::StdinLock<'static>, io::Stdout> {
    /// A terminal reading from stdin and drawing to stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalUi<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Draw the board, far rank at the top
    ///
    /// The selected piece is bracketed, and the squares it may move to are starred (or put in
    /// parentheses if something would be captured there).
    pub fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        for row in 0..8 {
            write!(out, "{} ", 8 - row)?;
            for col in 0..8 {
                let square = Square::new(row, col);
                let letter = frame
                    .position
                    .get(square)
                    .map_or('.', |piece| piece.fen_letter());
                let (open, close) = if frame.selected == Some(square) {
                    ('[', ']')
                } else if frame.targets.contains(&square) {
                    if letter == '.' {
                        (' ', ' ')
                    } else {
                        ('(', ')')
                    }
                } else {
                    (' ', ' ')
                };
                let letter = if letter == '.' && frame.targets.contains(&square) {
                    '*'
                } else {
                    letter
                };
                write!(out, "{open}{letter}{close}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "   a  b  c  d  e  f  g  h")?;
        if let Some(mv) = frame.last_move {
            writeln!(out, "Last move: {mv}")?;
        }
        match frame.state {
            GameState::InProgress => writeln!(out, "{} to move", frame.side_to_move)?,
            state @ GameState::Check(_) => {
                writeln!(out, "{state}, {} to move", frame.side_to_move)?
            }
            state => writeln!(out, "Game over: {state}")?,
        }
        if let Some(pending) = frame.promotion {
            writeln!(
                out,
                "The {} pawn on {} promotes: choose queen, rook, bishop, or knight",
                pending.side, pending.square
            )?;
        }
        out.flush()
    }

    /// Tell the human something
    pub fn notify(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()
    }

    /// Ask a yes-or-no question, where an empty answer means yes and end of input means no
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Ok(false);
        }
        Ok(matches!(
            buffer.trim().to_ascii_lowercase().as_str(),
            "" | "y" | "yes"
        ))
    }

    /// Give back the output, for inspecting what was drawn
    pub fn into_output(self) -> W {
        self.output
    }

    /// Prompt until something sensible is typed
    ///
    /// Reaching the end of input counts as quitting.
    pub fn read_command(&mut self) -> io::Result<Command> {
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let mut buffer = String::new();
            if self.input.read_line(&mut buffer)? == 0 {
                return Ok(Command::Quit);
            }
            match parse_command(&buffer) {
                Some(command) => return Ok(command),
                None if buffer.trim().is_empty() => continue,
                None => writeln!(
                    self.output,
                    "Type a square (e2), a move (e2e4), a piece to promote to, or quit"
                )?,
            }
        }
    }
}

/// Read one line of input
fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "" => None,
        "quit" | "exit" => Some(Command::Quit),
        _ => line
            .parse()
            .map(Command::Square)
            .or_else(|_| line.parse().map(Command::Move))
            .ok()
            .or_else(|| {
                line.parse::<PieceKind>()
                    .ok()
                    .filter(|kind| kind.is_promotable())
                    .map(Command::Promote)
            }),
    }
}
