use core::{fmt, str::FromStr};

use crate::{Position, Square};

/// A move from one square to another, written as long algebraic text (`e2e4`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("move text {0:?} is not of the form <file><rank><file><rank>")]
pub struct MoveParseError(pub String);

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.is_ascii() {
            return Err(MoveParseError(s.to_string()));
        }
        let square = |name: &str| name.parse().map_err(|_| MoveParseError(s.to_string()));
        Ok(Self {
            from: square(&s[..2])?,
            to: square(&s[2..])?,
        })
    }
}

/// Decode a reply from a move-suggestion service
///
/// Returns `None` unless the text is exactly `<file><rank><file><rank>` and something stands on
/// the origin square.
///
/// ```
/// # use board::{decode, Move, Position, Square};
/// let position = Position::initial();
/// assert_eq!(decode("e2e4", &position), Some(Move { from: Square::E2, to: Square::E4 }));
/// assert_eq!(decode("e3e4", &position), None);
/// assert_eq!(decode("e2e4q", &position), None);
/// ```
pub fn decode(text: &str, position: &Position) -> Option<Move> {
    let mv: Move = text.parse().ok()?;
    position.get(mv.from)?;
    Some(mv)
}
