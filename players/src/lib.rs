//! Traits for something that can suggest a move

/// Something that can be asked for a move in a position
///
/// This trait is generic over how the move is decided, so a remote engine and a local random
/// player can both stand in for the automated side.
pub trait Suggester {
    /// Suggest a move for the side to move in `fen`
    ///
    /// The reply is a move in `<file><rank><file><rank>` form (`"e7e5"`). Nothing about the reply
    /// is trusted: the caller decodes it and checks it is legal before playing it.
    fn suggest(&mut self, fen: &str) -> Result<String, SuggestError>;
}

impl<S: Suggester + ?Sized> Suggester for Box<S> {
    fn suggest(&mut self, fen: &str) -> Result<String, SuggestError> {
        (**self).suggest(fen)
    }
}

/// Why a suggester couldn't produce a move
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SuggestError {
    #[error("could not reach the suggestion service: {0}")]
    Transport(String),
    #[error("suggestion service answered with status {0}")]
    Status(u16),
    #[error("could not read the suggestion service's reply: {0}")]
    Decode(String),
    #[error("no move was suggested")]
    NoMove,
    #[error("gave up waiting for a suggestion")]
    Timeout,
    #[error("the suggester is no longer available")]
    Unavailable,
}

impl SuggestError {
    /// Whether asking again might give a different answer
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, SuggestError::Unavailable)
    }
}
