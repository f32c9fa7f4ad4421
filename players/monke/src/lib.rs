//! A suggester which picks purely random legal moves

use players::{SuggestError, Suggester};

use rand::{rngs::SmallRng, seq::IteratorRandom, SeedableRng};

/// A suggester which picks purely random legal moves
///
/// The name is pronounced like "Monkey"
#[derive(Debug)]
pub struct MonkePlayer {
    /// How we decide what to do
    rng: SmallRng,
}

impl MonkePlayer {
    /// Create a new player seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a player whose choices are reproducible
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Suggester for MonkePlayer {
    fn suggest(&mut self, fen: &str) -> Result<String, SuggestError> {
        let setup = board::parse(fen).map_err(|e| SuggestError::Decode(e.to_string()))?;
        rules::legal_moves(setup.side_to_move, &setup.position, setup.en_passant)
            .choose(&mut self.rng)
            .map(|mv| mv.to_string())
            .ok_or(SuggestError::NoMove)
    }
}

impl Default for MonkePlayer {
    fn default() -> Self {
        Self::new()
    }
}
