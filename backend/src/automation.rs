//! Playing the automated side's turns
//!
//! Suggestions are fetched on a worker thread so a slow service never blocks the caller for longer
//! than it chooses to wait. The worker only ever sees the encoded position; everything it sends
//! back is checked by [`Session::apply_suggestion`] before it touches the game.

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, TryRecvError},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use monke::MonkePlayer;
use players::{SuggestError, Suggester};
use tracing::{debug, info, warn};

use crate::session::{Event, Session};

/// A suggestion being worked out in the background
#[derive(Debug)]
pub struct PendingSuggestion {
    receiver: mpsc::Receiver<Result<String, SuggestError>>,
}

impl PendingSuggestion {
    /// Ask `suggester` about `fen` on a new thread
    pub fn spawn<S>(suggester: Arc<Mutex<S>>, fen: String) -> Self
    where
        S: Suggester + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let reply = suggester
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .suggest(&fen);
            // Nobody is listening any more if the caller stopped waiting
            let _ = sender.send(reply);
        });
        Self { receiver }
    }

    /// Check for a reply without blocking
    pub fn poll(&self) -> Option<Result<String, SuggestError>> {
        match self.receiver.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SuggestError::Unavailable)),
        }
    }

    /// Block until the reply arrives or `timeout` passes
    pub fn wait(self, timeout: Duration) -> Result<String, SuggestError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => Err(SuggestError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(SuggestError::Unavailable),
        }
    }
}

/// What to do once every attempt to get a usable suggestion has failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Leave the game as it is, so the turn can be asked for again
    Pass,
    /// Play a random legal move instead
    Random,
}

/// Plays turns for one side using a suggester, with retries and a fallback
pub struct Automation<S> {
    oracle: Arc<Mutex<S>>,
    fallback: MonkePlayer,
    policy: FailurePolicy,
    retries: u32,
    timeout: Duration,
}

impl<S: Suggester + Send + 'static> Automation<S> {
    pub fn new(oracle: S, policy: FailurePolicy, retries: u32, timeout: Duration) -> Self {
        Self {
            oracle: Arc::new(Mutex::new(oracle)),
            fallback: MonkePlayer::new(),
            policy,
            retries,
            timeout,
        }
    }

    /// Use a particular random player when falling back
    pub fn with_fallback(self, fallback: MonkePlayer) -> Self {
        Self { fallback, ..self }
    }

    /// Start asking for a move in `session` without waiting for the answer
    pub fn request(&self, session: &Session) -> PendingSuggestion {
        PendingSuggestion::spawn(Arc::clone(&self.oracle), session.encode())
    }

    /// Play one turn for the side to move
    ///
    /// Returns `None` if no move was made, which only happens under [`FailurePolicy::Pass`] (or if
    /// even the random fallback has nothing to play).
    pub fn play(&mut self, session: &Session) -> Option<Session> {
        for attempt in 0..=self.retries {
            let reply = self.request(session).wait(self.timeout);
            match reply {
                Ok(text) => match session.apply_suggestion(&text) {
                    (_, Event::Ignored(refusal)) => {
                        warn!(attempt, %text, %refusal, "suggested move was unusable");
                    }
                    (next, event) => {
                        debug!(attempt, ?event, "suggestion played");
                        return Some(next);
                    }
                },
                Err(error) => {
                    warn!(attempt, %error, "could not get a suggestion");
                    if !error.is_retryable() {
                        break;
                    }
                }
            }
        }
        match self.policy {
            FailurePolicy::Pass => {
                warn!("no usable suggestion, passing the turn back");
                None
            }
            FailurePolicy::Random => {
                info!("no usable suggestion, playing a random move");
                let text = self.fallback.suggest(&session.encode()).ok()?;
                match session.apply_suggestion(&text) {
                    (_, Event::Ignored(refusal)) => {
                        warn!(%text, %refusal, "random move was refused");
                        None
                    }
                    (next, _) => Some(next),
                }
            }
        }
    }
}
