//! A suggester which asks a remote engine over HTTP

use std::time::Duration;

use players::{SuggestError, Suggester};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the hosted engine lives
pub const DEFAULT_BASE_URL: &str = "https://sengiria-chess-api.hf.space";

#[derive(Debug, Serialize)]
struct BestMoveRequest<'a> {
    fen: &'a str,
}

#[derive(Debug, Deserialize)]
struct BestMoveReply {
    #[serde(default)]
    best_move: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PingReply {
    #[serde(default)]
    status: Option<String>,
}

/// A client for an engine that answers `POST /best-move` with `{"best_move": "e7e5"}`
#[derive(Debug)]
pub struct RemoteOracle {
    agent: ureq::Agent,
    base_url: String,
}

impl RemoteOracle {
    /// Create a client for the service at `base_url`, giving up on any request after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the service is up and reports itself ready
    pub fn ping(&self) -> Result<(), SuggestError> {
        let url = format!("{}/ping", self.base_url);
        debug!(%url, "pinging suggestion service");
        let reply: PingReply = self
            .agent
            .get(&url)
            .call()
            .map_err(from_ureq)?
            .into_json()
            .map_err(|e| SuggestError::Decode(e.to_string()))?;
        match reply.status.as_deref() {
            Some("ok") => Ok(()),
            other => {
                warn!(status = ?other, "suggestion service is not ready");
                Err(SuggestError::Unavailable)
            }
        }
    }
}

impl Suggester for RemoteOracle {
    fn suggest(&mut self, fen: &str) -> Result<String, SuggestError> {
        let url = format!("{}/best-move", self.base_url);
        debug!(%url, fen, "requesting move");
        let body = self
            .agent
            .post(&url)
            .send_json(BestMoveRequest { fen })
            .map_err(from_ureq)?
            .into_string()
            .map_err(|e| SuggestError::Transport(e.to_string()))?;
        debug!(%body, "suggestion service replied");
        parse_best_move(&body)
    }
}

/// Pull the move out of a `/best-move` reply body
///
/// A missing, null, or empty `best_move` means the engine had nothing to offer.
pub fn parse_best_move(body: &str) -> Result<String, SuggestError> {
    let reply: BestMoveReply =
        serde_json::from_str(body).map_err(|e| SuggestError::Decode(e.to_string()))?;
    reply
        .best_move
        .map(|mv| mv.trim().to_string())
        .filter(|mv| !mv.is_empty())
        .ok_or(SuggestError::NoMove)
}

fn from_ureq(error: ureq::Error) -> SuggestError {
    match error {
        ureq::Error::Status(code, _) => SuggestError::Status(code),
        ureq::Error::Transport(transport) => SuggestError::Transport(transport.to_string()),
    }
}
