use std::{process::ExitCode, time::Duration};

use backend::{
    automation::{Automation, FailurePolicy},
    Backend, GameConfig,
};
use board::Side;
use clap::Parser;
use monke::MonkePlayer;
use players::Suggester;
use remote::RemoteOracle;
use terminal_ui::TerminalUi;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Play chess in the terminal, against a move-suggestion service or another person
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Base URL of the move-suggestion service
    #[arg(long, default_value = remote::DEFAULT_BASE_URL)]
    oracle_url: String,
    /// The side you play against the service
    #[arg(long, default_value = "light")]
    human: Side,
    /// Both sides are played at this terminal
    #[arg(long)]
    two_player: bool,
    /// Extra attempts when the service gives no usable move
    #[arg(long, default_value_t = 2)]
    retries: u32,
    /// What to do when the service still gives no usable move
    #[arg(long, value_enum, default_value_t = FailurePolicy::Random)]
    on_oracle_failure: FailurePolicy,
    /// Don't contact the service; the opponent plays random moves
    #[arg(long)]
    offline: bool,
    /// How long to wait for each reply from the service
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Start from this position instead of the usual one
    #[arg(long)]
    fen: Option<String>,
}

impl From<Args> for GameConfig {
    fn from(args: Args) -> Self {
        Self {
            oracle_url: args.oracle_url,
            human: args.human,
            two_player: args.two_player,
            retries: args.retries,
            on_oracle_failure: args.on_oracle_failure,
            offline: args.offline,
            timeout: Duration::from_secs(args.timeout_secs),
            start: args.fen,
        }
    }
}

fn opponent(config: &GameConfig) -> Option<Automation<Box<dyn Suggester + Send>>> {
    if config.two_player {
        return None;
    }
    let oracle: Box<dyn Suggester + Send> = if config.offline {
        info!("offline, the opponent plays random moves");
        Box::new(MonkePlayer::new())
    } else {
        let oracle = RemoteOracle::new(&config.oracle_url, config.timeout);
        match oracle.ping() {
            Ok(()) => info!(url = oracle.base_url(), "suggestion service is ready"),
            Err(e) => {
                warn!(url = oracle.base_url(), error = %e, "suggestion service did not answer")
            }
        }
        Box::new(oracle)
    };
    Some(Automation::new(
        oracle,
        config.on_oracle_failure,
        config.retries,
        config.timeout,
    ))
}

fn run(config: GameConfig) -> backend::Result<()> {
    let session = config.session()?;
    let mut backend = Backend::new(
        session,
        TerminalUi::stdio(),
        opponent(&config),
        config.human,
    );
    match backend.play_game()? {
        Some(state) => println!("{state}"),
        None => println!("Game abandoned"),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let config = GameConfig::from(Args::parse());
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
