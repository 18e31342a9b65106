//! ChessTTY: play chess in the terminal against a human, Stockfish, or a
//! remote chat model.
//!
//! Settings come from environment variables (see [`config`]) and are
//! overridden by the flags below. Logs go to a daily rolling file so they
//! never disturb the terminal UI.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use players::PlayerKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod config;
mod ui;

use ui::LaunchOptions;

/// Command-line arguments for ChessTTY.
#[derive(Parser, Debug)]
#[command(name = "chesstty", about = "Terminal chess against humans, engines and models")]
struct Cli {
    /// Who plays White: human, engine or remote.
    #[arg(long, default_value = "human")]
    white: PlayerKind,

    /// Who plays Black: human, engine or remote.
    #[arg(long, default_value = "engine")]
    black: PlayerKind,

    /// Start from this FEN instead of the standard position.
    #[arg(long)]
    fen: Option<String>,

    /// Engine skill level (0-20).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=20))]
    skill: u8,

    /// Maximum engine search depth.
    #[arg(long)]
    depth: Option<u8>,

    /// Fixed engine think time per move in milliseconds; replaces the depth limit.
    #[arg(long)]
    movetime_ms: Option<u64>,

    /// Path to the Stockfish binary.
    #[arg(long)]
    engine_path: Option<PathBuf>,

    /// Engine answer timeout in milliseconds.
    #[arg(long)]
    engine_timeout_ms: Option<u64>,

    /// Chat model used by the remote player.
    #[arg(long)]
    remote_model: Option<String>,

    /// Provider attempts per turn before a random legal move is played.
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Skip the setup menu and start playing right away.
    #[arg(long)]
    no_menu: bool,
}

impl Cli {
    fn into_launch_options(self) -> LaunchOptions {
        let mut providers = config::provider_config_from_env();
        if let Some(path) = self.engine_path {
            providers.engine.path = Some(path);
        }
        if let Some(depth) = self.depth {
            providers.engine.max_depth = depth;
        }
        if let Some(ms) = self.movetime_ms {
            providers.engine.movetime_ms = Some(ms);
        }
        if let Some(ms) = self.engine_timeout_ms {
            providers.engine.timeout = Duration::from_millis(ms);
        }
        if let Some(model) = self.remote_model {
            providers.remote.model = model;
        }
        if let Some(attempts) = self.max_attempts {
            providers.max_attempts = attempts;
        }
        providers.engine.skill_level = self.skill;

        LaunchOptions {
            white: self.white,
            black: self.black,
            skill_level: self.skill,
            start_fen: self.fen,
            providers,
            data_dir: config::get_data_dir(),
            skip_menu: self.no_menu,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(fen) = &cli.fen {
        chess::Game::from_fen(fen)
            .map_err(|e| anyhow::anyhow!("invalid --fen {:?}: {}", fen, e))?;
    }

    let log_dir = config::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "chesstty");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("ChessTTY starting up");
    let options = cli.into_launch_options();
    tracing::info!(
        "White: {}, Black: {}, skill {}",
        options.white,
        options.black,
        options.skill_level
    );

    ui::run_app(options).await?;

    tracing::info!("ChessTTY shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["chesstty"]).unwrap();
        assert_eq!(cli.white, PlayerKind::Human);
        assert_eq!(cli.black, PlayerKind::Engine);
        assert_eq!(cli.skill, 10);
        assert!(!cli.no_menu);
    }

    #[test]
    fn test_cli_overrides_reach_provider_config() {
        let cli = Cli::try_parse_from([
            "chesstty",
            "--white",
            "remote",
            "--black",
            "stockfish",
            "--skill",
            "3",
            "--depth",
            "6",
            "--engine-timeout-ms",
            "2500",
            "--max-attempts",
            "5",
            "--no-menu",
        ])
        .unwrap();
        let options = cli.into_launch_options();
        assert_eq!(options.white, PlayerKind::Remote);
        assert_eq!(options.black, PlayerKind::Engine);
        assert_eq!(options.providers.engine.skill_level, 3);
        assert_eq!(options.providers.engine.max_depth, 6);
        assert_eq!(options.providers.engine.timeout, Duration::from_millis(2500));
        assert_eq!(options.providers.max_attempts, 5);
        assert!(options.skip_menu);
    }

    #[test]
    fn test_cli_movetime_replaces_depth_limit() {
        let cli =
            Cli::try_parse_from(["chesstty", "--depth", "6", "--movetime-ms", "400"]).unwrap();
        let options = cli.into_launch_options();
        assert_eq!(options.providers.engine.movetime_ms, Some(400));
        assert_eq!(
            options.providers.engine.go_params().to_command(),
            "go movetime 400"
        );
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["chesstty", "--skill", "21"]).is_err());
        assert!(Cli::try_parse_from(["chesstty", "--white", "robot"]).is_err());
    }
}
