//! The provider seam: who supplies the next move for a side.

use async_trait::async_trait;
use chess::{Game, PieceColor};
use engine::EngineError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which kind of player drives a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerKind {
    #[default]
    Human,
    Engine,
    Remote,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 3] = [PlayerKind::Human, PlayerKind::Engine, PlayerKind::Remote];

    pub fn label(self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Engine => "Stockfish",
            Self::Remote => "Grok (remote)",
        }
    }

    pub fn is_automated(self) -> bool {
        !matches!(self, Self::Human)
    }

    /// Next kind in menu order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Human => Self::Engine,
            Self::Engine => Self::Remote,
            Self::Remote => Self::Human,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Human => Self::Remote,
            Self::Engine => Self::Human,
            Self::Remote => Self::Engine,
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "engine" | "stockfish" => Ok(Self::Engine),
            "remote" | "grok" | "api" => Ok(Self::Remote),
            other => Err(format!(
                "unknown player '{}' (expected human, engine or remote)",
                other
            )),
        }
    }
}

/// Everything a provider is told about the position it must answer.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub fen: String,
    pub side: PieceColor,
    /// The whitelist in UCI notation.
    pub legal_uci: Vec<String>,
    pub legal_san: Vec<String>,
    pub history_san: Vec<String>,
    /// Answers already turned down this turn.
    pub rejected: Vec<String>,
}

impl MoveRequest {
    pub fn from_game(game: &Game) -> Self {
        let board = game.position();
        let legal = game.legal_moves();
        Self {
            fen: game.to_fen(),
            side: game.side_to_move().into(),
            legal_uci: legal
                .iter()
                .map(|mv| chess::format_uci_move(board, *mv))
                .collect(),
            legal_san: legal
                .iter()
                .map(|mv| chess::format_san(board, *mv))
                .collect(),
            history_san: game.history().iter().map(|e| e.san.clone()).collect(),
            rejected: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No answer within {0:?}")]
    Timeout(Duration),
    #[error("Engine error: {0}")]
    Engine(EngineError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Empty response")]
    EmptyResponse,
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl From<EngineError> for ProviderError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Timeout(limit) => Self::Timeout(limit),
            EngineError::NotFound => Self::Unavailable(e.to_string()),
            other => Self::Engine(other),
        }
    }
}

/// A source of moves for automated sides.
///
/// Implementations return free-form text; [`crate::resolve_move`] turns it
/// into a legal move.
#[async_trait]
pub trait MoveProvider: Send {
    fn name(&self) -> &str;

    async fn propose_move(&mut self, request: &MoveRequest) -> Result<String, ProviderError>;

    /// Protocol lines exchanged since the last call, for the debug panel.
    fn drain_transcript(&mut self) -> Vec<String> {
        Vec::new()
    }

    async fn shutdown(&mut self) {}
}
