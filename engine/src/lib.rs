//! UCI engine process management.
//!
//! The engine runs as a child process. Three tasks own its pipes: a stdout
//! reader that parses lines into [`EngineEvent`]s, a stdin writer, and a
//! command processor that turns [`EngineCommand`]s into UCI text.

pub mod stockfish;
pub mod uci;

pub use stockfish::{EngineConfig, StockfishEngine};
pub use uci::{parse_uci_message, UciError, UciMessage};

use std::time::Duration;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    NewGame,
    SetPosition { fen: String, moves: Vec<String> },
    SetOption { name: String, value: Option<String> },
    Go(GoParams),
    IsReady,
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
    pub infinite: bool,        // Search until "stop"
}

impl GoParams {
    pub fn depth(depth: u8) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn movetime(ms: u64) -> Self {
        Self {
            movetime: Some(ms),
            ..Default::default()
        }
    }

    /// Render as a UCI `go` line (without newline).
    pub fn to_command(&self) -> String {
        let mut go = "go".to_string();
        if let Some(depth) = self.depth {
            go.push_str(&format!(" depth {}", depth));
        }
        if let Some(movetime) = self.movetime {
            go.push_str(&format!(" movetime {}", movetime));
        }
        if self.infinite {
            go.push_str(" infinite");
        }
        if self.depth.is_none() && self.movetime.is_none() && !self.infinite {
            go.push_str(" movetime 1000");
        }
        go
    }
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine reports `bestmove (none)` / `0000`.
    BestMove(Option<String>),
    Info(EngineInfo),
    RawUciMessage {
        direction: UciMessageDirection,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciMessageDirection {
    ToEngine,
    FromEngine,
}

/// Engine analysis information
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<String>, // Principal variation, UCI move text
    pub multipv: Option<u8>,
    pub currmove: Option<String>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine executable not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine handshake failed: {0}")]
    Handshake(String),
    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Engine process closed")]
    Closed,
    #[error("Engine has no move in this position")]
    NoMove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_command_rendering() {
        assert_eq!(GoParams::depth(12).to_command(), "go depth 12");
        assert_eq!(GoParams::movetime(500).to_command(), "go movetime 500");
        assert_eq!(GoParams::default().to_command(), "go movetime 1000");
        let both = GoParams {
            depth: Some(8),
            movetime: Some(200),
            infinite: false,
        };
        assert_eq!(both.to_command(), "go depth 8 movetime 200");
    }
}
