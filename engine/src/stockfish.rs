use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineError, EngineEvent, EngineInfo, GoParams, UciMessageDirection};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_GRACE: Duration = Duration::from_millis(500);
const TRAFFIC_LIMIT: usize = 500;

pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    last_info: Option<EngineInfo>,
    traffic: VecDeque<(UciMessageDirection, String)>,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit executable; searched for when `None`.
    pub path: Option<PathBuf>,
    pub skill_level: Option<u8>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance and complete the UCI handshake.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, EngineError> {
        tracing::info!("Starting engine spawn (config: {:?})", config);
        let path = match &config.path {
            Some(path) => path.clone(),
            None => find_stockfish_path().ok_or(EngineError::NotFound)?,
        };
        tracing::info!("Using engine at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::NotFound
                } else {
                    EngineError::Spawn(e)
                }
            })?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Handshake("engine has no stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Handshake("engine has no stdout".to_string()))?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(256);

        // Output reader task
        let event_tx_reader = event_tx.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Engine stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::trace!("UCI << {}", trimmed);

                        let raw = EngineEvent::RawUciMessage {
                            direction: UciMessageDirection::FromEngine,
                            message: trimmed.to_string(),
                        };
                        if event_tx_reader.send(raw).await.is_err() {
                            break;
                        }

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::info!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(other) => {
                                tracing::trace!("Ignoring UCI message: {:?}", other);
                                continue;
                            }
                            Err(e) => {
                                tracing::trace!("Unparsed engine output: {}", e);
                                continue;
                            }
                        };

                        if event_tx_reader.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Output reader task exiting");
        });

        // Stdin writer task
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);
        let event_tx_writer = event_tx.clone();
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                let trimmed = cmd.trim();
                tracing::trace!("UCI >> {}", trimmed);

                let _ = event_tx_writer
                    .send(EngineEvent::RawUciMessage {
                        direction: UciMessageDirection::ToEngine,
                        message: trimmed.to_string(),
                    })
                    .await;

                if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                    break;
                }
            }
            tracing::info!("Stdin writer task exiting");
        });

        // Command processor task
        let stdin_tx_commands = stdin_tx.clone();
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                tracing::debug!("Processing engine command: {:?}", cmd);
                let quit = matches!(cmd, EngineCommand::Quit);
                let line = format_command(&cmd);
                if stdin_tx_commands.send(line).await.is_err() {
                    tracing::error!("Stdin channel closed");
                    break;
                }
                if quit {
                    break;
                }
            }
            tracing::info!("Command processor task exiting");
        });

        let mut engine = Self {
            process,
            command_tx,
            event_rx,
            last_info: None,
            traffic: VecDeque::new(),
        };

        tracing::debug!("Sending 'uci' command");
        stdin_tx
            .send("uci\n".to_string())
            .await
            .map_err(|_| EngineError::Closed)?;
        engine.wait_ready(HANDSHAKE_TIMEOUT).await.map_err(|e| {
            tracing::error!("Engine initialization failed: {}", e);
            EngineError::Handshake(e.to_string())
        })?;

        if let Some(level) = config.skill_level {
            let level = level.min(20);
            tracing::info!("Setting skill level to {}", level);
            engine.set_option("Skill Level", level).await?;
        }
        if let Some(threads) = config.threads {
            engine.set_option("Threads", threads.clamp(1, 16)).await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            engine.set_option("Hash", hash_mb.clamp(1, 2048)).await?;
        }

        engine.send_command(EngineCommand::NewGame).await?;
        engine.sync().await?;
        tracing::info!("Engine spawned and initialized successfully");
        Ok(engine)
    }

    async fn set_option(&self, name: &str, value: impl ToString) -> Result<(), EngineError> {
        self.send_command(EngineCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        })
        .await
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// `isready` round trip. Everything the engine printed before `readyok`
    /// belongs to an earlier request and is discarded.
    pub async fn sync(&mut self) -> Result<(), EngineError> {
        self.send_command(EngineCommand::IsReady).await?;
        self.wait_ready(HANDSHAKE_TIMEOUT).await
    }

    async fn wait_ready(&mut self, limit: Duration) -> Result<(), EngineError> {
        let wait = async {
            loop {
                match self.next_event().await? {
                    EngineEvent::Ready => return Ok(()),
                    _ => continue,
                }
            }
        };
        match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(limit)),
        }
    }

    /// Search `fen` and return the engine's best move as UCI text.
    ///
    /// On timeout the search is stopped and its late `bestmove` is drained so
    /// the next request starts clean.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn best_move(
        &mut self,
        fen: &str,
        params: GoParams,
        limit: Duration,
    ) -> Result<String, EngineError> {
        self.sync().await?;
        self.send_command(EngineCommand::SetPosition {
            fen: fen.to_string(),
            moves: Vec::new(),
        })
        .await?;
        self.send_command(EngineCommand::Go(params)).await?;

        let outcome = tokio::time::timeout(limit, self.await_best_move()).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Engine search exceeded {:?}, stopping", limit);
                self.send_command(EngineCommand::Stop).await?;
                let _ = tokio::time::timeout(STOP_GRACE, self.await_best_move()).await;
                Err(EngineError::Timeout(limit))
            }
        }
    }

    async fn await_best_move(&mut self) -> Result<String, EngineError> {
        loop {
            if let EngineEvent::BestMove(mv) = self.next_event().await? {
                return mv.ok_or(EngineError::NoMove);
            }
        }
    }

    /// Receive the next event, recording raw traffic and search info on the way.
    async fn next_event(&mut self) -> Result<EngineEvent, EngineError> {
        let event = self.event_rx.recv().await.ok_or(EngineError::Closed)?;
        match &event {
            EngineEvent::RawUciMessage { direction, message } => {
                self.traffic.push_back((*direction, message.clone()));
                while self.traffic.len() > TRAFFIC_LIMIT {
                    self.traffic.pop_front();
                }
            }
            EngineEvent::Info(info) => {
                if info.depth.is_some() {
                    self.last_info = Some(info.clone());
                }
            }
            _ => {}
        }
        Ok(event)
    }

    /// Latest search info seen (depth, score, pv).
    pub fn last_info(&self) -> Option<&EngineInfo> {
        self.last_info.as_ref()
    }

    /// Take the raw UCI lines exchanged since the previous call.
    pub fn drain_traffic(&mut self) -> Vec<(UciMessageDirection, String)> {
        self.traffic.drain(..).collect()
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

/// Render a command as a UCI line (with trailing newline).
pub fn format_command(cmd: &EngineCommand) -> String {
    let mut line = match cmd {
        EngineCommand::NewGame => "ucinewgame".to_string(),
        EngineCommand::SetPosition { fen, moves } => {
            let mut position = format!("position fen {}", fen);
            if !moves.is_empty() {
                position.push_str(" moves ");
                position.push_str(&moves.join(" "));
            }
            position
        }
        EngineCommand::SetOption { name, value } => match value {
            Some(val) => format!("setoption name {} value {}", name, val),
            None => format!("setoption name {}", name),
        },
        EngineCommand::Go(params) => params.to_command(),
        EngineCommand::IsReady => "isready".to_string(),
        EngineCommand::Stop => "stop".to_string(),
        EngineCommand::Quit => "quit".to_string(),
    };
    line.push('\n');
    line
}

/// Find Stockfish executable in common locations
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if (path.exists() || path_str == "stockfish")
            && std::process::Command::new(path_str)
                .arg("--help")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok()
        {
            return Some(PathBuf::from(path_str));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_format_position_command() {
        let cmd = EngineCommand::SetPosition {
            fen: "8/8/8/8/8/8/8/K6k w - - 0 1".to_string(),
            moves: vec!["a1b1".to_string(), "h1g1".to_string()],
        };
        assert_eq!(
            format_command(&cmd),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1b1 h1g1\n"
        );
    }

    #[test]
    fn test_format_simple_commands() {
        assert_eq!(format_command(&EngineCommand::IsReady), "isready\n");
        assert_eq!(format_command(&EngineCommand::NewGame), "ucinewgame\n");
        assert_eq!(
            format_command(&EngineCommand::Go(GoParams::depth(10))),
            "go depth 10\n"
        );
        assert_eq!(
            format_command(&EngineCommand::SetOption {
                name: "Skill Level".to_string(),
                value: Some("5".to_string())
            }),
            "setoption name Skill Level value 5\n"
        );
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_not_found() {
        let config = EngineConfig {
            path: Some(PathBuf::from("/nonexistent/definitely-not-stockfish")),
            ..Default::default()
        };
        let result = StockfishEngine::spawn_with_config(config).await;
        assert!(matches!(result, Err(EngineError::NotFound)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_best_move_against_scripted_engine() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        // A tiny shell "engine" that speaks just enough UCI.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-engine.sh");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(
            file,
            r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name Fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 20 pv e2e4"; echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done"#
        )
        .unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = StockfishEngine::spawn_with_config(EngineConfig {
            path: Some(script),
            ..Default::default()
        })
        .await
        .unwrap();

        let mv = engine
            .best_move(START_FEN, GoParams::depth(1), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(mv, "e2e4");
        assert_eq!(engine.last_info().and_then(|i| i.depth), Some(1));

        let traffic = engine.drain_traffic();
        assert!(traffic
            .iter()
            .any(|(dir, msg)| *dir == UciMessageDirection::ToEngine && msg.starts_with("position fen")));
        let sent: Vec<&str> = traffic
            .iter()
            .filter(|(dir, _)| *dir == UciMessageDirection::ToEngine)
            .map(|(_, msg)| msg.as_str())
            .collect();
        let new_game = sent.iter().position(|msg| *msg == "ucinewgame");
        let position = sent.iter().position(|msg| msg.starts_with("position fen"));
        assert!(new_game.is_some(), "ucinewgame missing from {sent:?}");
        assert!(new_game < position);
        engine.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_best_move_times_out_on_silent_engine() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-engine.sh");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(
            file,
            r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    stop) echo "bestmove a2a3" ;;
    quit) exit 0 ;;
  esac
done"#
        )
        .unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = StockfishEngine::spawn_with_config(EngineConfig {
            path: Some(script),
            ..Default::default()
        })
        .await
        .unwrap();

        let result = engine
            .best_move(
                START_FEN,
                GoParams::depth(30),
                Duration::from_millis(200),
            )
            .await;
        assert!(matches!(result, Err(EngineError::Timeout(_))));
        engine.shutdown().await;
    }
}
