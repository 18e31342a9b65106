//! Validate-retry-fallback loop around a [`MoveProvider`].

use chess::Game;
use cozy_chess::Move;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

use crate::provider::{MoveProvider, MoveRequest};
use crate::resolve::resolve_move;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
const MAX_FEEDBACK_LEN: usize = 80;

#[derive(Debug, Clone, Copy)]
pub struct MoveSelector {
    max_attempts: usize,
}

impl Default for MoveSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Where the selected move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Provider { attempts: usize },
    RandomFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Accepted { uci: String },
    Illegal { answer: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub attempt: usize,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Accepted { uci } => write!(f, "#{} accepted {}", self.attempt, uci),
            AttemptOutcome::Illegal { answer } => {
                write!(f, "#{} rejected \"{}\"", self.attempt, answer)
            }
            AttemptOutcome::Failed { error } => write!(f, "#{} failed: {}", self.attempt, error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub mv: Move,
    pub uci: String,
    pub san: String,
    pub source: MoveSource,
    pub log: Vec<AttemptRecord>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("No legal moves: the game is over")]
    NoLegalMoves,
}

impl MoveSelector {
    /// At least one attempt is always made.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Ask `provider` for a move, at most `max_attempts` times.
    ///
    /// Every answer is checked against the legal moves of `game`. Rejected
    /// answers are fed back on the next request. If no attempt yields a
    /// legal move, one is picked uniformly at random.
    #[tracing::instrument(level = "debug", skip_all, fields(provider = provider.name()))]
    pub async fn select<R>(
        &self,
        provider: &mut dyn MoveProvider,
        game: &Game,
        rng: &mut R,
    ) -> Result<Selection, SelectError>
    where
        R: Rng + Send + ?Sized,
    {
        let legal = game.legal_moves();
        if legal.is_empty() || game.is_game_over() {
            return Err(SelectError::NoLegalMoves);
        }

        let board = game.position();
        let mut request = MoveRequest::from_game(game);
        let mut log = Vec::with_capacity(self.max_attempts);

        for attempt in 1..=self.max_attempts {
            match provider.propose_move(&request).await {
                Ok(answer) => match resolve_move(board, &answer) {
                    Some(mv) => {
                        let uci = chess::format_uci_move(board, mv);
                        tracing::info!("{} played {} (attempt {})", provider.name(), uci, attempt);
                        log.push(AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::Accepted { uci: uci.clone() },
                        });
                        return Ok(Selection {
                            mv,
                            san: chess::format_san(board, mv),
                            uci,
                            source: MoveSource::Provider { attempts: attempt },
                            log,
                        });
                    }
                    None => {
                        let answer = shorten(&answer);
                        tracing::warn!(
                            "{} answered with no legal move: {:?} (attempt {})",
                            provider.name(),
                            answer,
                            attempt
                        );
                        request.rejected.push(answer.clone());
                        log.push(AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::Illegal { answer },
                        });
                    }
                },
                Err(e) => {
                    tracing::warn!("{} failed: {} (attempt {})", provider.name(), e, attempt);
                    log.push(AttemptRecord {
                        attempt,
                        outcome: AttemptOutcome::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let mv = *legal.choose(rng).ok_or(SelectError::NoLegalMoves)?;
        let uci = chess::format_uci_move(board, mv);
        tracing::warn!(
            "{} gave no legal move in {} attempts, playing random {}",
            provider.name(),
            self.max_attempts,
            uci
        );
        Ok(Selection {
            mv,
            san: chess::format_san(board, mv),
            uci,
            source: MoveSource::RandomFallback,
            log,
        })
    }
}

fn shorten(answer: &str) -> String {
    let single_line = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    match single_line.char_indices().nth(MAX_FEEDBACK_LEN) {
        Some((idx, _)) => format!("{}...", &single_line[..idx]),
        None => single_line,
    }
}
