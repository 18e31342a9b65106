use async_trait::async_trait;
use engine::{EngineConfig, GoParams, StockfishEngine, UciMessageDirection};
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::{MoveProvider, MoveRequest, ProviderError};

pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_ENGINE_DEPTH: u8 = 12;
pub const MAX_SKILL_LEVEL: u8 = 20;

/// How the local engine is launched and searched.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub path: Option<PathBuf>,
    /// Stockfish "Skill Level", 0-20.
    pub skill_level: u8,
    /// Upper bound on search depth; the skill level may lower it.
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
    pub timeout: Duration,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: None,
            skill_level: 10,
            max_depth: DEFAULT_ENGINE_DEPTH,
            movetime_ms: None,
            timeout: DEFAULT_ENGINE_TIMEOUT,
            threads: None,
            hash_mb: None,
        }
    }
}

impl EngineSettings {
    /// Search limits for one move. A fixed movetime replaces the depth
    /// limit; otherwise depth grows with skill, capped by `max_depth`.
    pub fn go_params(&self) -> GoParams {
        if let Some(ms) = self.movetime_ms {
            return GoParams::movetime(ms);
        }
        let skill = self.skill_level.min(MAX_SKILL_LEVEL);
        GoParams::depth((2 + skill / 2).min(self.max_depth.max(1)))
    }
}

/// Local UCI engine as a move provider.
pub struct EngineProvider {
    engine: Option<StockfishEngine>,
    settings: EngineSettings,
}

impl EngineProvider {
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn spawn(settings: EngineSettings) -> Result<Self, ProviderError> {
        let config = EngineConfig {
            path: settings.path.clone(),
            skill_level: Some(settings.skill_level.min(MAX_SKILL_LEVEL)),
            threads: settings.threads,
            hash_mb: settings.hash_mb,
        };
        let engine = StockfishEngine::spawn_with_config(config).await?;
        Ok(Self {
            engine: Some(engine),
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[async_trait]
impl MoveProvider for EngineProvider {
    fn name(&self) -> &str {
        "Stockfish"
    }

    async fn propose_move(&mut self, request: &MoveRequest) -> Result<String, ProviderError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| ProviderError::Unavailable("engine was shut down".to_string()))?;
        let params = self.settings.go_params();
        tracing::debug!("Engine search: {} ({})", request.fen, params.to_command());
        let mv = engine
            .best_move(&request.fen, params, self.settings.timeout)
            .await?;
        if let Some(info) = engine.last_info() {
            tracing::debug!(
                "Engine info: depth {:?} score {:?} pv {}",
                info.depth,
                info.score,
                info.pv.join(" ")
            );
        }
        Ok(mv)
    }

    fn drain_transcript(&mut self) -> Vec<String> {
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        engine
            .drain_traffic()
            .into_iter()
            .map(|(direction, line)| match direction {
                UciMessageDirection::ToEngine => format!(">> {}", line),
                UciMessageDirection::FromEngine => format!("<< {}", line),
            })
            .collect()
    }

    async fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown().await;
        }
    }
}
