use crate::engine_provider::{EngineProvider, EngineSettings};
use crate::provider::{MoveProvider, PlayerKind, ProviderError};
use crate::remote::{RemoteConfig, RemoteProvider};
use crate::selector::DEFAULT_MAX_ATTEMPTS;

/// Settings needed to build any automated provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub engine: EngineSettings,
    pub remote: RemoteConfig,
    pub max_attempts: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            remote: RemoteConfig::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Build the provider for `kind`. Humans have no provider.
///
/// A missing engine binary or API key yields `ProviderError::Unavailable`;
/// callers hand that side to the human at the keyboard.
pub async fn build_provider(
    kind: PlayerKind,
    config: &ProviderConfig,
) -> Result<Option<Box<dyn MoveProvider>>, ProviderError> {
    match kind {
        PlayerKind::Human => Ok(None),
        PlayerKind::Engine => {
            let provider = EngineProvider::spawn(config.engine.clone()).await?;
            Ok(Some(Box::new(provider)))
        }
        PlayerKind::Remote => {
            let provider = RemoteProvider::new(config.remote.clone())?;
            Ok(Some(Box::new(provider)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_human_has_no_provider() {
        let provider = build_provider(PlayerKind::Human, &ProviderConfig::default())
            .await
            .unwrap();
        assert!(provider.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_providers() {
        let mut config = ProviderConfig::default();
        config.engine.path = Some(PathBuf::from("/nonexistent/stockfish"));
        config.remote.api_key = None;

        let engine = build_provider(PlayerKind::Engine, &config).await;
        assert!(matches!(engine, Err(ProviderError::Unavailable(_))));
        let remote = build_provider(PlayerKind::Remote, &config).await;
        assert!(matches!(remote, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_remote_provider_builds_with_key() {
        let mut config = ProviderConfig::default();
        config.remote.api_key = Some("key".to_string());
        let provider = build_provider(PlayerKind::Remote, &config)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(provider.name(), "grok-3-mini");
    }
}
