//! Scripted provider for tests - only compiled in test mode or with mock feature

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::provider::{MoveProvider, MoveRequest, ProviderError};

/// Replays canned answers in order and records every request it receives.
///
/// Once the script runs out every call fails with `EmptyResponse`.
pub struct ScriptedProvider {
    name: String,
    answers: VecDeque<Result<String, ProviderError>>,
    calls: Vec<MoveRequest>,
    shut_down: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(name: &str, answers: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            name: name.to_string(),
            answers: answers.into(),
            calls: Vec::new(),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<MoveRequest> {
        self.calls.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Shutdown marker that stays readable after the provider is boxed and moved.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shut_down)
    }
}

#[async_trait]
impl MoveProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn propose_move(&mut self, request: &MoveRequest) -> Result<String, ProviderError> {
        self.calls.push(request.clone());
        self.answers
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }

    fn drain_transcript(&mut self) -> Vec<String> {
        vec![format!("{}: {} answers left", self.name, self.answers.len())]
    }

    async fn shutdown(&mut self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Game;

    #[tokio::test]
    async fn test_script_then_empty_then_shutdown() {
        let mut provider = ScriptedProvider::new("s", vec![Ok("e2e4".to_string())]);
        let flag = provider.shutdown_flag();
        let request = MoveRequest::from_game(&Game::new());

        assert_eq!(provider.propose_move(&request).await.unwrap(), "e2e4");
        assert!(matches!(
            provider.propose_move(&request).await,
            Err(ProviderError::EmptyResponse)
        ));
        assert_eq!(provider.calls().len(), 2);

        provider.shutdown().await;
        assert!(provider.is_shut_down());
        assert!(flag.load(Ordering::SeqCst));
    }
}
