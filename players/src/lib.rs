//! Move providers and the orchestration that picks the next move.
//!
//! Every side is driven by one of three providers: a human at the board, a
//! local UCI engine or a remote chat-completion API. Automated answers go
//! through [`MoveSelector`], which validates them against the legal moves,
//! retries, and finally falls back to a random legal move.

pub mod config;
pub mod engine_provider;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;
pub mod remote;
pub mod resolve;
pub mod selector;

pub use config::{build_provider, ProviderConfig};
pub use engine_provider::{EngineProvider, EngineSettings};
#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedProvider;
pub use provider::{MoveProvider, MoveRequest, PlayerKind, ProviderError};
pub use remote::{RemoteConfig, RemoteProvider};
pub use resolve::resolve_move;
pub use selector::{AttemptOutcome, AttemptRecord, MoveSelector, MoveSource, SelectError, Selection};
