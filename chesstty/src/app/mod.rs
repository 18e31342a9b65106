pub mod input_buffer;
pub mod provider_task;
pub mod state;

pub use input_buffer::InputBuffer;
pub use provider_task::{run_request, ProviderReply};
pub use state::{AppState, InputPhase, LogLevel, ProtocolDirection, ReplyOutcome};
