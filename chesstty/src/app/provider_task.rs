//! One automated turn, run off the UI loop.
//!
//! The provider is moved into the task and handed back with the reply, so a
//! side never has two requests in flight.

use chess::{Game, PieceColor};
use players::{MoveProvider, MoveSelector, SelectError, Selection};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct ProviderRequest {
    pub session: u64,
    pub generation: u64,
    pub side: PieceColor,
    pub provider: Box<dyn MoveProvider>,
    pub game: Game,
    pub selector: MoveSelector,
}

pub struct ProviderReply {
    pub session: u64,
    pub generation: u64,
    pub side: PieceColor,
    pub provider: Box<dyn MoveProvider>,
    pub result: Result<Selection, SelectError>,
    pub transcript: Vec<String>,
}

pub async fn run_request(request: ProviderRequest) -> ProviderReply {
    let ProviderRequest {
        session,
        generation,
        side,
        mut provider,
        game,
        selector,
    } = request;

    let mut rng = StdRng::from_entropy();
    let result = selector.select(provider.as_mut(), &game, &mut rng).await;
    let transcript = provider.drain_transcript();

    ProviderReply {
        session,
        generation,
        side,
        provider,
        result,
        transcript,
    }
}
