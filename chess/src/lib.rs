pub mod fen;
pub mod game;
pub mod pgn;
pub mod san;
pub mod square;
pub mod types;
pub mod uci;

pub use fen::{format_fen, parse_fen, FenError, STANDARD_FEN};
pub use game::{Game, GameError, GameResult, HistoryEntry, StartPosition};
pub use san::{format_san, parse_san, SanError};
pub use square::{format_square, parse_square};
pub use types::PieceColor;
pub use uci::{format_uci_move, is_castling, parse_uci_move};

use cozy_chess::{Board, Move};

/// All legal moves in `board`, as reported by cozy-chess.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}
