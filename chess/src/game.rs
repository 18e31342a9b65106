use cozy_chess::{BitBoard, Board, Color, GameStatus, Move, Piece, Square};
use std::collections::BTreeMap;

use crate::fen::{format_fen, parse_fen, FenError};
use crate::san::format_san;
use crate::types::PieceColor;

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    start: Board,
    start_position: StartPosition,
    history: Vec<HistoryEntry>,
    pgn_tags: BTreeMap<String, String>,
}

/// One played ply, with enough context to render and replay it.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub piece_color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub san: String,
    pub uci: String,
    pub fen: String,
    board_after: Board,
}

/// Starting position of the game
#[derive(Debug, Clone, PartialEq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Checkmate { winner: PieceColor },
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameResult {
    /// PGN result token.
    pub fn pgn_token(self) -> &'static str {
        match self {
            GameResult::Checkmate {
                winner: PieceColor::White,
            } => "1-0",
            GameResult::Checkmate {
                winner: PieceColor::Black,
            } => "0-1",
            _ => "1/2-1/2",
        }
    }

    pub fn describe(self) -> String {
        match self {
            GameResult::Checkmate { winner } => format!("Checkmate! {} wins", winner),
            GameResult::Stalemate => "Draw by stalemate".to_string(),
            GameResult::FiftyMoveRule => "Draw by fifty-move rule".to_string(),
            GameResult::ThreefoldRepetition => "Draw by threefold repetition".to_string(),
            GameResult::InsufficientMaterial => "Draw by insufficient material".to_string(),
        }
    }
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            start: Board::default(),
            start_position: StartPosition::Standard,
            history: Vec::new(),
            pgn_tags: BTreeMap::new(),
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let start = parse_fen(fen)?;
        let start_position = if format_fen(&start) == crate::fen::STANDARD_FEN {
            StartPosition::Standard
        } else {
            StartPosition::Fen(format_fen(&start))
        };
        Ok(Self {
            start,
            start_position,
            history: Vec::new(),
            pgn_tags: BTreeMap::new(),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        self.history.last().map_or(&self.start, |e| &e.board_after)
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Board after `ply` half-moves; 0 is the starting position.
    pub fn position_at(&self, ply: usize) -> Result<&Board, GameError> {
        match ply {
            0 => Ok(&self.start),
            n => self
                .history
                .get(n - 1)
                .map(|e| &e.board_after)
                .ok_or(GameError::PlyOutOfRange(n)),
        }
    }

    pub fn fen_at(&self, ply: usize) -> Result<String, GameError> {
        self.position_at(ply).map(format_fen)
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if self.result().is_some() {
            return Err(GameError::GameOver);
        }
        let board = self.position();
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove);
        }

        let piece = board.piece_on(mv.from).ok_or(GameError::IllegalMove)?;
        let piece_color = board.color_on(mv.from).ok_or(GameError::IllegalMove)?;
        let castling = crate::uci::is_castling(board, mv);
        let captured = if castling {
            None
        } else if piece == Piece::Pawn
            && board.piece_on(mv.to).is_none()
            && mv.from.file() != mv.to.file()
        {
            // en passant
            Some(Piece::Pawn)
        } else {
            board.piece_on(mv.to)
        };

        let san = format_san(board, mv);
        let uci = crate::uci::format_uci_move(board, mv);
        let mut board_after = board.clone();
        board_after.play_unchecked(mv);

        let entry = HistoryEntry {
            mv,
            from: mv.from,
            to: mv.to,
            piece,
            piece_color,
            captured,
            promotion: mv.promotion,
            san,
            uci,
            fen: format_fen(&board_after),
            board_after,
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<HistoryEntry, GameError> {
        self.history.pop().ok_or(GameError::NothingToUndo)
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        crate::legal_moves(self.position())
    }

    /// Legal moves for the piece on `from`.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .collect()
    }

    /// Get the current game status
    pub fn status(&self) -> GameStatus {
        self.position().status()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position().side_to_move()
    }

    pub fn in_check(&self) -> bool {
        !self.position().checkers().is_empty()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        format_fen(self.position())
    }

    /// Outcome of the game, or `None` while it is still going.
    pub fn result(&self) -> Option<GameResult> {
        let board = self.position();
        match board.status() {
            GameStatus::Won => {
                return Some(GameResult::Checkmate {
                    winner: PieceColor::from(!board.side_to_move()),
                })
            }
            GameStatus::Drawn => {
                return Some(if board.checkers().is_empty() && self.legal_moves().is_empty() {
                    GameResult::Stalemate
                } else {
                    GameResult::FiftyMoveRule
                })
            }
            GameStatus::Ongoing => {}
        }

        if self.repetitions_of_current() >= 3 {
            return Some(GameResult::ThreefoldRepetition);
        }
        if insufficient_material(board) {
            return Some(GameResult::InsufficientMaterial);
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.result().is_some()
    }

    fn repetitions_of_current(&self) -> usize {
        let current = self.position();
        std::iter::once(&self.start)
            .chain(self.history.iter().map(|e| &e.board_after))
            .filter(|b| b.same_position(current))
            .count()
    }

    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pgn_tags.insert(name.into(), value.into());
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.pgn_tags.get(name).map(String::as_str)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.pgn_tags
    }

    /// Export the game as PGN.
    pub fn to_pgn(&self) -> String {
        crate::pgn::format_pgn(self)
    }
}

/// Dead positions the rules library does not report: K v K, K+minor v K,
/// and K+B v K+B with both bishops on the same color.
fn insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    let minors = (knights | bishops).len();

    match minors {
        0 | 1 => true,
        2 if knights.is_empty() => {
            let white = board.colors(Color::White) & bishops;
            let black = board.colors(Color::Black) & bishops;
            if white.len() != 1 || black.len() != 1 {
                return false;
            }
            same_shade(bishops)
        }
        _ => false,
    }
}

fn same_shade(squares: BitBoard) -> bool {
    let mut shades = squares.into_iter().map(crate::square::is_light_square);
    match shades.next() {
        Some(first) => shades.all(|s| s == first),
        None => true,
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Game is already over")]
    GameOver,
    #[error("No position at ply {0}")]
    PlyOutOfRange(usize),
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::parse_uci_move;

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            let mv = parse_uci_move(game.position(), text)
                .unwrap_or_else(|| panic!("{} should be legal", text));
            game.make_move(mv).unwrap();
        }
    }

    #[test]
    fn test_make_move_records_san_and_fen() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);

        let sans: Vec<&str> = game.history().iter().map(|e| e.san.as_str()).collect();
        assert_eq!(sans, ["e4", "e5", "Nf3"]);
        assert_eq!(game.history()[2].uci, "g1f3");
        assert_eq!(game.fen_at(3).unwrap(), game.to_fen());
        assert_eq!(game.side_to_move(), Color::Black);
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut game = Game::new();
        let mv = Move {
            from: Square::E2,
            to: Square::E5,
            promotion: None,
        };
        assert!(matches!(game.make_move(mv), Err(GameError::IllegalMove)));
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_undo_restores_previous_position() {
        let mut game = Game::new();
        play(&mut game, &["d2d4", "d7d5"]);
        let before = game.fen_at(1).unwrap();
        let undone = game.undo().unwrap();
        assert_eq!(undone.san, "d5");
        assert_eq!(game.to_fen(), before);
        game.undo().unwrap();
        assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
    }

    #[test]
    fn test_position_at_replays_history() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "c7c5"]);
        assert_eq!(game.fen_at(0).unwrap(), crate::fen::STANDARD_FEN);
        assert_eq!(game.position_at(1).unwrap().piece_on(Square::E4), Some(Piece::Pawn));
        assert!(matches!(game.position_at(3), Err(GameError::PlyOutOfRange(3))));
    }

    #[test]
    fn test_fools_mate() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(
            game.result(),
            Some(GameResult::Checkmate {
                winner: PieceColor::Black
            })
        );
        assert_eq!(game.history().last().unwrap().san, "Qh4#");
        let mv = game.legal_moves().first().copied();
        assert!(mv.is_none());
    }

    #[test]
    fn test_stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.result(), Some(GameResult::Stalemate));
    }

    #[test]
    fn test_threefold_repetition() {
        let mut game = Game::new();
        play(
            &mut game,
            &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"],
        );
        assert_eq!(game.result(), Some(GameResult::ThreefoldRepetition));
    }

    #[test]
    fn test_insufficient_material() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KN2 w - - 0 1",
            "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1",
        ] {
            let game = Game::from_fen(fen).unwrap();
            assert_eq!(game.result(), Some(GameResult::InsufficientMaterial), "{}", fen);
        }
        // Opposite-colored bishops can still mate in theory.
        let game = Game::from_fen("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(game.result(), None);
        let game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(game.result(), None);
    }

    #[test]
    fn test_no_moves_after_game_over() {
        let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mv = Move {
            from: Square::H8,
            to: Square::H7,
            promotion: None,
        };
        assert!(matches!(game.make_move(mv), Err(GameError::GameOver)));
    }

    #[test]
    fn test_result_tokens() {
        assert_eq!(
            GameResult::Checkmate {
                winner: PieceColor::White
            }
            .pgn_token(),
            "1-0"
        );
        assert_eq!(GameResult::Stalemate.pgn_token(), "1/2-1/2");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn random_playouts_keep_history_consistent(choices in proptest::collection::vec(any::<usize>(), 0..40)) {
            let mut game = Game::new();
            for choice in choices {
                let moves = game.legal_moves();
                if moves.is_empty() || game.is_game_over() {
                    break;
                }
                let mv = moves[choice % moves.len()];
                game.make_move(mv).unwrap();
            }

            prop_assert_eq!(game.fen_at(game.ply_count()).unwrap(), game.to_fen());
            for (i, entry) in game.history().iter().enumerate() {
                let before = game.position_at(i).unwrap();
                prop_assert!(crate::legal_moves(before).contains(&entry.mv));
                prop_assert_eq!(crate::san::parse_san(before, &entry.san).unwrap(), entry.mv);
            }
        }
    }
}
