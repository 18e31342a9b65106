use cozy_chess::Board;

pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fen = fen.trim();
    let fields = fen.split_whitespace().count();
    if fields == 0 {
        return Err(FenError::Empty);
    }
    // Some tools drop the clocks; cozy-chess wants all six fields.
    let padded;
    let fen = match fields {
        4 => {
            padded = format!("{} 0 1", fen);
            padded.as_str()
        }
        6 => fen,
        n => return Err(FenError::FieldCount(n)),
    };

    Board::from_fen(fen, false).map_err(|_| FenError::InvalidPosition(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Empty FEN")]
    Empty,
    #[error("FEN must have 4 or 6 fields, found {0}")]
    FieldCount(usize),
    #[error("Invalid FEN position: {0}")]
    InvalidPosition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_round_trip() {
        let board = parse_fen(STANDARD_FEN).unwrap();
        assert_eq!(format_fen(&Board::default()), STANDARD_FEN);
        assert_eq!(format_fen(&board), STANDARD_FEN);
    }

    #[test]
    fn test_four_field_fen_gets_clocks() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
    }

    #[test]
    fn test_rejects_bad_fen() {
        assert!(matches!(parse_fen("   "), Err(FenError::Empty)));
        assert!(matches!(parse_fen("8/8 w"), Err(FenError::FieldCount(2))));
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::InvalidPosition(_))
        ));
    }
}
