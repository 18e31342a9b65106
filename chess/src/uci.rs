//! UCI move text (e2e4, e7e8q) against a concrete position.
//!
//! cozy-chess encodes castling as king-takes-own-rook (e1h1), while UCI engines
//! and most other software use the king's two-square step (e1g1). Both helpers
//! here take the board so they can translate between the two forms.

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::square::{format_square, parse_square, piece_from_letter};

/// True if `mv` is a castling move in cozy-chess form.
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == board.color_on(mv.from)
}

/// Format a move in standard UCI notation (e.g., "e2e4", "e7e8q", "e1g1").
pub fn format_uci_move(board: &Board, mv: Move) -> String {
    let to = if is_castling(board, mv) {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        Square::new(file, mv.from.rank())
    } else {
        mv.to
    };

    let mut s = format!("{}{}", format_square(mv.from), format_square(to));
    if let Some(promo) = mv.promotion {
        s.push(match promo {
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            _ => 'q',
        });
    }
    s
}

/// Resolve UCI text to a legal move in `board`.
///
/// Accepts both the standard king-step castling form and the cozy-chess
/// king-takes-rook form. Returns `None` for malformed text or illegal moves.
pub fn parse_uci_move(board: &Board, text: &str) -> Option<Move> {
    let text = text.trim();
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return None;
    }

    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;
    let promotion = match text.get(4..5) {
        Some(p) => match piece_from_letter(p.chars().next()?)? {
            piece @ (Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen) => Some(piece),
            _ => return None,
        },
        None => None,
    };

    let legal = crate::legal_moves(board);
    let direct = Move {
        from,
        to,
        promotion,
    };
    if legal.contains(&direct) {
        return Some(direct);
    }

    // King stepping two files: translate to the rook square cozy-chess expects.
    let king_step = board.piece_on(from) == Some(Piece::King)
        && from.rank() == to.rank()
        && (from.file() as i8 - to.file() as i8).abs() == 2
        && promotion.is_none();
    if king_step {
        let kingside = to.file() as u8 > from.file() as u8;
        return legal.into_iter().find(|mv| {
            mv.from == from
                && is_castling(board, *mv)
                && (mv.to.file() as u8 > from.file() as u8) == kingside
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Rank;

    const CASTLE_READY: &str = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

    #[test]
    fn test_format_uci_move() {
        let board = Board::default();
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(&board, mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let board: Board = "8/4P2k/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Knight),
        };
        assert_eq!(format_uci_move(&board, mv), "e7e8n");
    }

    #[test]
    fn test_castling_is_formatted_as_king_step() {
        let board: Board = CASTLE_READY.parse().unwrap();
        let short = Move {
            from: Square::new(File::E, Rank::First),
            to: Square::new(File::H, Rank::First),
            promotion: None,
        };
        let long = Move {
            from: Square::new(File::E, Rank::First),
            to: Square::new(File::A, Rank::First),
            promotion: None,
        };
        assert_eq!(format_uci_move(&board, short), "e1g1");
        assert_eq!(format_uci_move(&board, long), "e1c1");
    }

    #[test]
    fn test_parse_castling_both_forms() {
        let board: Board = CASTLE_READY.parse().unwrap();
        let expected = Move {
            from: Square::new(File::E, Rank::First),
            to: Square::new(File::H, Rank::First),
            promotion: None,
        };
        assert_eq!(parse_uci_move(&board, "e1g1"), Some(expected));
        assert_eq!(parse_uci_move(&board, "e1h1"), Some(expected));

        let long = parse_uci_move(&board, "e1c1").unwrap();
        assert_eq!(long.to, Square::new(File::A, Rank::First));
    }

    #[test]
    fn test_parse_rejects_illegal_and_malformed() {
        let board = Board::default();
        assert_eq!(parse_uci_move(&board, "e2e5"), None);
        assert_eq!(parse_uci_move(&board, "e2"), None);
        assert_eq!(parse_uci_move(&board, "z9e4"), None);
        assert_eq!(parse_uci_move(&board, "e2e4k"), None);
        assert!(parse_uci_move(&board, "g1f3").is_some());
        assert!(parse_uci_move(&board, " E2E4 ").is_some());
    }

    #[test]
    fn test_parse_promotion_requires_piece() {
        let board: Board = "8/4P2k/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(parse_uci_move(&board, "e7e8"), None);
        let mv = parse_uci_move(&board, "e7e8q").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }
}
