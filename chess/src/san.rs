//! Standard Algebraic Notation (SAN) formatting and parsing.
//!
//! Both directions work against a position *before* the move and only ever
//! produce or accept moves from the legal-move list.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::square::{
    file_char, parse_file, parse_rank, parse_square, piece_from_letter, piece_letter, rank_char,
};
use crate::uci::is_castling;

/// Format a legal move as SAN ("Nbd2", "exd6", "O-O", "e8=Q+", "Qh4#").
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = String::new();

    if is_castling(board, mv) {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
        return add_check_suffix(board, mv, san);
    }

    let Some(piece) = board.piece_on(mv.from) else {
        return san;
    };
    let is_capture = board.piece_on(mv.to).is_some()
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_char(mv.from.file()));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece));
    }

    if is_capture {
        san.push('x');
    }
    san.push(file_char(mv.to.file()));
    san.push(rank_char(mv.to.rank()));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(piece_letter(promo));
    }

    add_check_suffix(board, mv, san)
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = crate::legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        return file_char(mv.from.file()).to_string();
    }
    if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        return rank_char(mv.from.rank()).to_string();
    }
    format!("{}{}", file_char(mv.from.file()), rank_char(mv.from.rank()))
}

fn add_check_suffix(board: &Board, mv: Move, mut san: String) -> String {
    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }
    san
}

/// Resolve SAN text to a legal move in `board`.
pub fn parse_san(board: &Board, text: &str) -> Result<Move, SanError> {
    let san = text
        .trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    if san.is_empty() {
        return Err(SanError::Empty);
    }

    match san {
        "O-O" | "0-0" => return find_castling(board, true, text),
        "O-O-O" | "0-0-0" => return find_castling(board, false, text),
        _ => {}
    }

    let parsed = parse_components(san)?;
    let candidates: Vec<Move> = crate::legal_moves(board)
        .into_iter()
        .filter(|mv| {
            mv.to == parsed.to
                && mv.promotion == parsed.promotion
                && board.piece_on(mv.from) == Some(parsed.piece)
                && !is_castling(board, *mv)
                && parsed.from_file.map_or(true, |f| mv.from.file() == f)
                && parsed.from_rank.map_or(true, |r| mv.from.rank() == r)
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(text.to_string())),
        _ => Err(SanError::AmbiguousMove(text.to_string())),
    }
}

struct SanComponents {
    piece: Piece,
    from_file: Option<File>,
    from_rank: Option<Rank>,
    to: Square,
    promotion: Option<Piece>,
}

fn parse_components(san: &str) -> Result<SanComponents, SanError> {
    if !san.is_ascii() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let (piece, rest) = match san.chars().next() {
        Some(c) if c.is_ascii_uppercase() => {
            let piece =
                piece_from_letter(c).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;
            (piece, &san[1..])
        }
        _ => (Piece::Pawn, san),
    };

    // Promotion: "e8=Q" or "e8Q".
    let (rest, promotion) = match rest.char_indices().last() {
        Some((idx, c)) if c.is_ascii_uppercase() => {
            let promo = piece_from_letter(c)
                .filter(|p| !matches!(p, Piece::Pawn | Piece::King))
                .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
            (rest[..idx].trim_end_matches('='), Some(promo))
        }
        _ => (rest, None),
    };

    let body: String = rest.chars().filter(|&c| c != 'x' && c != '-').collect();
    if body.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }
    let (prefix, target) = body.split_at(body.len() - 2);
    let to = parse_square(target).ok_or_else(|| SanError::InvalidSquare(target.to_string()))?;

    let mut from_file = None;
    let mut from_rank = None;
    for c in prefix.chars() {
        if let Some(f) = parse_file(c) {
            from_file = Some(f);
        } else if let Some(r) = parse_rank(c) {
            from_rank = Some(r);
        } else {
            return Err(SanError::InvalidFormat(san.to_string()));
        }
    }

    Ok(SanComponents {
        piece,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

fn find_castling(board: &Board, kingside: bool, text: &str) -> Result<Move, SanError> {
    crate::legal_moves(board)
        .into_iter()
        .find(|mv| {
            is_castling(board, *mv) && (mv.to.file() as u8 > mv.from.file() as u8) == kingside
        })
        .ok_or_else(|| SanError::NoLegalMove(text.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("Empty move text")]
    Empty,
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        crate::fen::parse_fen(fen).unwrap()
    }

    fn san_of(board: &Board, uci: &str) -> String {
        let mv = crate::uci::parse_uci_move(board, uci).unwrap();
        format_san(board, mv)
    }

    #[test]
    fn test_simple_moves() {
        let b = Board::default();
        assert_eq!(san_of(&b, "e2e4"), "e4");
        assert_eq!(san_of(&b, "g1f3"), "Nf3");
    }

    #[test]
    fn test_captures_and_en_passant() {
        let b = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        assert_eq!(san_of(&b, "e4d5"), "exd5");

        let ep = board("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        assert_eq!(san_of(&ep, "e5f6"), "exf6");
    }

    #[test]
    fn test_disambiguation() {
        // Knights on b1 and f3 can both reach d2.
        let b = board("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert_eq!(san_of(&b, "b1d2"), "Nbd2");
        // Rooks on a1 and a5 share a file: rank disambiguates.
        let r = board("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san_of(&r, "a1a3"), "R1a3");
    }

    #[test]
    fn test_castling_promotion_and_checks() {
        let c = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(san_of(&c, "e1g1"), "O-O");
        assert_eq!(san_of(&c, "e1c1"), "O-O-O");

        let p = board("8/4P2k/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(san_of(&p, "e7e8q"), "e8=Q");

        let mate = board("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        assert_eq!(san_of(&mate, "d8h4"), "Qh4#");

        let check = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san_of(&check, "a1a8"), "Ra8+");
    }

    #[test]
    fn test_parse_san() {
        let b = Board::default();
        assert_eq!(crate::uci::format_uci_move(&b, parse_san(&b, "Nf3").unwrap()), "g1f3");
        assert_eq!(crate::uci::format_uci_move(&b, parse_san(&b, "e4!").unwrap()), "e2e4");

        let c = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let short = parse_san(&c, "O-O").unwrap();
        assert_eq!(crate::uci::format_uci_move(&c, short), "e1g1");
        let long = parse_san(&c, "0-0-0+").unwrap();
        assert_eq!(crate::uci::format_uci_move(&c, long), "e1c1");

        let p = board("8/4P2k/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(parse_san(&p, "e8=N").unwrap().promotion, Some(Piece::Knight));
        assert_eq!(parse_san(&p, "e8Q").unwrap().promotion, Some(Piece::Queen));
    }

    #[test]
    fn test_parse_san_errors() {
        let b = board("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert!(matches!(parse_san(&b, "Nd2"), Err(SanError::AmbiguousMove(_))));
        assert!(parse_san(&b, "Nbd2").is_ok());
        assert!(matches!(parse_san(&b, "Qd2"), Err(SanError::NoLegalMove(_))));
        assert!(matches!(parse_san(&b, ""), Err(SanError::Empty)));
        assert!(parse_san(&b, "hello").is_err());
    }

    #[test]
    fn test_san_round_trips_every_opening_move() {
        let b = Board::default();
        for mv in crate::legal_moves(&b) {
            let san = format_san(&b, mv);
            assert_eq!(parse_san(&b, &san).unwrap(), mv, "round trip of {}", san);
        }
    }
}
