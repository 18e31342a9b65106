//! Square and piece text helpers shared by SAN, UCI and the UI.

use cozy_chess::{File, Piece, Rank, Square};

pub fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

/// Format a square as algebraic text ("e4").
pub fn format_square(sq: Square) -> String {
    let mut s = String::with_capacity(2);
    s.push(file_char(sq.file()));
    s.push(rank_char(sq.rank()));
    s
}

pub fn parse_file(c: char) -> Option<File> {
    match c {
        'a'..='h' => Some(File::index((c as u8 - b'a') as usize)),
        _ => None,
    }
}

pub fn parse_rank(c: char) -> Option<Rank> {
    match c {
        '1'..='8' => Some(Rank::index((c as u8 - b'1') as usize)),
        _ => None,
    }
}

/// Parse algebraic square text ("e4"). Case-insensitive on the file.
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = parse_file(chars.next()?.to_ascii_lowercase())?;
    let rank = parse_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

/// Uppercase SAN letter for a piece. Pawns have none in SAN but 'P' is returned
/// so callers that need a letter for every piece still get one.
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub fn piece_from_letter(c: char) -> Option<Piece> {
    match c.to_ascii_uppercase() {
        'P' => Some(Piece::Pawn),
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "Pawn",
        Piece::Knight => "Knight",
        Piece::Bishop => "Bishop",
        Piece::Rook => "Rook",
        Piece::Queen => "Queen",
        Piece::King => "King",
    }
}

/// True for light squares (h1 is light).
pub fn is_light_square(sq: Square) -> bool {
    (sq.file() as usize + sq.rank() as usize) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_round_trip_corners() {
        for (text, file, rank) in [
            ("a1", File::A, Rank::First),
            ("h8", File::H, Rank::Eighth),
            ("e4", File::E, Rank::Fourth),
        ] {
            let sq = parse_square(text).unwrap();
            assert_eq!(sq, Square::new(file, rank));
            assert_eq!(format_square(sq), text);
        }
    }

    #[test]
    fn test_parse_square_rejects_garbage() {
        assert_eq!(parse_square(""), None);
        assert_eq!(parse_square("i1"), None);
        assert_eq!(parse_square("a9"), None);
        assert_eq!(parse_square("a10"), None);
        assert_eq!(parse_square("E4"), Some(Square::new(File::E, Rank::Fourth)));
    }

    #[test]
    fn test_square_colors() {
        assert!(!is_light_square(Square::new(File::A, Rank::First)));
        assert!(is_light_square(Square::new(File::H, Rank::First)));
        assert!(is_light_square(Square::new(File::D, Rank::First)));
    }
}
