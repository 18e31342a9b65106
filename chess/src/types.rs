//! Project-owned color type used at crate boundaries (prompts, UI labels, PGN).

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    White,
    Black,
}

impl PieceColor {
    pub const BOTH: [PieceColor; 2] = [PieceColor::White, PieceColor::Black];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Index for per-side arrays: White = 0, Black = 1.
    pub fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

impl From<cozy_chess::Color> for PieceColor {
    fn from(c: cozy_chess::Color) -> Self {
        match c {
            cozy_chess::Color::White => Self::White,
            cozy_chess::Color::Black => Self::Black,
        }
    }
}

impl From<PieceColor> for cozy_chess::Color {
    fn from(c: PieceColor) -> Self {
        match c {
            PieceColor::White => Self::White,
            PieceColor::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for PieceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_and_index() {
        assert_eq!(PieceColor::White.opponent(), PieceColor::Black);
        assert_eq!(PieceColor::Black.opponent(), PieceColor::White);
        assert_eq!(PieceColor::White.index(), 0);
        assert_eq!(PieceColor::Black.index(), 1);
    }

    #[test]
    fn test_cozy_conversion() {
        let c: cozy_chess::Color = PieceColor::Black.into();
        assert_eq!(c, cozy_chess::Color::Black);
        assert_eq!(PieceColor::from(cozy_chess::Color::White), PieceColor::White);
    }
}
