use cozy_chess::{Board, Move};

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ',' | ';' | ':' | '.' | '"' | '\'' | '`' | '*' | '(' | ')' | '[' | ']' | '{' | '}'
        )
}

/// Pull a legal move out of free-form provider text.
///
/// Tokens are tried as UCI first ("e2e4", "e7e8q"), then as SAN ("Nf3",
/// "O-O"), in the order they appear. Only moves legal in `board` are returned.
pub fn resolve_move(board: &Board, text: &str) -> Option<Move> {
    let tokens: Vec<&str> = text
        .split(is_delimiter)
        .filter(|t| !t.is_empty())
        .collect();

    tokens
        .iter()
        .find_map(|token| chess::parse_uci_move(board, &token.to_ascii_lowercase()))
        .or_else(|| {
            tokens
                .iter()
                .find_map(|token| chess::parse_san(board, token).ok())
        })
}
