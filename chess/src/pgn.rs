//! PGN export.
//!
//! Writes the Seven Tag Roster (plus `SetUp`/`FEN` for non-standard starts and
//! any extra tags set on the game), then SAN movetext wrapped at 80 columns.

use crate::game::{Game, StartPosition};

const ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];
const LINE_WIDTH: usize = 80;

/// Result token for the game: "1-0", "0-1", "1/2-1/2" or "*" while ongoing.
pub fn result_token(game: &Game) -> &'static str {
    game.result().map_or("*", |r| r.pgn_token())
}

pub fn format_pgn(game: &Game) -> String {
    let result = result_token(game);
    let mut out = String::new();

    for tag in ROSTER {
        let value = match tag {
            "Result" => result.to_string(),
            _ => game
                .tag(tag)
                .map(str::to_string)
                .unwrap_or_else(|| default_tag(tag).to_string()),
        };
        push_tag(&mut out, tag, &value);
    }

    if let StartPosition::Fen(fen) = game.start_position() {
        push_tag(&mut out, "SetUp", "1");
        push_tag(&mut out, "FEN", fen);
    }

    for (name, value) in game.tags() {
        if !ROSTER.contains(&name.as_str()) && name != "SetUp" && name != "FEN" {
            push_tag(&mut out, name, value);
        }
    }
    out.push('\n');

    let start = game.position_at(0).cloned().unwrap_or_default();
    let mut move_number = start.fullmove_number();
    let mut white_to_move = start.side_to_move() == cozy_chess::Color::White;

    let mut tokens = Vec::with_capacity(game.history().len() * 2 + 1);
    for (i, entry) in game.history().iter().enumerate() {
        if white_to_move {
            tokens.push(format!("{}.", move_number));
        } else if i == 0 {
            tokens.push(format!("{}...", move_number));
        }
        tokens.push(entry.san.clone());
        if !white_to_move {
            move_number += 1;
        }
        white_to_move = !white_to_move;
    }
    tokens.push(result.to_string());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    out.push_str(&line);
    out.push('\n');
    out
}

fn default_tag(tag: &str) -> &'static str {
    match tag {
        "Event" => "Casual Game",
        "Date" => "????.??.??",
        "Round" => "-",
        _ => "?",
    }
}

fn push_tag(out: &mut String, name: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    out.push_str(&format!("[{} \"{}\"]\n", name, escaped));
}
