use crate::{EngineInfo, Score};

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)` and `bestmove 0000`.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Info(EngineInfo),
    Option(String),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"option") => Ok(UciMessage::Option(tokens[1..].join(" "))),

        Some(&"bestmove") => {
            let raw = tokens
                .get(1)
                .ok_or_else(|| crate::UciError::MalformedMessage(line.to_string()))?;
            let mv = match *raw {
                "(none)" | "0000" => None,
                text if is_uci_move_token(text) => Some(text.to_string()),
                text => return Err(crate::UciError::InvalidMove(text.to_string())),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(p)) if is_uci_move_token(p) => Some(p.to_string()),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

fn number<'a, T: std::str::FromStr>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<T> {
    tokens.next().and_then(|s| s.parse().ok())
}

/// Parse the fields of an `info` line. Unknown keys are skipped.
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut tokens = tokens.iter().copied().peekable();

    while let Some(key) = tokens.next() {
        match key {
            "depth" => info.depth = number(&mut tokens),
            "seldepth" => info.seldepth = number(&mut tokens),
            "time" => info.time_ms = number(&mut tokens),
            "nodes" => info.nodes = number(&mut tokens),
            "nps" => info.nps = number(&mut tokens),
            "multipv" => info.multipv = number(&mut tokens),
            "hashfull" => info.hashfull = number(&mut tokens),
            "score" => {
                info.score = match (tokens.next(), tokens.next()) {
                    (Some("cp"), Some(v)) => v.parse().ok().map(Score::Centipawns),
                    (Some("mate"), Some(v)) => v.parse().ok().map(Score::Mate),
                    _ => None,
                };
            }
            "pv" => {
                while let Some(mv) = tokens.next_if(|t| !is_keyword(t)) {
                    if is_uci_move_token(mv) {
                        info.pv.push(mv.to_string());
                    }
                }
            }
            "currmove" => {
                info.currmove = tokens
                    .next()
                    .filter(|s| is_uci_move_token(s))
                    .map(str::to_string);
            }
            "string" => break, // free text runs to end of line
            _ => {}
        }
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Shape check for UCI move text: two squares plus an optional promotion piece.
pub fn is_uci_move_token(s: &str) -> bool {
    let b = s.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && matches!(b[4], b'q' | b'r' | b'b' | b'n'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(
            msg,
            UciMessage::BestMove {
                mv: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_bestmove_none() {
        for line in ["bestmove (none)", "bestmove 0000"] {
            assert_eq!(
                parse_uci_message(line).unwrap(),
                UciMessage::BestMove {
                    mv: None,
                    ponder: None
                }
            );
        }
        assert!(parse_uci_message("bestmove").is_err());
        assert!(parse_uci_message("bestmove xx99").is_err());
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score, Some(Score::Centipawns(35)));
                assert_eq!(info.nodes, Some(15234));
                assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_info_mate_and_string() {
        let msg = parse_uci_message("info depth 5 score mate -3 string NNUE evaluation using nn.bin")
            .unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.score, Some(Score::Mate(-3)));
                assert!(info.pv.is_empty());
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_handshake_lines() {
        assert_eq!(parse_uci_message("uciok").unwrap(), UciMessage::UciOk);
        assert_eq!(parse_uci_message("readyok").unwrap(), UciMessage::ReadyOk);
        assert_eq!(
            parse_uci_message("id name Stockfish 16").unwrap(),
            UciMessage::Id {
                name: "name".to_string(),
                value: "Stockfish 16".to_string()
            }
        );
        assert!(parse_uci_message("Stockfish 16 by the Stockfish developers").is_err());
    }

    #[test]
    fn test_move_token_shape() {
        assert!(is_uci_move_token("e2e4"));
        assert!(is_uci_move_token("a7a8q"));
        assert!(!is_uci_move_token("a7a8k"));
        assert!(!is_uci_move_token("e2e9"));
        assert!(!is_uci_move_token("Nf3"));
    }
}
