use crate::app::{AppState, LogLevel, ProtocolDirection};
use chess::PieceColor;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Provider attempts on top, raw engine/remote traffic below.
pub struct ProviderLogPanel<'a> {
    pub app_state: &'a AppState,
}

impl<'a> ProviderLogPanel<'a> {
    pub fn new(app_state: &'a AppState) -> Self {
        Self { app_state }
    }
}

fn side_tag(side: Option<PieceColor>) -> Span<'static> {
    let (text, color) = match side {
        Some(PieceColor::White) => ("[W] ", Color::White),
        Some(PieceColor::Black) => ("[B] ", Color::Gray),
        None => ("[-] ", Color::DarkGray),
    };
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

impl Widget for ProviderLogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("🔧 Provider Log (@ to toggle) 🔧")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));

        let inner = block.inner(area);
        block.render(area, buf);

        let ui = &self.app_state.ui_state;
        if ui.provider_log.is_empty() && ui.protocol_log.is_empty() {
            Paragraph::new("No provider activity yet. Start a game with an automated player!")
                .render(inner, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(inner);

        let attempts_height = chunks[0].height as usize;
        let attempts: Vec<Line> = ui
            .provider_log
            .iter()
            .skip(ui.provider_log.len().saturating_sub(attempts_height))
            .map(|entry| {
                let color = match entry.level {
                    LogLevel::Info => Color::Green,
                    LogLevel::Warn => Color::Yellow,
                };
                Line::from(vec![
                    side_tag(entry.side),
                    Span::styled(entry.message.clone(), Style::default().fg(color)),
                ])
            })
            .collect();
        Paragraph::new(attempts).render(chunks[0], buf);

        let traffic_block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("traffic");
        let traffic_area = traffic_block.inner(chunks[1]);
        traffic_block.render(chunks[1], buf);

        let traffic_height = traffic_area.height as usize;
        let traffic: Vec<Line> = ui
            .protocol_log
            .iter()
            .skip(ui.protocol_log.len().saturating_sub(traffic_height))
            .map(|entry| {
                let (prefix, color) = match entry.direction {
                    ProtocolDirection::Outgoing => ("→ OUT: ", Color::Cyan),
                    ProtocolDirection::Incoming => ("← IN:  ", Color::Green),
                    ProtocolDirection::Note => ("·      ", Color::DarkGray),
                };
                let mut spans = vec![
                    side_tag(Some(entry.side)),
                    Span::styled(
                        prefix,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                ];
                spans.extend(highlight(&entry.message).into_iter().map(|(text, kind)| {
                    Span::styled(text, kind.style())
                }));
                Line::from(spans)
            })
            .collect();
        Paragraph::new(traffic).render(traffic_area, buf);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HighlightType {
    Command,
    Keyword,
    Value,
    Normal,
}

impl HighlightType {
    fn style(self) -> Style {
        match self {
            HighlightType::Command => Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            HighlightType::Keyword => Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            HighlightType::Value => Style::default().fg(Color::White),
            HighlightType::Normal => Style::default().fg(Color::Gray),
        }
    }
}

/// UCI move text such as `e2e4` or `e7e8q`.
fn looks_like_move(token: &str) -> bool {
    let square = |range: std::ops::Range<usize>| {
        token.get(range).and_then(chess::parse_square).is_some()
    };
    matches!(token.len(), 4 | 5) && square(0..2) && square(2..4)
}

fn highlight(message: &str) -> Vec<(String, HighlightType)> {
    let mut tokens = message.split_whitespace();
    let Some(first) = tokens.next() else {
        return Vec::new();
    };

    let mut parts = vec![(format!("{} ", first), HighlightType::Command)];
    for token in tokens {
        let kind = match token {
            "position" | "go" | "stop" | "quit" | "uci" | "isready" | "ucinewgame"
            | "bestmove" | "setoption" => HighlightType::Command,
            "fen" | "moves" | "movetime" | "depth" | "name" | "value" | "info" | "score"
            | "cp" | "mate" | "pv" | "nodes" | "nps" | "time" | "ponder" => {
                HighlightType::Keyword
            }
            _ if token.chars().all(|c| c.is_ascii_digit() || c == '-') => HighlightType::Value,
            _ if looks_like_move(token) => HighlightType::Value,
            _ => HighlightType::Normal,
        };
        parts.push((format!("{} ", token), kind));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_uci_tokens() {
        let parts = highlight("info depth 12 score cp -34 pv e2e4");
        let kinds: Vec<HighlightType> = parts.iter().map(|(_, k)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                HighlightType::Command,
                HighlightType::Keyword,
                HighlightType::Value,
                HighlightType::Keyword,
                HighlightType::Keyword,
                HighlightType::Value,
                HighlightType::Keyword,
                HighlightType::Value,
            ]
        );
    }

    #[test]
    fn test_move_tokens_are_values() {
        for token in ["e2e4", "e7e8q", "g1f3"] {
            assert!(looks_like_move(token), "{token}");
        }
        for token in ["Nf3", "readyok", "e2e9", "cp", "e2e4e5"] {
            assert!(!looks_like_move(token), "{token}");
        }
        let parts = highlight("bestmove e2e4 ponder e7e5");
        assert_eq!(parts[1], ("e2e4 ".to_string(), HighlightType::Value));
        assert_eq!(parts[3], ("e7e5 ".to_string(), HighlightType::Value));
    }

    #[test]
    fn test_highlight_empty() {
        assert!(highlight("   ").is_empty());
    }
}
