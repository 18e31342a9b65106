use crate::app::AppState;
use chess::PieceColor;
use players::PlayerKind;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

pub struct GameInfoPanel<'a> {
    pub app_state: &'a AppState,
}

impl<'a> GameInfoPanel<'a> {
    pub fn new(app_state: &'a AppState) -> Self {
        Self { app_state }
    }
}

fn label(text: &'static str, color: Color) -> Span<'static> {
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

impl Widget for GameInfoPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("♟ Game Info ♟")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let state = self.app_state;
        let mut lines = vec![];

        for side in PieceColor::BOTH {
            let kind = state.player(side);
            let color = match kind {
                PlayerKind::Human => Color::White,
                PlayerKind::Engine => Color::Magenta,
                PlayerKind::Remote => Color::LightBlue,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}: ", side.title()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(state.player_name(side), Style::default().fg(color)),
            ]));
        }

        lines.push(Line::raw(""));

        let turn = state.side_to_move();
        let mut turn_spans = vec![
            label("Turn: ", Color::Yellow),
            Span::styled(
                format!("{} to move", turn.title()),
                Style::default()
                    .fg(if turn == PieceColor::White {
                        Color::White
                    } else {
                        Color::Gray
                    })
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if state.game.in_check() {
            turn_spans.push(Span::styled(" (check)", Style::default().fg(Color::Red)));
        }
        lines.push(Line::from(turn_spans));

        if state.is_thinking() {
            lines.push(Line::from(vec![Span::styled(
                "Thinking...",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
            )]));
        }

        if !state.is_live() {
            lines.push(Line::from(vec![
                label("Viewing: ", Color::Magenta),
                Span::raw(format!(
                    "ply {} of {}",
                    state.displayed_ply(),
                    state.game.ply_count()
                )),
            ]));
        }

        if let Some(selected) = state.ui_state.selected_square {
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                label("Selected: ", Color::Yellow),
                Span::styled(
                    chess::format_square(selected),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            ]));

            if !state.ui_state.highlighted_squares.is_empty() {
                let moves_str = state
                    .ui_state
                    .highlighted_squares
                    .iter()
                    .map(|&sq| chess::format_square(sq))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(Line::from(vec![
                    label("Legal: ", Color::Green),
                    Span::styled(moves_str, Style::default().fg(Color::Green)),
                ]));
            }
        }

        if let Some(ref msg) = state.ui_state.status_message {
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                label("Status: ", Color::Cyan),
                Span::raw(msg.clone()),
            ]));
        }

        if let Some(result) = state.game.result() {
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                label("Game: ", Color::Red),
                Span::styled(
                    format!("{} ({})", result.describe(), result.pgn_token()),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
