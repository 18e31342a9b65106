use crate::app::AppState;
use cozy_chess::{Color as ChessColor, Piece, Square};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

pub const PROMOTION_CHOICES: [(Piece, char, &str); 4] = [
    (Piece::Queen, 'Q', "Queen"),
    (Piece::Rook, 'R', "Rook"),
    (Piece::Bishop, 'B', "Bishop"),
    (Piece::Knight, 'N', "Knight"),
];

pub struct PromotionWidget<'a> {
    pub app_state: &'a AppState,
    pub from: Square,
}

impl<'a> PromotionWidget<'a> {
    pub fn new(app_state: &'a AppState, from: Square) -> Self {
        Self { app_state, from }
    }
}

impl Widget for PromotionWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog_width = 30;
        let dialog_height = 10;
        let x = (area.width.saturating_sub(dialog_width)) / 2;
        let y = (area.height.saturating_sub(dialog_height)) / 2;

        let dialog_area = Rect {
            x: area.x + x,
            y: area.y + y,
            width: dialog_width.min(area.width),
            height: dialog_height.min(area.height),
        };
        Clear.render(dialog_area, buf);

        let block = Block::default()
            .title("♟ Select Promotion ♟")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(dialog_area);
        block.render(dialog_area, buf);

        let promoting_color = self.app_state.game.position().color_on(self.from);
        let selected_piece = self.app_state.ui_state.selected_promotion_piece;

        let mut lines = vec![Line::raw("")];

        for (piece, key, name) in PROMOTION_CHOICES {
            let is_selected = piece == selected_piece;
            let prefix = if is_selected { "► " } else { "  " };

            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            lines.push(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(format!("{} ", piece_symbol(piece, promoting_color)), style),
                Span::styled(format!("{:<8}", name), style),
                Span::styled(format!("({})", key), Style::default().fg(Color::DarkGray)),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![Span::styled(
            "↑/↓/j/k or q/r/b/n | Enter",
            Style::default().fg(Color::DarkGray),
        )]));

        Paragraph::new(lines)
            .alignment(Alignment::Left)
            .render(inner, buf);
    }
}

fn piece_symbol(piece: Piece, color: Option<ChessColor>) -> char {
    let black = color == Some(ChessColor::Black);
    match (piece, black) {
        (Piece::Queen, false) => '♕',
        (Piece::Queen, true) => '♛',
        (Piece::Rook, false) => '♖',
        (Piece::Rook, true) => '♜',
        (Piece::Bishop, false) => '♗',
        (Piece::Bishop, true) => '♝',
        (Piece::Knight, false) => '♘',
        (Piece::Knight, true) => '♞',
        _ => '?',
    }
}
