use crate::app::AppState;
use chess::Game;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Column where Black's move starts inside the panel.
const BLACK_COLUMN: u16 = 14;
const SAN_WIDTH: usize = 8;

/// One numbered line of the move list. Indices point into `Game::history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRow {
    pub number: u32,
    pub white: Option<usize>,
    pub black: Option<usize>,
}

pub fn history_rows(game: &Game) -> Vec<HistoryRow> {
    let (mut number, mut white_to_move) = match game.position_at(0) {
        Ok(board) => (
            board.fullmove_number() as u32,
            board.side_to_move() == cozy_chess::Color::White,
        ),
        Err(_) => (1, true),
    };

    let mut rows: Vec<HistoryRow> = Vec::new();
    for idx in 0..game.history().len() {
        if white_to_move {
            rows.push(HistoryRow {
                number,
                white: Some(idx),
                black: None,
            });
        } else {
            match rows.last_mut() {
                Some(row) if row.black.is_none() && row.white.is_some() => row.black = Some(idx),
                _ => rows.push(HistoryRow {
                    number,
                    white: None,
                    black: Some(idx),
                }),
            }
            number += 1;
        }
        white_to_move = !white_to_move;
    }
    rows
}

/// First row to draw so that `focus_row` stays visible, anchored at the bottom.
pub fn first_visible_row(total_rows: usize, height: usize, focus_row: Option<usize>) -> usize {
    if total_rows <= height || height == 0 {
        return 0;
    }
    let focus = focus_row.unwrap_or(total_rows - 1).min(total_rows - 1);
    (focus + 1).saturating_sub(height).min(total_rows - height)
}

fn row_of(rows: &[HistoryRow], history_idx: usize) -> Option<usize> {
    rows.iter()
        .position(|r| r.white == Some(history_idx) || r.black == Some(history_idx))
}

/// Visible rows and their scroll offset for a panel of `height` lines.
fn layout(state: &AppState, height: usize) -> (Vec<HistoryRow>, usize) {
    let rows = history_rows(&state.game);
    let focus = state
        .displayed_ply()
        .checked_sub(1)
        .and_then(|idx| row_of(&rows, idx));
    let first = first_visible_row(rows.len(), height, focus);
    (rows, first)
}

/// Ply (position after the clicked move) under a click inside `area`.
pub fn ply_at(state: &AppState, area: Rect, column: u16, row: u16) -> Option<usize> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if column < inner.x || row < inner.y || column >= inner.right() || row >= inner.bottom() {
        return None;
    }
    let (rows, first) = layout(state, inner.height as usize);
    let clicked = rows.get(first + (row - inner.y) as usize)?;
    let idx = if column >= inner.x + BLACK_COLUMN {
        clicked.black
    } else {
        clicked.white
    }?;
    Some(idx + 1)
}

pub struct MoveHistoryPanel<'a> {
    pub app_state: &'a AppState,
}

impl<'a> MoveHistoryPanel<'a> {
    pub fn new(app_state: &'a AppState) -> Self {
        Self { app_state }
    }
}

impl Widget for MoveHistoryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("📜 Move History 📜")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let history = self.app_state.game.history();
        if history.is_empty() {
            Paragraph::new("No moves yet").render(inner, buf);
            return;
        }

        let viewed = self.app_state.displayed_ply().checked_sub(1);
        let san_span = |idx: Option<usize>, base: Color| -> Span<'static> {
            match idx {
                Some(i) => {
                    let text = format!("{:<width$}", history[i].san, width = SAN_WIDTH);
                    let mut style = Style::default().fg(base).add_modifier(Modifier::BOLD);
                    if viewed == Some(i) {
                        style = style.bg(Color::DarkGray).fg(Color::Yellow);
                    }
                    Span::styled(text, style)
                }
                None => Span::styled(
                    format!("{:<width$}", "...", width = SAN_WIDTH),
                    Style::default().fg(Color::DarkGray),
                ),
            }
        };

        let (rows, first) = layout(self.app_state, inner.height as usize);
        let lines: Vec<Line> = rows
            .iter()
            .skip(first)
            .take(inner.height as usize)
            .map(|row| {
                let mut spans = vec![
                    Span::styled(
                        format!("{:>3}. ", row.number),
                        Style::default().fg(Color::Yellow),
                    ),
                    san_span(row.white, Color::White),
                    Span::raw(" "),
                ];
                if row.black.is_some() {
                    spans.push(san_span(row.black, Color::Gray));
                }
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use players::PlayerKind;

    fn played(fen: Option<&str>, moves: &[&str]) -> AppState {
        let mut game = match fen {
            Some(fen) => Game::from_fen(fen).unwrap(),
            None => Game::new(),
        };
        for text in moves {
            let mv = chess::parse_uci_move(game.position(), text).unwrap();
            game.make_move(mv).unwrap();
        }
        AppState::new(game, PlayerKind::Human, PlayerKind::Human, 10)
    }

    #[test]
    fn test_rows_pair_moves() {
        let state = played(None, &["e2e4", "e7e5", "g1f3"]);
        let rows = history_rows(&state.game);
        assert_eq!(
            rows,
            vec![
                HistoryRow {
                    number: 1,
                    white: Some(0),
                    black: Some(1)
                },
                HistoryRow {
                    number: 2,
                    white: Some(2),
                    black: None
                },
            ]
        );
    }

    #[test]
    fn test_rows_when_black_starts() {
        let state = played(Some("4k3/8/8/8/8/8/4p3/K7 b - - 0 10"), &["e8d7", "a1b1"]);
        let rows = history_rows(&state.game);
        assert_eq!(rows[0].number, 10);
        assert_eq!(rows[0].white, None);
        assert_eq!(rows[0].black, Some(0));
        assert_eq!(rows[1].number, 11);
        assert_eq!(rows[1].white, Some(1));
    }

    #[test]
    fn test_first_visible_row() {
        assert_eq!(first_visible_row(5, 10, None), 0);
        assert_eq!(first_visible_row(20, 5, None), 15);
        assert_eq!(first_visible_row(20, 5, Some(2)), 0);
        assert_eq!(first_visible_row(20, 5, Some(9)), 5);
    }

    #[test]
    fn test_click_maps_to_ply() {
        let state = played(None, &["e2e4", "e7e5", "g1f3", "b8c6"]);
        let area = Rect::new(0, 0, 30, 10);
        // Row 0 (y = 1), white column.
        assert_eq!(ply_at(&state, area, 6, 1), Some(1));
        // Row 0, black column.
        assert_eq!(ply_at(&state, area, 1 + BLACK_COLUMN + 1, 1), Some(2));
        // Row 1, black column.
        assert_eq!(ply_at(&state, area, 1 + BLACK_COLUMN, 2), Some(4));
        // Empty row and border.
        assert_eq!(ply_at(&state, area, 6, 3), None);
        assert_eq!(ply_at(&state, area, 0, 1), None);
    }
}
