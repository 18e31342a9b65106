use crate::app::AppState;
use cozy_chess::{Color as ChessColor, File, Piece, Rank, Square};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

const SQUARE_WIDTH: u16 = 6;
const SQUARE_HEIGHT: u16 = 3;

/// Width and height the board needs including its border.
pub const BOARD_WIDTH: u16 = SQUARE_WIDTH * 8 + 2;
pub const BOARD_HEIGHT: u16 = SQUARE_HEIGHT * 8 + 2;

pub struct BoardWidget<'a> {
    pub app_state: &'a AppState,
    pub typeahead_squares: &'a [Square],
}

impl<'a> BoardWidget<'a> {
    pub fn new(app_state: &'a AppState, typeahead_squares: &'a [Square]) -> Self {
        Self {
            app_state,
            typeahead_squares,
        }
    }
}

/// Board square drawn at display column `file_idx` and row `rank_idx`
/// (both 0-7, counted from the top-left corner).
pub fn display_square(file_idx: usize, rank_idx: usize, flipped: bool) -> Square {
    if flipped {
        Square::new(File::index(7 - file_idx), Rank::index(rank_idx))
    } else {
        Square::new(File::index(file_idx), Rank::index(7 - rank_idx))
    }
}

/// Square under terminal cell (`column`, `row`) for a board drawn in `area`.
pub fn square_at(area: Rect, flipped: bool, column: u16, row: u16) -> Option<Square> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if column < inner.x || row < inner.y || column >= inner.right() || row >= inner.bottom() {
        return None;
    }
    let file_idx = ((column - inner.x) / SQUARE_WIDTH) as usize;
    let rank_idx = ((row - inner.y) / SQUARE_HEIGHT) as usize;
    if file_idx >= 8 || rank_idx >= 8 {
        return None;
    }
    Some(display_square(file_idx, rank_idx, flipped))
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.app_state;
        let flipped = state.ui_state.flipped;
        let title = if state.is_live() {
            "♟ Chess Board ♟".to_string()
        } else {
            format!("♟ Chess Board (ply {}) ♟", state.displayed_ply())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if state.is_live() {
                Color::Cyan
            } else {
                Color::Magenta
            }));
        let inner = block.inner(area);
        block.render(area, buf);

        let board = state.displayed_board();
        let last_move = state.displayed_last_move();
        let checked_king = if board.checkers().is_empty() {
            None
        } else {
            Some(board.king(board.side_to_move()))
        };

        // Rank labels on the left border
        for rank_idx in 0..8u16 {
            let y = inner.y + rank_idx * SQUARE_HEIGHT + 1;
            if y < inner.bottom() {
                let rank = if flipped { rank_idx + 1 } else { 8 - rank_idx };
                buf.set_string(
                    area.x,
                    y,
                    rank.to_string(),
                    Style::default().fg(Color::Yellow),
                );
            }
        }

        // File labels on the bottom border
        for file_idx in 0..8u8 {
            let x = inner.x + (file_idx as u16 * SQUARE_WIDTH) + 2;
            let y = inner.y + (8 * SQUARE_HEIGHT);
            if x < area.right() && y < area.bottom() {
                let file = if flipped { b'h' - file_idx } else { b'a' + file_idx };
                buf.set_string(
                    x,
                    y,
                    (file as char).to_string(),
                    Style::default().fg(Color::Yellow),
                );
            }
        }

        for rank_idx in 0..8usize {
            for file_idx in 0..8usize {
                let square = display_square(file_idx, rank_idx, flipped);
                let x = inner.x + (file_idx as u16 * SQUARE_WIDTH);
                let y = inner.y + (rank_idx as u16 * SQUARE_HEIGHT);

                let is_selected = state.ui_state.selected_square == Some(square);
                let is_highlighted = state.ui_state.highlighted_squares.contains(&square);
                let is_typeahead = self.typeahead_squares.contains(&square);
                let is_last_move = last_move
                    .map(|(from, to)| from == square || to == square)
                    .unwrap_or(false);

                let bg_color = if is_selected {
                    Color::Yellow
                } else if is_highlighted {
                    Color::Green
                } else if checked_king == Some(square) {
                    Color::Red
                } else if is_typeahead {
                    Color::LightCyan
                } else if is_last_move {
                    Color::Blue
                } else if chess::square::is_light_square(square) {
                    Color::Rgb(240, 217, 181) // Light square
                } else {
                    Color::Rgb(181, 136, 99) // Dark square
                };

                render_square(buf, x, y, bg_color, inner);

                if let (Some(piece), Some(piece_color)) =
                    (board.piece_on(square), board.color_on(square))
                {
                    render_piece(buf, x, y, piece, piece_color, bg_color, inner);
                }
            }
        }
    }
}

fn render_square(buf: &mut Buffer, x: u16, y: u16, bg_color: Color, bounds: Rect) {
    let style = Style::default().bg(bg_color);

    for dy in 0..SQUARE_HEIGHT {
        for dx in 0..SQUARE_WIDTH {
            let px = x + dx;
            let py = y + dy;
            if px < bounds.right() && py < bounds.bottom() {
                if let Some(cell) = buf.cell_mut((px, py)) {
                    cell.set_style(style);
                }
            }
        }
    }
}

fn render_piece(
    buf: &mut Buffer,
    x: u16,
    y: u16,
    piece: Piece,
    color: ChessColor,
    bg_color: Color,
    bounds: Rect,
) {
    let (top, mid, bot) = piece_ascii_art(piece, color);

    let fg_color = match color {
        ChessColor::White => Color::White,
        ChessColor::Black => Color::Black,
    };

    let style = Style::default()
        .bg(bg_color)
        .fg(fg_color)
        .add_modifier(Modifier::BOLD);

    for (dy, line) in [top, mid, bot].into_iter().enumerate() {
        let py = y + dy as u16;
        if py < bounds.bottom() && x < bounds.right() {
            buf.set_string(x, py, line, style);
        }
    }
}

fn piece_ascii_art(piece: Piece, color: ChessColor) -> (&'static str, &'static str, &'static str) {
    // 3 lines high, 6 cells wide
    match (color, piece) {
        (_, Piece::King) => (" ╔═╗ ", " ║K║ ", " ╚═╝ "),
        (ChessColor::White, Piece::Queen) => (" ♕♕♕ ", " ║Q║ ", " ╚═╝ "),
        (ChessColor::Black, Piece::Queen) => (" ♛♛♛ ", " ║Q║ ", " ╚═╝ "),
        (_, Piece::Rook) => (" ┌┬┐ ", " │R│ ", " └─┘ "),
        (_, Piece::Bishop) => ("  △  ", " ║B║ ", " ╚═╝ "),
        (_, Piece::Knight) => (" ∩╗  ", " ║N║ ", " ╚═╝ "),
        (_, Piece::Pawn) => ("  ●  ", " ║P║ ", " ╚═╝ "),
    }
}
