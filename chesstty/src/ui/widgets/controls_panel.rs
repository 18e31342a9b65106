use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

const KEYS: [(&str, &str); 9] = [
    ("Esc", "Clear selection"),
    ("←/→", "Step through moves"),
    ("Home/End", "First / live position"),
    ("u", "Undo to your turn"),
    ("F", "Flip board"),
    ("p", "Export PGN"),
    ("@", "Provider log"),
    ("n", "New game"),
    ("q", "Quit"),
];

pub struct ControlsPanel;

impl ControlsPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ControlsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ControlsPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("⌨ Controls ⌨")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![Line::from(vec![
            Span::styled(
                "Move: ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("click, or type e2 then e4"),
        ])];

        for (key, action) in KEYS {
            let color = if key == "q" { Color::Red } else { Color::Green };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<9}", key),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(action),
            ]));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
