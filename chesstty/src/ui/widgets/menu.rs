use players::PlayerKind;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    WhitePlayer(PlayerKind),
    BlackPlayer(PlayerKind),
    Difficulty(DifficultyOption),
    StartGame,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DifficultyOption {
    Beginner,     // Skill 2
    Intermediate, // Skill 10
    Advanced,     // Skill 17
    Master,       // Skill 20
}

impl DifficultyOption {
    const ALL: [DifficultyOption; 4] = [
        DifficultyOption::Beginner,
        DifficultyOption::Intermediate,
        DifficultyOption::Advanced,
        DifficultyOption::Master,
    ];

    pub fn skill_level(&self) -> u8 {
        match self {
            DifficultyOption::Beginner => 2,
            DifficultyOption::Intermediate => 10,
            DifficultyOption::Advanced => 17,
            DifficultyOption::Master => 20,
        }
    }

    /// Preset closest to a raw skill level.
    pub fn from_skill(skill: u8) -> Self {
        Self::ALL
            .into_iter()
            .min_by_key(|d| d.skill_level().abs_diff(skill))
            .unwrap_or(DifficultyOption::Intermediate)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DifficultyOption::Beginner => "Beginner",
            DifficultyOption::Intermediate => "Intermediate",
            DifficultyOption::Advanced => "Advanced",
            DifficultyOption::Master => "Master",
        }
    }

    fn step(self, forward: bool) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ALL[next]
    }
}

pub const MENU_ITEM_COUNT: usize = 5;
pub const START_INDEX: usize = 3;
pub const QUIT_INDEX: usize = 4;

pub struct MenuState {
    pub selected_index: usize,
    pub white: PlayerKind,
    pub black: PlayerKind,
    pub difficulty: DifficultyOption,
    /// Exact engine skill; presets overwrite it, a `--skill` flag seeds it.
    pub skill_level: u8,
}

impl Default for MenuState {
    fn default() -> Self {
        Self::new(PlayerKind::Human, PlayerKind::Engine, 10)
    }
}

impl MenuState {
    pub fn new(white: PlayerKind, black: PlayerKind, skill_level: u8) -> Self {
        Self {
            selected_index: 0,
            white,
            black,
            difficulty: DifficultyOption::from_skill(skill_level),
            skill_level,
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_down(&mut self, max: usize) {
        if self.selected_index + 1 < max {
            self.selected_index += 1;
        }
    }

    pub fn items(&self) -> Vec<MenuItem> {
        vec![
            MenuItem::WhitePlayer(self.white),
            MenuItem::BlackPlayer(self.black),
            MenuItem::Difficulty(self.difficulty),
            MenuItem::StartGame,
            MenuItem::Quit,
        ]
    }

    /// Change the value of the selected row (←/→).
    pub fn cycle_selected(&mut self, forward: bool) {
        let step = |kind: PlayerKind| if forward { kind.next() } else { kind.prev() };
        match self.selected_index {
            0 => self.white = step(self.white),
            1 => self.black = step(self.black),
            2 => self.cycle_difficulty(forward),
            _ => {}
        }
    }

    pub fn cycle_difficulty(&mut self, forward: bool) {
        self.difficulty = self.difficulty.step(forward);
        self.skill_level = self.difficulty.skill_level();
    }
}

pub struct MenuWidget<'a> {
    pub menu_state: &'a MenuState,
}

impl<'a> MenuWidget<'a> {
    pub fn new(menu_state: &'a MenuState) -> Self {
        Self { menu_state }
    }
}

impl Widget for MenuWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let menu_width = 60;
        let menu_height = 16;
        let x = (area.width.saturating_sub(menu_width)) / 2;
        let y = (area.height.saturating_sub(menu_height)) / 2;

        let menu_area = Rect {
            x: area.x + x,
            y: area.y + y,
            width: menu_width.min(area.width),
            height: menu_height.min(area.height),
        };

        let block = Block::default()
            .title("♔ ChessTTY - New Game ♔")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(menu_area);
        block.render(menu_area, buf);

        let mut lines = vec![
            Line::raw(""),
            Line::from(vec![Span::styled(
                "Welcome to ChessTTY!",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::raw(""),
        ];

        let hint = Span::styled(" [←/→]", Style::default().fg(Color::DarkGray));
        for (idx, item) in self.menu_state.items().iter().enumerate() {
            let is_selected = idx == self.menu_state.selected_index;
            let prefix = if is_selected { "► " } else { "  " };

            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = match item {
                MenuItem::WhitePlayer(kind) | MenuItem::BlackPlayer(kind) => {
                    let name = if matches!(item, MenuItem::WhitePlayer(_)) {
                        "White: "
                    } else {
                        "Black: "
                    };
                    Line::from(vec![
                        Span::styled(prefix, style),
                        Span::styled(name, style),
                        Span::styled(kind.label(), style.fg(Color::Cyan)),
                        hint.clone(),
                    ])
                }
                MenuItem::Difficulty(diff) => Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled("Difficulty: ", style),
                    Span::styled(
                        format!("{} (skill {})", diff.label(), self.menu_state.skill_level),
                        style.fg(Color::Green),
                    ),
                    hint.clone(),
                ]),
                MenuItem::StartGame => Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled("▶ Start Game", style.fg(Color::Green)),
                ]),
                MenuItem::Quit => Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled("✕ Quit", style.fg(Color::Red)),
                ]),
            };

            lines.push(line);
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![Span::styled(
            "↑/↓: Navigate  ←/→: Change  Enter: Select",
            Style::default().fg(Color::DarkGray),
        )]));

        Paragraph::new(lines)
            .alignment(Alignment::Left)
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_skill_picks_nearest_preset() {
        assert_eq!(DifficultyOption::from_skill(0), DifficultyOption::Beginner);
        assert_eq!(DifficultyOption::from_skill(9), DifficultyOption::Intermediate);
        assert_eq!(DifficultyOption::from_skill(16), DifficultyOption::Advanced);
        assert_eq!(DifficultyOption::from_skill(20), DifficultyOption::Master);
    }

    #[test]
    fn test_cycle_selected_rows() {
        let mut menu = MenuState::new(PlayerKind::Human, PlayerKind::Engine, 13);
        assert_eq!(menu.skill_level, 13);

        menu.cycle_selected(true);
        assert_eq!(menu.white, PlayerKind::Engine);

        menu.move_down(MENU_ITEM_COUNT);
        menu.cycle_selected(false);
        assert_eq!(menu.black, PlayerKind::Human);

        menu.move_down(MENU_ITEM_COUNT);
        menu.cycle_selected(true);
        assert_eq!(menu.skill_level, menu.difficulty.skill_level());
    }

    #[test]
    fn test_navigation_bounds() {
        let mut menu = MenuState::default();
        menu.move_up();
        assert_eq!(menu.selected_index, 0);
        for _ in 0..10 {
            menu.move_down(MENU_ITEM_COUNT);
        }
        assert_eq!(menu.selected_index, QUIT_INDEX);
        assert_eq!(menu.items().len(), MENU_ITEM_COUNT);
        assert_eq!(menu.items()[START_INDEX], MenuItem::StartGame);
    }
}
