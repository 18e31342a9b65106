use crate::app::{run_request, AppState, InputBuffer, InputPhase, ProviderReply, ReplyOutcome};
use crate::ui::widgets::menu::{QUIT_INDEX, START_INDEX};
use crate::ui::widgets::{
    ply_at, square_at, BoardWidget, ControlsPanel, GameInfoPanel, MenuState, MenuWidget,
    MoveHistoryPanel, PromotionWidget, ProviderLogPanel, BOARD_HEIGHT, BOARD_WIDTH,
};
use chess::{Game, PieceColor};
use cozy_chess::{Piece, Square};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use players::{build_provider, MoveSelector, PlayerKind, ProviderConfig};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the command line decides before the first frame.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub white: PlayerKind,
    pub black: PlayerKind,
    pub skill_level: u8,
    pub start_fen: Option<String>,
    pub providers: ProviderConfig,
    pub data_dir: PathBuf,
    pub skip_menu: bool,
}

enum AppMode {
    Menu,
    Game,
}

/// How a game screen was left.
enum GameExit {
    Menu,
    Quit,
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Run the TUI application
pub async fn run_app(options: LaunchOptions) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, &options).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn main_loop(terminal: &mut Term, options: &LaunchOptions) -> anyhow::Result<()> {
    let mut menu_state = MenuState::new(options.white, options.black, options.skill_level);
    let mut app_mode = if options.skip_menu {
        AppMode::Game
    } else {
        AppMode::Menu
    };

    // Replies outlive a single game: answers for an abandoned game still
    // arrive here and their providers get shut down.
    let (reply_tx, mut reply_rx) = unbounded_channel::<ProviderReply>();
    let mut session: u64 = 0;

    loop {
        match app_mode {
            AppMode::Menu => {
                terminal.draw(|f| {
                    f.render_widget(MenuWidget::new(&menu_state), f.area());
                })?;

                if event::poll(POLL_INTERVAL)? {
                    if let Event::Key(key) = event::read()? {
                        match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Up => menu_state.move_up(),
                            KeyCode::Down => menu_state.move_down(menu_state.items().len()),
                            KeyCode::Left => menu_state.cycle_selected(false),
                            KeyCode::Right => menu_state.cycle_selected(true),
                            KeyCode::Enter => match menu_state.selected_index {
                                START_INDEX => app_mode = AppMode::Game,
                                QUIT_INDEX => return Ok(()),
                                _ => menu_state.cycle_selected(true),
                            },
                            _ => {}
                        }
                    }
                }
            }
            AppMode::Game => {
                session += 1;
                draw_loading(terminal)?;
                let mut app_state = start_game(
                    options,
                    menu_state.white,
                    menu_state.black,
                    menu_state.skill_level,
                    session,
                )
                .await?;

                let exit = run_game_loop(
                    terminal,
                    &mut app_state,
                    options,
                    &reply_tx,
                    &mut reply_rx,
                )
                .await;

                app_state.cancel_pending();
                for mut provider in app_state.take_providers() {
                    provider.shutdown().await;
                }

                match exit? {
                    GameExit::Menu => app_mode = AppMode::Menu,
                    GameExit::Quit => return Ok(()),
                }
            }
        }
    }
}

fn draw_loading(terminal: &mut Term) -> anyhow::Result<()> {
    terminal.draw(|f| {
        let text = Paragraph::new("Starting players...")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("ChessTTY"));
        f.render_widget(text, f.area());
    })?;
    Ok(())
}

/// Build the game and a provider for every automated side.
///
/// A side whose provider cannot be started is handed to the human.
async fn start_game(
    options: &LaunchOptions,
    white: PlayerKind,
    black: PlayerKind,
    skill_level: u8,
    session: u64,
) -> anyhow::Result<AppState> {
    let game = match &options.start_fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };

    let mut config = options.providers.clone();
    config.engine.skill_level = skill_level;

    let mut app_state = AppState::new(game, white, black, skill_level)
        .with_selector(MoveSelector::new(config.max_attempts));
    app_state.session = session;

    for side in PieceColor::BOTH {
        match build_provider(app_state.player(side), &config).await {
            Ok(Some(provider)) => app_state.attach_provider(side, provider),
            Ok(None) => {}
            Err(e) => app_state.fall_back_to_human(side, &e),
        }
    }

    tracing::info!(
        "Game {} started: {} vs {}",
        session,
        app_state.player_name(PieceColor::White),
        app_state.player_name(PieceColor::Black)
    );
    Ok(app_state)
}

/// Collect finished provider turns and hand out the next one.
fn pump_providers(
    app_state: &mut AppState,
    reply_tx: &UnboundedSender<ProviderReply>,
    reply_rx: &mut UnboundedReceiver<ProviderReply>,
) {
    while let Ok(reply) = reply_rx.try_recv() {
        if let ReplyOutcome::Orphaned(mut provider) = app_state.apply_reply(reply) {
            tracing::debug!("Shutting down {} from an earlier game", provider.name());
            tokio::spawn(async move { provider.shutdown().await });
        }
    }

    if let Some(request) = app_state.next_request() {
        let tx = reply_tx.clone();
        tokio::spawn(async move {
            let reply = run_request(request).await;
            // The receiver only goes away when the app exits.
            let _ = tx.send(reply);
        });
    }
}

async fn run_game_loop(
    terminal: &mut Term,
    app_state: &mut AppState,
    options: &LaunchOptions,
    reply_tx: &UnboundedSender<ProviderReply>,
    reply_rx: &mut UnboundedReceiver<ProviderReply>,
) -> anyhow::Result<GameExit> {
    let mut input_buffer = InputBuffer::new();
    let mut typeahead_squares: Vec<Square> = Vec::new();

    loop {
        pump_providers(app_state, reply_tx, reply_rx);

        if app_state.ui_state.input_phase == InputPhase::SelectPiece && app_state.is_live() {
            typeahead_squares = app_state.filter_selectable_by_input(input_buffer.as_str());
        } else {
            typeahead_squares.clear();
        }

        terminal.draw(|f| {
            let (board_area, history_area) =
                draw_game(f, app_state, &input_buffer, &typeahead_squares);
            app_state.ui_state.board_area = Some(board_area);
            app_state.ui_state.history_area = Some(history_area);
        })?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if let InputPhase::SelectPromotion { from, to } = app_state.ui_state.input_phase {
                    handle_promotion_key(app_state, key, from, to);
                    continue;
                }
                if let Some(exit) = handle_game_key(app_state, key, &mut input_buffer, options) {
                    return Ok(exit);
                }
            }
            Event::Mouse(mouse) => handle_mouse(app_state, mouse, &mut input_buffer),
            _ => {}
        }
    }
}

fn handle_game_key(
    app_state: &mut AppState,
    key: KeyEvent,
    input_buffer: &mut InputBuffer,
    options: &LaunchOptions,
) -> Option<GameExit> {
    match key.code {
        KeyCode::Char('q') => return Some(GameExit::Quit),
        KeyCode::Char('n') => return Some(GameExit::Menu),
        KeyCode::Char('u') => {
            app_state.undo_to_human();
            input_buffer.clear();
        }
        KeyCode::Char('F') => app_state.toggle_flip(),
        KeyCode::Char('@') => app_state.toggle_debug_panel(),
        KeyCode::Char('p') => {
            app_state.ui_state.status_message = Some(match app_state.export_pgn(&options.data_dir)
            {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    tracing::error!("PGN export failed: {}", e);
                    format!("Export failed: {}", e)
                }
            });
        }
        KeyCode::Left => app_state.view_prev(),
        KeyCode::Right => app_state.view_next(),
        KeyCode::Home => app_state.view_start(),
        KeyCode::End => app_state.view_end(),
        KeyCode::Esc => {
            app_state.clear_selection();
            input_buffer.clear();
            app_state.ui_state.status_message = Some("Selection cleared".to_string());
        }
        KeyCode::Enter => {
            if app_state.ui_state.selected_square.is_none() {
                app_state.clear_selection();
            }
            input_buffer.clear();
        }
        KeyCode::Backspace => input_buffer.backspace(),
        KeyCode::Char(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
            input_buffer.push_char(c);
            if input_buffer.is_complete() {
                match input_buffer.try_parse_square() {
                    Some(square) => app_state.handle_square_input(square),
                    None => {
                        app_state.ui_state.status_message = Some("Invalid square!".to_string())
                    }
                }
                input_buffer.clear();
            }
        }
        _ => {}
    }
    None
}

fn handle_promotion_key(app_state: &mut AppState, key: KeyEvent, from: Square, to: Square) {
    let piece = match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app_state.cycle_promotion_piece(-1);
            return;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app_state.cycle_promotion_piece(1);
            return;
        }
        KeyCode::Esc => {
            app_state.cancel_promotion();
            return;
        }
        KeyCode::Enter => app_state.ui_state.selected_promotion_piece,
        KeyCode::Char('q') => Piece::Queen,
        KeyCode::Char('r') => Piece::Rook,
        KeyCode::Char('b') => Piece::Bishop,
        KeyCode::Char('n') => Piece::Knight,
        _ => return,
    };
    app_state.set_promotion_piece(piece);
    if let Err(e) = app_state.execute_promotion(from, to, piece) {
        app_state.ui_state.status_message = Some(e);
    }
}

fn handle_mouse(app_state: &mut AppState, mouse: MouseEvent, input_buffer: &mut InputBuffer) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    if matches!(app_state.ui_state.input_phase, InputPhase::SelectPromotion { .. }) {
        return;
    }

    if let Some(area) = app_state.ui_state.board_area {
        if let Some(square) = square_at(area, app_state.ui_state.flipped, mouse.column, mouse.row)
        {
            input_buffer.clear();
            app_state.handle_square_input(square);
            return;
        }
    }
    if let Some(area) = app_state.ui_state.history_area {
        if let Some(ply) = ply_at(app_state, area, mouse.column, mouse.row) {
            app_state.go_to_ply(ply);
        }
    }
}

/// Draw one game frame. Returns the board and history areas for mouse hit-testing.
fn draw_game(
    f: &mut ratatui::Frame,
    app_state: &AppState,
    input_buffer: &InputBuffer,
    typeahead_squares: &[Square],
) -> (Rect, Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(f.area());

    let mut columns = vec![Constraint::Length(BOARD_WIDTH), Constraint::Min(35)];
    if app_state.ui_state.show_debug_panel {
        columns[1] = Constraint::Length(38);
        columns.push(Constraint::Min(30));
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(main_chunks[0]);

    let board_area = Rect {
        height: chunks[0].height.min(BOARD_HEIGHT),
        ..chunks[0]
    };
    f.render_widget(BoardWidget::new(app_state, typeahead_squares), board_area);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(14), // Controls
            Constraint::Length(12), // Game Info
            Constraint::Min(5),     // Move History
        ])
        .split(chunks[1]);

    f.render_widget(ControlsPanel::new(), right_chunks[0]);
    f.render_widget(GameInfoPanel::new(app_state), right_chunks[1]);
    f.render_widget(MoveHistoryPanel::new(app_state), right_chunks[2]);

    if app_state.ui_state.show_debug_panel {
        f.render_widget(ProviderLogPanel::new(app_state), chunks[2]);
    }

    draw_input_boxes(f, app_state, input_buffer, main_chunks[1]);

    if let InputPhase::SelectPromotion { from, .. } = app_state.ui_state.input_phase {
        f.render_widget(PromotionWidget::new(app_state, from), f.area());
    }

    (board_area, right_chunks[2])
}

fn input_box<'a>(title: &'a str, text: String, active: bool) -> Paragraph<'a> {
    let (style, border_style) = if active {
        (
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Green),
        )
    } else {
        (
            Style::default().fg(Color::Gray),
            Style::default().fg(Color::DarkGray),
        )
    };

    Paragraph::new(Line::from(vec![Span::styled(text, style)]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
}

fn draw_input_boxes(
    f: &mut ratatui::Frame,
    app_state: &AppState,
    input_buffer: &InputBuffer,
    area: Rect,
) {
    let input_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let human_turn = app_state.is_human_turn() && app_state.is_live();
    let source_active = human_turn && app_state.ui_state.input_phase == InputPhase::SelectPiece;
    let source_text = if let Some(sq) = app_state.ui_state.selected_square {
        format!("Selected: {}", chess::format_square(sq))
    } else if !input_buffer.is_empty() && source_active {
        format!("Typing: {}", input_buffer.as_str())
    } else if source_active {
        "Type square (e.g., e2) or click".to_string()
    } else {
        "Waiting...".to_string()
    };
    f.render_widget(
        input_box("1. Select Piece", source_text, source_active),
        input_chunks[0],
    );

    let dest_active =
        human_turn && app_state.ui_state.input_phase == InputPhase::SelectDestination;
    let dest_text = if !input_buffer.is_empty() && dest_active {
        format!("Typing: {}", input_buffer.as_str())
    } else if dest_active {
        "Type destination".to_string()
    } else {
        "Waiting...".to_string()
    };
    f.render_widget(
        input_box("2. Move To", dest_text, dest_active),
        input_chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use players::{ScriptedProvider, SelectError};
    use std::sync::atomic::Ordering;

    fn options() -> LaunchOptions {
        LaunchOptions {
            white: PlayerKind::Human,
            black: PlayerKind::Human,
            skill_level: 10,
            start_fen: None,
            providers: ProviderConfig::default(),
            data_dir: std::env::temp_dir(),
            skip_menu: true,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(state: &mut AppState, buffer: &mut InputBuffer, text: &str) {
        for c in text.chars() {
            assert!(handle_game_key(state, press(KeyCode::Char(c)), buffer, &options()).is_none());
        }
    }

    #[test]
    fn test_typed_move() {
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        type_keys(&mut state, &mut buffer, "e2e4");
        assert_eq!(state.game.history().len(), 1);
        assert_eq!(state.game.history()[0].san, "e4");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_flip_uses_uppercase_key() {
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        handle_game_key(&mut state, press(KeyCode::Char('F')), &mut buffer, &options());
        assert!(state.ui_state.flipped);
        // Lowercase f is a file, not a command.
        type_keys(&mut state, &mut buffer, "f");
        assert!(state.ui_state.flipped);
        assert_eq!(buffer.as_str(), "f");
    }

    #[test]
    fn test_quit_and_menu_keys() {
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        assert!(matches!(
            handle_game_key(&mut state, press(KeyCode::Char('q')), &mut buffer, &options()),
            Some(GameExit::Quit)
        ));
        assert!(matches!(
            handle_game_key(&mut state, press(KeyCode::Char('n')), &mut buffer, &options()),
            Some(GameExit::Menu)
        ));
    }

    #[test]
    fn test_promotion_by_letter() {
        let game = Game::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut state = AppState::new(game, PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        type_keys(&mut state, &mut buffer, "a7a8");

        let InputPhase::SelectPromotion { from, to } = state.ui_state.input_phase else {
            panic!("expected promotion prompt");
        };
        handle_promotion_key(&mut state, press(KeyCode::Char('n')), from, to);
        assert_eq!(state.game.history()[0].san, "a8=N");
        assert_eq!(state.ui_state.input_phase, InputPhase::SelectPiece);
    }

    #[test]
    fn test_promotion_escape_cancels() {
        let game = Game::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut state = AppState::new(game, PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        type_keys(&mut state, &mut buffer, "a7a8");
        handle_promotion_key(&mut state, press(KeyCode::Esc), Square::A7, Square::A8);
        assert!(state.game.history().is_empty());
        assert_eq!(state.ui_state.input_phase, InputPhase::SelectPiece);
    }

    #[test]
    fn test_click_selects_and_moves() {
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Human, 10);
        let mut buffer = InputBuffer::new();
        let area = Rect::new(0, 0, BOARD_WIDTH, BOARD_HEIGHT);
        state.ui_state.board_area = Some(area);

        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        // g1 is file 6, rank row 7; f3 is file 5, row 5.
        handle_mouse(&mut state, click(1 + 6 * 6, 1 + 7 * 3), &mut buffer);
        assert_eq!(state.ui_state.selected_square, Some(Square::G1));
        handle_mouse(&mut state, click(1 + 5 * 6, 1 + 5 * 3), &mut buffer);
        assert_eq!(state.game.history()[0].san, "Nf3");
    }

    #[tokio::test]
    async fn test_pump_plays_automated_turn() {
        let (tx, mut rx) = unbounded_channel();
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Engine, 10);
        state.attach_provider(
            PieceColor::Black,
            Box::new(ScriptedProvider::new("s", vec![Ok("e7e5".to_string())])),
        );
        let mut buffer = InputBuffer::new();
        type_keys(&mut state, &mut buffer, "e2e4");

        tokio::time::timeout(Duration::from_secs(2), async {
            while state.game.ply_count() < 2 {
                pump_providers(&mut state, &tx, &mut rx);
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(state.game.history()[1].san, "e5");
        assert!(!state.is_thinking());
    }

    #[tokio::test]
    async fn test_pump_shuts_down_provider_from_earlier_game() {
        let (tx, mut rx) = unbounded_channel();
        let mut state = AppState::new(Game::new(), PlayerKind::Human, PlayerKind::Human, 10);
        state.session = 2;

        let provider = ScriptedProvider::new("old", Vec::new());
        let shut_down = provider.shutdown_flag();
        tx.send(ProviderReply {
            session: 1,
            generation: 1,
            side: PieceColor::Black,
            provider: Box::new(provider),
            result: Err(SelectError::NoLegalMoves),
            transcript: Vec::new(),
        })
        .unwrap();

        pump_providers(&mut state, &tx, &mut rx);
        tokio::time::timeout(Duration::from_secs(2), async {
            while !shut_down.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(state.game.ply_count(), 0);
        assert!(state.ui_state.provider_log.is_empty());
    }

    #[tokio::test]
    async fn test_start_game_with_human_players() {
        let state = start_game(&options(), PlayerKind::Human, PlayerKind::Human, 5, 3)
            .await
            .unwrap();
        assert_eq!(state.session, 3);
        assert_eq!(state.skill_level, 5);
        assert!(state.is_human_turn());
    }

    #[tokio::test]
    async fn test_start_game_falls_back_when_engine_missing() {
        let mut opts = options();
        opts.providers.engine.path = Some(PathBuf::from("/nonexistent/stockfish-binary"));
        let state = start_game(&opts, PlayerKind::Human, PlayerKind::Engine, 10, 1)
            .await
            .unwrap();
        assert_eq!(state.player(PieceColor::Black), PlayerKind::Human);
        assert!(state
            .ui_state
            .provider_log
            .iter()
            .any(|e| e.message.contains("unavailable")));
    }

    #[tokio::test]
    async fn test_start_game_rejects_bad_fen() {
        let mut opts = options();
        opts.start_fen = Some("not a fen".to_string());
        assert!(
            start_game(&opts, PlayerKind::Human, PlayerKind::Human, 10, 1)
                .await
                .is_err()
        );
    }
}
