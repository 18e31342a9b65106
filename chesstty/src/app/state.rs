use chess::{Game, PieceColor};
use cozy_chess::{Move, Piece, Rank, Square};
use players::{MoveProvider, MoveSelector, MoveSource, PlayerKind, ProviderError, Selection};
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::provider_task::{ProviderReply, ProviderRequest};

const LOG_LIMIT: usize = 200;

/// Main application state
pub struct AppState {
    pub game: Game,
    /// Who plays each side, indexed by `PieceColor::index`.
    pub players: [PlayerKind; 2],
    pub skill_level: u8,
    pub ui_state: UiState,
    /// Games started in this process; replies from older sessions are orphans.
    pub session: u64,
    providers: [Option<Box<dyn MoveProvider>>; 2],
    provider_names: [Option<String>; 2],
    selector: MoveSelector,
    generation: u64,
    pending: Option<PendingRequest>,
    /// An answer that arrived while history was on screen; played on return to live.
    parked: Option<ParkedMove>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    generation: u64,
    side: PieceColor,
}

struct ParkedMove {
    side: PieceColor,
    name: String,
    selection: Selection,
}

/// UI-specific state (not part of game state)
pub struct UiState {
    pub selected_square: Option<Square>,
    pub highlighted_squares: Vec<Square>,
    pub selectable_squares: Vec<Square>, // Squares with pieces that can be selected
    pub status_message: Option<String>,
    pub input_phase: InputPhase,
    pub selected_promotion_piece: Piece,
    pub show_debug_panel: bool, // Toggle provider/protocol log panel
    pub provider_log: VecDeque<ProviderLogEntry>,
    pub protocol_log: VecDeque<ProtocolLogEntry>,
    /// Black at the bottom.
    pub flipped: bool,
    /// Ply being viewed; `None` follows the live position.
    pub view_ply: Option<usize>,
    /// Where the board and history were last drawn, for mouse hit-testing.
    pub board_area: Option<Rect>,
    pub history_area: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputPhase {
    SelectPiece,
    SelectDestination,
    SelectPromotion { from: Square, to: Square },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone)]
pub struct ProviderLogEntry {
    pub side: Option<PieceColor>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolDirection {
    Outgoing,
    Incoming,
    Note,
}

#[derive(Debug, Clone)]
pub struct ProtocolLogEntry {
    pub side: PieceColor,
    pub direction: ProtocolDirection,
    pub message: String,
}

/// What happened to a provider reply.
pub enum ReplyOutcome {
    /// The move was played.
    Applied,
    /// The position moved on (undo, replay) before the answer arrived.
    Stale,
    /// The move is held until the board returns to live play.
    Parked,
    /// The reply belongs to an earlier game; the caller should shut the provider down.
    Orphaned(Box<dyn MoveProvider>),
}

impl AppState {
    pub fn new(game: Game, white: PlayerKind, black: PlayerKind, skill_level: u8) -> Self {
        let mut state = Self {
            game,
            players: [white, black],
            skill_level,
            ui_state: UiState {
                selected_square: None,
                highlighted_squares: Vec::new(),
                selectable_squares: Vec::new(),
                status_message: None,
                input_phase: InputPhase::SelectPiece,
                selected_promotion_piece: Piece::Queen,
                show_debug_panel: false,
                provider_log: VecDeque::new(),
                protocol_log: VecDeque::new(),
                flipped: false,
                view_ply: None,
                board_area: None,
                history_area: None,
            },
            session: 0,
            providers: [None, None],
            provider_names: [None, None],
            selector: MoveSelector::default(),
            generation: 0,
            pending: None,
            parked: None,
        };
        state.update_selectable_squares();
        state
    }

    pub fn with_selector(mut self, selector: MoveSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn player(&self, side: PieceColor) -> PlayerKind {
        self.players[side.index()]
    }

    /// Display name for a side, used in panels and PGN tags.
    pub fn player_name(&self, side: PieceColor) -> String {
        match (&self.provider_names[side.index()], self.player(side)) {
            (Some(name), PlayerKind::Engine) => format!("{} (skill {})", name, self.skill_level),
            (Some(name), _) => name.clone(),
            (None, kind) => kind.label().to_string(),
        }
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.game.side_to_move().into()
    }

    pub fn is_human_turn(&self) -> bool {
        !self.player(self.side_to_move()).is_automated()
    }

    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    // ---- Providers ----

    pub fn attach_provider(&mut self, side: PieceColor, provider: Box<dyn MoveProvider>) {
        self.provider_names[side.index()] = Some(provider.name().to_string());
        self.log_provider(
            Some(side),
            LogLevel::Info,
            format!("{} plays {}", provider.name(), side),
        );
        self.providers[side.index()] = Some(provider);
    }

    /// The provider for `side` could not be built: a human takes over that side.
    pub fn fall_back_to_human(&mut self, side: PieceColor, error: &ProviderError) {
        let kind = self.player(side);
        tracing::warn!("{} unavailable for {}: {}", kind, side, error);
        self.players[side.index()] = PlayerKind::Human;
        self.provider_names[side.index()] = None;
        self.log_provider(
            Some(side),
            LogLevel::Warn,
            format!("{} unavailable ({}), human plays {}", kind, error, side),
        );
        self.ui_state.status_message =
            Some(format!("{} unavailable: you play {}", kind.label(), side));
    }

    /// Providers currently parked in their slots, for shutdown.
    pub fn take_providers(&mut self) -> Vec<Box<dyn MoveProvider>> {
        self.providers.iter_mut().filter_map(Option::take).collect()
    }

    /// Hand out the next automated turn, if one is due.
    ///
    /// Nothing is requested while viewing history, while another request is
    /// in flight, or once the game is over.
    pub fn next_request(&mut self) -> Option<ProviderRequest> {
        if self.pending.is_some()
            || self.parked.is_some()
            || !self.is_live()
            || self.game.is_game_over()
        {
            return None;
        }
        let side = self.side_to_move();
        if !self.player(side).is_automated() {
            return None;
        }
        let provider = self.providers[side.index()].take()?;

        self.generation += 1;
        self.pending = Some(PendingRequest {
            generation: self.generation,
            side,
        });
        self.ui_state.status_message = Some(format!("{} is thinking...", provider.name()));
        tracing::debug!("Requesting move from {} for {}", provider.name(), side);

        Some(ProviderRequest {
            session: self.session,
            generation: self.generation,
            side,
            provider,
            game: self.game.clone(),
            selector: self.selector,
        })
    }

    /// Forget the request in flight; its answer will be dropped.
    pub fn cancel_pending(&mut self) {
        self.parked = None;
        if self.pending.take().is_some() {
            self.generation += 1;
            tracing::debug!("Cancelled pending provider request");
        }
    }

    pub fn apply_reply(&mut self, reply: ProviderReply) -> ReplyOutcome {
        if reply.session != self.session {
            return ReplyOutcome::Orphaned(reply.provider);
        }

        let ProviderReply {
            generation,
            side,
            provider,
            result,
            transcript,
            ..
        } = reply;
        let name = provider.name().to_string();
        self.providers[side.index()] = Some(provider);
        for line in transcript {
            self.log_protocol(side, &line);
        }

        let current = self.pending.is_some_and(|p| p.generation == generation);
        if !current {
            tracing::debug!("Dropping stale reply from {} (generation {})", name, generation);
            return ReplyOutcome::Stale;
        }
        self.pending = None;

        let selection = match result {
            Ok(selection) => selection,
            Err(e) => {
                self.log_provider(Some(side), LogLevel::Warn, e.to_string());
                return ReplyOutcome::Stale;
            }
        };

        for record in &selection.log {
            let level = match record.outcome {
                players::AttemptOutcome::Accepted { .. } => LogLevel::Info,
                _ => LogLevel::Warn,
            };
            self.log_provider(Some(side), level, format!("{} {}", name, record));
        }

        if !self.is_live() {
            tracing::debug!("Holding {} from {} until replay ends", selection.uci, name);
            self.parked = Some(ParkedMove {
                side,
                name,
                selection,
            });
            return ReplyOutcome::Parked;
        }
        self.play_selection(side, &name, selection)
    }

    fn play_selection(
        &mut self,
        side: PieceColor,
        name: &str,
        selection: Selection,
    ) -> ReplyOutcome {
        match self.game.make_move(selection.mv) {
            Ok(entry) => {
                let note = match selection.source {
                    MoveSource::Provider { .. } => format!("{} played {}", name, entry.san),
                    MoveSource::RandomFallback => {
                        self.log_provider(
                            Some(side),
                            LogLevel::Warn,
                            format!("{} gave no legal move, random {}", name, entry.san),
                        );
                        format!("{} failed, random move {}", name, entry.san)
                    }
                };
                self.after_move(note);
                ReplyOutcome::Applied
            }
            Err(e) => {
                self.log_provider(Some(side), LogLevel::Warn, e.to_string());
                ReplyOutcome::Stale
            }
        }
    }

    // ---- Logs ----

    pub fn log_provider(&mut self, side: Option<PieceColor>, level: LogLevel, message: String) {
        self.ui_state.provider_log.push_back(ProviderLogEntry {
            side,
            level,
            message,
        });
        while self.ui_state.provider_log.len() > LOG_LIMIT {
            self.ui_state.provider_log.pop_front();
        }
    }

    /// Record one transcript line; ">> " and "<< " prefixes give the direction.
    pub fn log_protocol(&mut self, side: PieceColor, line: &str) {
        let (direction, message) = if let Some(rest) = line.strip_prefix(">> ") {
            (ProtocolDirection::Outgoing, rest)
        } else if let Some(rest) = line.strip_prefix("<< ") {
            (ProtocolDirection::Incoming, rest)
        } else {
            (ProtocolDirection::Note, line)
        };
        self.ui_state.protocol_log.push_back(ProtocolLogEntry {
            side,
            direction,
            message: message.to_string(),
        });
        while self.ui_state.protocol_log.len() > LOG_LIMIT {
            self.ui_state.protocol_log.pop_front();
        }
    }

    /// Toggle debug panel visibility
    pub fn toggle_debug_panel(&mut self) {
        self.ui_state.show_debug_panel = !self.ui_state.show_debug_panel;
    }

    pub fn toggle_flip(&mut self) {
        self.ui_state.flipped = !self.ui_state.flipped;
    }

    // ---- Replay ----

    pub fn is_live(&self) -> bool {
        self.ui_state.view_ply.is_none()
    }

    /// Ply shown on the board.
    pub fn displayed_ply(&self) -> usize {
        self.ui_state.view_ply.unwrap_or(self.game.ply_count())
    }

    pub fn displayed_board(&self) -> &cozy_chess::Board {
        self.game
            .position_at(self.displayed_ply())
            .unwrap_or_else(|_| self.game.position())
    }

    /// From/to squares of the move that led to the displayed position.
    pub fn displayed_last_move(&self) -> Option<(Square, Square)> {
        let ply = self.displayed_ply();
        ply.checked_sub(1)
            .and_then(|i| self.game.history().get(i))
            .map(|entry| (entry.from, entry.to))
    }

    /// Jump to the position after `ply` half-moves; the last ply returns to live play.
    pub fn go_to_ply(&mut self, ply: usize) {
        let last = self.game.ply_count();
        let target = ply.min(last);
        self.ui_state.view_ply = if target == last { None } else { Some(target) };
        self.reset_selection();
        self.ui_state.status_message = if self.is_live() {
            None
        } else {
            Some(format!("Viewing ply {}/{} (End to resume)", target, last))
        };

        if self.is_live() {
            if let Some(ParkedMove {
                side,
                name,
                selection,
            }) = self.parked.take()
            {
                self.play_selection(side, &name, selection);
            }
        }
    }

    pub fn view_prev(&mut self) {
        let current = self.displayed_ply();
        if current > 0 {
            self.go_to_ply(current - 1);
        }
    }

    pub fn view_next(&mut self) {
        let current = self.displayed_ply();
        if current < self.game.ply_count() {
            self.go_to_ply(current + 1);
        }
    }

    pub fn view_start(&mut self) {
        self.go_to_ply(0);
    }

    pub fn view_end(&mut self) {
        self.go_to_ply(self.game.ply_count());
    }

    // ---- Human input ----

    /// A square was clicked or typed.
    pub fn handle_square_input(&mut self, square: Square) {
        if matches!(self.ui_state.input_phase, InputPhase::SelectPromotion { .. }) {
            return;
        }
        if !self.is_live() {
            self.ui_state.status_message =
                Some("Viewing history: press End to return to the game".to_string());
            return;
        }
        if self.game.is_game_over() {
            self.ui_state.status_message = self.game.result().map(|r| r.describe());
            return;
        }
        if !self.is_human_turn() {
            self.ui_state.status_message =
                Some(format!("Waiting for {}", self.player_name(self.side_to_move())));
            return;
        }

        if self.ui_state.selected_square.is_some()
            && self.ui_state.highlighted_squares.contains(&square)
        {
            if let Err(e) = self.try_move_to(square) {
                self.ui_state.status_message = Some(e);
            }
            return;
        }

        let own_piece = self.game.position().color_on(square) == Some(self.game.side_to_move());
        if own_piece {
            self.select_square(square);
        } else {
            self.clear_selection();
        }
    }

    /// Update the list of squares with pieces that can be selected
    pub fn update_selectable_squares(&mut self) {
        let mut squares: Vec<Square> = self.game.legal_moves().iter().map(|mv| mv.from).collect();
        squares.sort_by_key(|sq| *sq as usize);
        squares.dedup();
        self.ui_state.selectable_squares = squares;
    }

    /// Filter selectable squares by partial input (typeahead)
    pub fn filter_selectable_by_input(&self, input: &str) -> Vec<Square> {
        let mut chars = input.chars();
        let Some(file) = chars.next().and_then(chess::square::parse_file) else {
            return vec![];
        };
        let rank = chars.next().and_then(chess::square::parse_rank);

        self.ui_state
            .selectable_squares
            .iter()
            .filter(|sq| sq.file() == file && rank.map_or(true, |r| sq.rank() == r))
            .copied()
            .collect()
    }

    /// Select a square and highlight legal moves for the piece on it
    pub fn select_square(&mut self, square: Square) {
        let piece_color = self.game.position().color_on(square);
        let current_player = self.game.side_to_move();

        if let Some(color) = piece_color {
            if color == current_player {
                self.ui_state.selected_square = Some(square);
                self.ui_state.highlighted_squares = self
                    .destinations_from(square)
                    .into_iter()
                    .map(|(to, _)| to)
                    .collect();
                self.ui_state.input_phase = InputPhase::SelectDestination;
                self.ui_state.status_message =
                    Some(format!("Selected {}", chess::format_square(square)));
            } else {
                self.ui_state.status_message = Some("That's not your piece!".to_string());
            }
        } else {
            self.ui_state.status_message = Some("No piece on that square".to_string());
        }
    }

    /// Attempt to move the selected piece to the destination square
    pub fn try_move_to(&mut self, to_square: Square) -> Result<(), String> {
        let from_square = self
            .ui_state
            .selected_square
            .ok_or_else(|| "No piece selected".to_string())?;

        let mv = self
            .destinations_from(from_square)
            .into_iter()
            .find(|(to, _)| *to == to_square)
            .map(|(_, mv)| mv)
            .ok_or_else(|| "Illegal move".to_string())?;

        if needs_promotion(&self.game, mv) {
            self.ui_state.input_phase = InputPhase::SelectPromotion {
                from: from_square,
                to: to_square,
            };
            self.ui_state.selected_promotion_piece = Piece::Queen;
            self.ui_state.status_message = Some("Select promotion piece".to_string());
            return Ok(());
        }

        let entry = self.game.make_move(mv).map_err(|e| e.to_string())?;
        self.after_move(format!("You played {}", entry.san));
        Ok(())
    }

    /// Clear the current selection and highlights
    pub fn clear_selection(&mut self) {
        self.reset_selection();
        self.ui_state.status_message = None;
    }

    /// Execute a promotion move after piece selection
    pub fn execute_promotion(
        &mut self,
        from: Square,
        to: Square,
        piece: Piece,
    ) -> Result<(), String> {
        let mv = Move {
            from,
            to,
            promotion: Some(piece),
        };

        if !self.game.legal_moves().contains(&mv) {
            return Err("Invalid promotion move".to_string());
        }

        let entry = self.game.make_move(mv).map_err(|e| e.to_string())?;
        self.after_move(format!(
            "Promoted to {} ({})",
            chess::square::piece_name(piece),
            entry.san
        ));
        Ok(())
    }

    /// Cancel promotion selection and return to piece selection
    pub fn cancel_promotion(&mut self) {
        self.reset_selection();
        self.ui_state.status_message = Some("Promotion cancelled".to_string());
    }

    /// Cycle promotion piece selection
    pub fn cycle_promotion_piece(&mut self, direction: i8) {
        let pieces = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

        let current_idx = pieces
            .iter()
            .position(|&p| p == self.ui_state.selected_promotion_piece)
            .unwrap_or(0);

        let new_idx = if direction > 0 {
            (current_idx + 1) % pieces.len()
        } else if direction < 0 {
            (current_idx + pieces.len() - 1) % pieces.len()
        } else {
            current_idx
        };

        self.ui_state.selected_promotion_piece = pieces[new_idx];
    }

    /// Set promotion piece directly
    pub fn set_promotion_piece(&mut self, piece: Piece) {
        self.ui_state.selected_promotion_piece = piece;
    }

    /// Take back moves until a human is to move again.
    ///
    /// Against an automated opponent this is usually two plies. With no
    /// human at the board a single ply is undone.
    pub fn undo_to_human(&mut self) {
        self.cancel_pending();
        self.ui_state.view_ply = None;

        let any_human = self.players.iter().any(|p| !p.is_automated());
        let mut undone = 0;
        while self.game.undo().is_ok() {
            undone += 1;
            if !any_human || self.is_human_turn() {
                break;
            }
        }

        self.reset_selection();
        self.ui_state.status_message = Some(match undone {
            0 => "Nothing to undo".to_string(),
            1 => "Undid 1 move".to_string(),
            n => format!("Undid {} moves", n),
        });
    }

    /// Write the game as PGN into `dir`, returning the file path.
    pub fn export_pgn(&mut self, dir: &Path) -> std::io::Result<PathBuf> {
        for side in PieceColor::BOTH {
            let name = self.player_name(side);
            self.game.set_tag(side.title(), name);
        }
        self.game.set_tag("Site", "ChessTTY");

        std::fs::create_dir_all(dir)?;
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = dir.join(format!("chesstty-{}.pgn", stamp));
        std::fs::write(&path, self.game.to_pgn())?;
        tracing::info!("Exported PGN to {}", path.display());
        Ok(path)
    }

    /// Legal destinations for the piece on `from`. Castling is reachable
    /// through both the king's target square and the rook's square.
    fn destinations_from(&self, from: Square) -> Vec<(Square, Move)> {
        let board = self.game.position();
        let mut out = Vec::new();
        for mv in self.game.legal_moves_from(from) {
            if mv.promotion.is_some_and(|p| p != Piece::Queen) {
                continue;
            }
            out.push((mv.to, mv));
            if chess::is_castling(board, mv) {
                let uci = chess::format_uci_move(board, mv);
                if let Some(king_to) = uci.get(2..4).and_then(chess::parse_square) {
                    out.push((king_to, mv));
                }
            }
        }
        out
    }

    fn after_move(&mut self, message: String) {
        self.reset_selection();
        self.ui_state.status_message = Some(match self.game.result() {
            Some(result) => format!("{}. {}", message, result.describe()),
            None => message,
        });
    }

    fn reset_selection(&mut self) {
        self.ui_state.selected_square = None;
        self.ui_state.highlighted_squares.clear();
        self.ui_state.input_phase = InputPhase::SelectPiece;
        self.update_selectable_squares();
    }
}

fn needs_promotion(game: &Game, mv: Move) -> bool {
    game.position().piece_on(mv.from) == Some(Piece::Pawn)
        && matches!(mv.to.rank(), Rank::Eighth | Rank::First)
}
