pub mod board;
pub mod controls_panel;
pub mod game_info_panel;
pub mod menu;
pub mod move_history_panel;
pub mod promotion_dialog;
pub mod provider_log_panel;

pub use board::{square_at, BoardWidget, BOARD_HEIGHT, BOARD_WIDTH};
pub use controls_panel::ControlsPanel;
pub use game_info_panel::GameInfoPanel;
pub use menu::{MenuState, MenuWidget};
pub use move_history_panel::{ply_at, MoveHistoryPanel};
pub use promotion_dialog::PromotionWidget;
pub use provider_log_panel::ProviderLogPanel;
