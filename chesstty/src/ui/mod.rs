pub mod app;
pub mod widgets;

pub use app::{run_app, LaunchOptions};
