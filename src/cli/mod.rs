mod args;
mod commands;
mod repl;
pub(crate) mod theme;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod timeline;

pub use args::CliArgs;
pub use repl::{AppState, UiRegions, UiStateView, run_repl};
pub use theme::Theme;
