use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "tutorai")]
#[command(
    about = "Adaptive Python tutor in your terminal",
    long_about = "Adaptive Python tutor in your terminal\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/tutorai/config.toml\n    2. ~/.config/tutorai/config.toml\n\nThe API key is read from GEMINI_API_KEY (a .env file in the working directory is honored)."
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print HTTP request and response details to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}
