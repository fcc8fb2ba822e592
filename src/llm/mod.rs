pub mod gemini;
pub mod provider;

pub use gemini::{ApiKeySource, GeminiClient};
pub use provider::{CompletionClient, CompletionError, CompletionResult};
