pub mod prompt;
pub mod session;
pub mod transcript;

pub use prompt::{ContextOptions, PromptContext, compose};
pub use session::{PendingQuestion, Session, SessionError, SessionState};
pub use transcript::{Exchange, Speaker, Transcript, Turn, TurnStatus};
