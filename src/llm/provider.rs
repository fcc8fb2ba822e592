use std::error::Error;
use std::fmt::{Display, Formatter};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No usable credential; no request was sent.
    Configuration,
    /// The service answered with an error (bad key, quota, invalid request).
    Service(String),
    /// Anything else: transport failure, unexpected payload, empty answer.
    Generic(String),
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(
                f,
                "ERROR: {API_KEY_ENV} not found. Please set your API key in your environment variables."
            ),
            Self::Service(msg) => write!(
                f,
                "An AI API error occurred: {msg}. Check your API key's validity."
            ),
            Self::Generic(msg) => write!(f, "An unexpected error occurred: {msg}"),
        }
    }
}

impl Error for CompletionError {}

pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

pub trait CompletionClient {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = CompletionResult<String>> + Send;
}
