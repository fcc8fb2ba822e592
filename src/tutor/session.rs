use std::error::Error;
use std::fmt::{Display, Formatter};

use super::prompt::{ContextOptions, PromptContext};
use super::transcript::{Transcript, Turn};
use crate::llm::provider::{CompletionClient, CompletionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Responding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    EmptyQuestion,
    Busy,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuestion => {
                write!(f, "Please type your question above to start tutoring!")
            }
            Self::Busy => write!(
                f,
                "TutorAI is still answering your previous question. Please wait."
            ),
        }
    }
}

impl Error for SessionError {}

/// A question that has been recorded and is waiting for the tutor's answer.
///
/// Only [`Session::begin`] creates one, and [`Session::finish`] consumes it, so
/// every student turn is closed by exactly one tutor turn.
#[derive(Debug)]
#[must_use = "a pending question must be finished to return the session to Idle"]
pub struct PendingQuestion {
    prompt: String,
}

impl PendingQuestion {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// One tutoring session: the transcript plus the Idle/Responding flag.
#[derive(Debug)]
pub struct Session {
    id: String,
    transcript: Transcript,
    state: SessionState,
    context: ContextOptions,
}

impl Session {
    pub fn new(id: impl Into<String>, context: ContextOptions) -> Self {
        Self {
            id: id.into(),
            transcript: Transcript::new(),
            state: SessionState::Idle,
            context,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_responding(&self) -> bool {
        self.state == SessionState::Responding
    }

    pub fn context(&self) -> &ContextOptions {
        &self.context
    }

    pub fn begin(&mut self, question: &str) -> Result<PendingQuestion, SessionError> {
        if self.is_responding() {
            return Err(SessionError::Busy);
        }
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        // The window is taken before the new question lands so it is not sent twice.
        let window = match self.context.window {
            Some(n) => self.transcript.recent_window(n),
            None => self.transcript.turns(),
        };
        let prompt = PromptContext::build(question, window, &self.context).render();

        self.transcript.append(Turn::student(question));
        self.state = SessionState::Responding;
        Ok(PendingQuestion { prompt })
    }

    pub fn finish(&mut self, pending: PendingQuestion, result: CompletionResult<String>) -> &Turn {
        drop(pending);
        let turn = match result {
            Ok(text) => Turn::tutor(text),
            Err(err) => Turn::tutor_failure(err.to_string()),
        };
        self.transcript.append(turn);
        self.state = SessionState::Idle;

        let last = self.transcript.turns().len() - 1;
        &self.transcript.turns()[last]
    }

    pub async fn ask<C: CompletionClient>(
        &mut self,
        client: &C,
        question: &str,
    ) -> Result<&Turn, SessionError> {
        let pending = self.begin(question)?;
        let result = client.complete(pending.prompt()).await;
        Ok(self.finish(pending, result))
    }
}
