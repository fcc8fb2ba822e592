#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    Student,
    Tutor,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Tutor => "Tutor",
        }
    }
}

/// Whether a tutor turn carries a real answer or a surfaced completion error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Answer,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
    status: TurnStatus,
}

impl Turn {
    pub fn student(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Student,
            text: text.into(),
            status: TurnStatus::Answer,
        }
    }

    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Tutor,
            text: text.into(),
            status: TurnStatus::Answer,
        }
    }

    pub fn tutor_failure(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Tutor,
            text: text.into(),
            status: TurnStatus::Failed,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn is_failure(&self) -> bool {
        self.status == TurnStatus::Failed
    }
}

/// A student question paired with the tutor turn that answered it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange<'a> {
    pub question: &'a Turn,
    pub answer: Option<&'a Turn>,
}

/// Append-only record of a tutoring session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn recent_window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn exchanges(&self) -> Vec<Exchange<'_>> {
        let mut exchanges = Vec::new();
        let mut turns = self.turns.iter().peekable();

        while let Some(turn) = turns.next() {
            if turn.speaker() != Speaker::Student {
                continue;
            }

            let answer = turns.next_if(|next| next.speaker() == Speaker::Tutor);
            exchanges.push(Exchange {
                question: turn,
                answer,
            });
        }

        exchanges
    }
}
