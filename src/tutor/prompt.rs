use super::transcript::{Speaker, Turn};

pub const HISTORY_PLACEHOLDER: &str = "None";

pub const SYLLABUS: [&str; 13] = [
    "Python Overview",
    "Variables",
    "Data Types",
    "Operators",
    "Control Structures (if/else, loops, nested)",
    "Functions",
    "Lists/Tuples/Dictionaries/Sets",
    "List Comprehensions",
    "Exception Handling",
    "Regex",
    "Basic OOP (Classes, Objects, Encapsulation, Inheritance, Polymorphism)",
    "File Handling",
    "Python with MySQL",
];

const TUTORING_STRATEGY: &str = "\
* **Diagnosis & NLU:** First, analyze the student's query for **misconceptions** or confusion.
* **Adaptive Response:** Provide a **step-by-step, brief explanation** tailored to their confusion. Use **analogies** and **simple, correct Python code examples** relevant to IT students.
* **Hints:** If the question implies a problem-solving attempt, offer a gentle **hint** first, before giving the full solution.
* **Progress Tracking:** Acknowledge the student's previous interaction (if available in history) to simulate personalized learning and continuity.
* **Format:** Use Markdown formatting (bolding, code blocks) for professional clarity.";

const MANDATORY_ADDITIONS: &str = "\
* **The Beauty:** Always include a short, encouraging paragraph on the **beauty and importance of the Python concept** they asked about.
* **Career Tip:** Always follow that with a brief tip on a **career option** directly related to that specific Python concept (e.g., if they ask about OOP, mention **Software Development/Engineering**).";

/// How much of the transcript is handed to the model with each question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Number of trailing turns to include; `None` sends the whole transcript.
    pub window: Option<usize>,
    /// Cut tutor answers to this many characters before sending them back.
    pub summary_chars: Option<usize>,
}

impl ContextOptions {
    pub const DEFAULT_WINDOW: usize = 10;
    pub const FORM_SUMMARY_CHARS: usize = 100;

    pub fn chat() -> Self {
        Self {
            window: Some(Self::DEFAULT_WINDOW),
            summary_chars: None,
        }
    }

    pub fn form() -> Self {
        Self {
            window: None,
            summary_chars: Some(Self::FORM_SUMMARY_CHARS),
        }
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::chat()
    }
}

/// The question plus the history it is asked against, ready for composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub question: String,
    pub history: Vec<Turn>,
}

impl PromptContext {
    pub fn build(question: &str, window: &[Turn], options: &ContextOptions) -> Self {
        let history = window
            .iter()
            .map(|turn| match (turn.speaker(), options.summary_chars) {
                (Speaker::Tutor, Some(limit)) => summarize_turn(turn, limit),
                _ => turn.clone(),
            })
            .collect();

        Self {
            question: question.to_string(),
            history,
        }
    }

    pub fn render(&self) -> String {
        compose(&self.question, &self.history)
    }
}

pub fn compose(question: &str, history: &[Turn]) -> String {
    let syllabus = SYLLABUS.join(", ");
    let history = render_history(history);

    format!(
        "You are **TutorAI**, an expert, personalized, one-on-one tutor for a third-year IT student learning basic Python.
Your teaching must be **adaptive, encouraging, and immediately address misconceptions**.

**1. DOMAIN KNOWLEDGE (Syllabus):** Your expertise covers ONLY: {syllabus}.

**2. TUTORING STRATEGY & FEEDBACK:**
{TUTORING_STRATEGY}

**3. MANDATORY ADDITIONS (Career/Beauty):**
{MANDATORY_ADDITIONS}

**4. CURRENT CONTEXT:**
* **Student's Previous Interactions (History):**
{history}
* **Student's Current Query:** {question}

Respond **only** with the tutoring content, following all the above rules. Do not include any conversational filler like \"Hello,\" or \"I see.\" Start directly with the diagnosis and explanation.
"
    )
}

fn render_history(history: &[Turn]) -> String {
    if history.is_empty() {
        return HISTORY_PLACEHOLDER.to_string();
    }

    history
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker().label(), turn.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn summarize_turn(turn: &Turn, limit: usize) -> Turn {
    if turn.text().chars().count() <= limit {
        return turn.clone();
    }

    let summary = format!("{}...", turn.text().chars().take(limit).collect::<String>());
    if turn.is_failure() {
        Turn::tutor_failure(summary)
    } else {
        Turn::tutor(summary)
    }
}
