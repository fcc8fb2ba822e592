use crate::cli::theme::{Theme, ThemeToken};
use crate::tutor::{Speaker, Transcript, Turn};
use ratatui::text::{Line, Span};

pub(crate) const WELCOME_TEXT: &str =
    "Hello! I'm TutorAI, an expert, adaptive tutor. Ask me anything about Python!";
pub(crate) const THINKING_TEXT: &str =
    "TutorAI is thinking, analyzing your knowledge, and adapting the best explanation...";

const STUDENT_PROMPT: &str = "you> ";
const STUDENT_INDENT: &str = "     ";
const TUTOR_LABEL: &str = "TutorAI:";
const QUESTION_PREVIEW_CHARS: usize = 50;
const ANSWER_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Info,
    Warning,
}

/// A system message shown between turns. It is never part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    anchor: usize,
    kind: NoticeKind,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    /// `anchor` is the transcript length when the notice was raised.
    pub(crate) fn push(&mut self, anchor: usize, kind: NoticeKind, text: impl Into<String>) {
        self.items.push(Notice {
            anchor,
            kind,
            text: text.into(),
        });
    }

    fn anchored_at(&self, anchor: usize) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter(move |notice| notice.anchor == anchor)
    }
}

pub(crate) fn render_lines(
    transcript: &Transcript,
    notices: &Notices,
    responding: bool,
    theme: &Theme,
    width: u16,
) -> Vec<Line<'static>> {
    let width = usize::from(width).max(STUDENT_PROMPT.len() + 1);
    let mut lines = Vec::new();
    push_styled(
        &mut lines,
        WELCOME_TEXT,
        theme.style(ThemeToken::SystemInfo),
        width,
    );
    lines.push(Line::from(""));

    for (index, turn) in transcript.turns().iter().enumerate() {
        render_notices(&mut lines, notices, index, theme, width);
        render_turn(&mut lines, turn, theme, width);
    }
    render_notices(&mut lines, notices, transcript.len(), theme, width);

    if responding {
        push_styled(
            &mut lines,
            THINKING_TEXT,
            theme.style(ThemeToken::TutorThinking),
            width,
        );
    }

    lines
}

fn render_notices(
    lines: &mut Vec<Line<'static>>,
    notices: &Notices,
    anchor: usize,
    theme: &Theme,
    width: usize,
) {
    for notice in notices.anchored_at(anchor) {
        let token = match notice.kind {
            NoticeKind::Info => ThemeToken::SystemInfo,
            NoticeKind::Warning => ThemeToken::SystemWarning,
        };
        push_styled(lines, &notice.text, theme.style(token), width);
    }
}

fn render_turn(lines: &mut Vec<Line<'static>>, turn: &Turn, theme: &Theme, width: usize) {
    match turn.speaker() {
        Speaker::Student => {
            let text_width = width - STUDENT_PROMPT.len();
            let text_style = theme.style(ThemeToken::StudentText);
            for (idx, row) in wrap_text(turn.text(), text_width).into_iter().enumerate() {
                let lead = if idx == 0 {
                    Span::styled(STUDENT_PROMPT, theme.style(ThemeToken::StudentPrompt))
                } else {
                    Span::raw(STUDENT_INDENT)
                };
                lines.push(Line::from(vec![lead, Span::styled(row, text_style)]));
            }
        }
        Speaker::Tutor => {
            lines.push(Line::from(Span::styled(
                TUTOR_LABEL,
                theme.style(ThemeToken::TutorLabel),
            )));
            let token = if turn.is_failure() {
                ThemeToken::TutorError
            } else {
                ThemeToken::TutorText
            };
            push_styled(lines, turn.text(), theme.style(token), width);
            lines.push(Line::from(""));
        }
    }
}

fn push_styled(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    style: ratatui::style::Style,
    width: usize,
) {
    lines.extend(
        wrap_text(text, width)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, style))),
    );
}

/// Summary of the latest exchanges, question first, as shown by `/history`.
pub(crate) fn history_summary(transcript: &Transcript, limit: usize) -> String {
    let exchanges = transcript.exchanges();
    if exchanges.is_empty() {
        return "No previous interactions yet.".to_string();
    }

    let skip = exchanges.len().saturating_sub(limit);
    let shown = exchanges.len() - skip;
    let mut out = format!("Previous interactions (last {shown}):");
    for (offset, exchange) in exchanges.iter().skip(skip).enumerate() {
        out.push_str(&format!(
            "\n  {}. Student: {}",
            skip + offset + 1,
            preview(exchange.question.text(), QUESTION_PREVIEW_CHARS)
        ));
        let answer = exchange
            .answer
            .map(|turn| preview(turn.text(), ANSWER_PREVIEW_CHARS))
            .unwrap_or_else(|| "(waiting for an answer)".to_string());
        out.push_str(&format!("\n     TutorAI: {answer}"));
    }
    out
}

fn preview(text: &str, limit: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        return flat;
    }
    format!("{}...", flat.chars().take(limit).collect::<String>())
}

/// Greedy word wrap that keeps leading indentation and hard-splits long words.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r').replace('\t', "    ");
        wrap_line(&line, width, &mut rows);
    }
    rows
}

fn wrap_line(line: &str, width: usize, rows: &mut Vec<String>) {
    let first_row = rows.len();
    let mut current = String::new();
    let mut current_len = 0usize;

    for token in split_runs(line) {
        let token_len = token.chars().count();
        if current_len + token_len <= width {
            current.push_str(token);
            current_len += token_len;
            continue;
        }

        if token.starts_with(' ') {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
            continue;
        }

        if current_len > 0 {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }

        let chars = token.chars().collect::<Vec<_>>();
        for chunk in chars.chunks(width) {
            if chunk.len() == width {
                rows.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }

    if !current.is_empty() || rows.len() == first_row {
        rows.push(current);
    }
}

/// Splits into alternating runs of spaces and non-spaces.
fn split_runs(line: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (idx, ch) in line.char_indices() {
        let is_space = ch == ' ';
        match in_space {
            Some(prev) if prev != is_space => {
                runs.push(&line[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if start < line.len() {
        runs.push(&line[start..]);
    }
    runs
}
