#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    History(Option<usize>),
    Trace,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const DEFAULT_HISTORY_ITEMS: usize = 5;

pub(crate) const HELP_TEXT: &str = "Available commands:
  /help          Show this command list
  /history [n]   Summarize your last n questions (default 5)
  /trace         Show path to the current trace file
  /quit          Leave TutorAI (exit and quit also work)
Keys: Enter sends, Ctrl-J adds a new line, Up/Down recall input, PgUp/PgDn scroll, Ctrl-C quits.";

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

pub(crate) fn is_exit_word(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    let Some(command_text) = line.trim().strip_prefix('/') else {
        return Err(ParseError::new("not a command"));
    };

    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "history" => parse_history(rest),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        "quit" | "exit" => expect_no_args(rest, Command::Quit, "usage: /quit"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    match rest.parse::<usize>() {
        Ok(0) => Err(ParseError::new("usage: /history [n] (n must be >= 1)")),
        Ok(n) => Ok(Command::History(Some(n))),
        Err(_) => Err(ParseError::new("usage: /history [n]")),
    }
}
