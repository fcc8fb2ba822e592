use crate::cli::commands::{
    Command, DEFAULT_HISTORY_ITEMS, HELP_TEXT, is_command_line, is_exit_word, parse_command,
};
use crate::cli::theme::{Theme, ThemeToken};
use crate::cli::timeline::{NoticeKind, Notices, history_summary, render_lines};
use crate::llm::provider::CompletionClient;
use crate::trace::SessionTrace;
use crate::tutor::Session;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Terminal;
use std::io;
use std::time::Duration;

const STUDENT_PROMPT: &str = "you> ";
const COMMAND_PROMPT: &str = "cmd> ";
const MAX_INPUT_ROWS: usize = 6;
const PAGE_SCROLL: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiRegions {
    pub timeline: Rect,
    pub input: Rect,
    pub status: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiStateView {
    pub prompt: &'static str,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Continue,
    Submit(String),
    Quit,
}

#[derive(Debug, Default)]
struct UiState {
    input: String,
    input_history: Vec<String>,
    history_cursor: Option<usize>,
    draft: String,
    scroll_from_bottom: usize,
    notices: Notices,
    should_quit: bool,
}

pub struct AppState<C> {
    session: Session,
    client: C,
    trace: SessionTrace,
    theme: Theme,
    ui: UiState,
}

impl<C: CompletionClient> AppState<C> {
    pub fn new(session: Session, client: C, trace: SessionTrace, theme: Theme) -> Self {
        Self {
            session,
            client,
            trace,
            theme,
            ui: UiState::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn trace(&self) -> &SessionTrace {
        &self.trace
    }

    pub fn should_quit(&self) -> bool {
        self.ui.should_quit
    }

    pub fn ui_state_view(&self) -> UiStateView {
        UiStateView {
            prompt: self.prompt(),
            input: self.ui.input.clone(),
        }
    }

    fn prompt(&self) -> &'static str {
        if is_command_line(&self.ui.input) {
            COMMAND_PROMPT
        } else {
            STUDENT_PROMPT
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => KeyOutcome::Quit,
                KeyCode::Char('j') => {
                    self.ui.input.push('\n');
                    KeyOutcome::Continue
                }
                _ => KeyOutcome::Continue,
            };
        }

        match key.code {
            KeyCode::Enter => {
                if self.session.is_responding() {
                    return KeyOutcome::Continue;
                }
                self.ui.history_cursor = None;
                KeyOutcome::Submit(std::mem::take(&mut self.ui.input))
            }
            KeyCode::Char(ch) => {
                self.ui.input.push(ch);
                self.ui.history_cursor = None;
                KeyOutcome::Continue
            }
            KeyCode::Backspace => {
                self.ui.input.pop();
                KeyOutcome::Continue
            }
            KeyCode::Esc => {
                self.ui.input.clear();
                self.ui.history_cursor = None;
                KeyOutcome::Continue
            }
            KeyCode::Up => {
                self.recall_previous();
                KeyOutcome::Continue
            }
            KeyCode::Down => {
                self.recall_next();
                KeyOutcome::Continue
            }
            KeyCode::PageUp => {
                self.ui.scroll_from_bottom = self.ui.scroll_from_bottom.saturating_add(PAGE_SCROLL);
                KeyOutcome::Continue
            }
            KeyCode::PageDown => {
                self.ui.scroll_from_bottom = self.ui.scroll_from_bottom.saturating_sub(PAGE_SCROLL);
                KeyOutcome::Continue
            }
            KeyCode::End => {
                self.ui.scroll_from_bottom = 0;
                KeyOutcome::Continue
            }
            _ => KeyOutcome::Continue,
        }
    }

    fn recall_previous(&mut self) {
        if self.ui.input_history.is_empty() {
            return;
        }
        let next = match self.ui.history_cursor {
            None => {
                self.ui.draft = self.ui.input.clone();
                self.ui.input_history.len() - 1
            }
            Some(idx) => idx.saturating_sub(1),
        };
        self.ui.history_cursor = Some(next);
        self.ui.input = self.ui.input_history[next].clone();
    }

    fn recall_next(&mut self) {
        let Some(idx) = self.ui.history_cursor else {
            return;
        };
        if idx + 1 < self.ui.input_history.len() {
            self.ui.history_cursor = Some(idx + 1);
            self.ui.input = self.ui.input_history[idx + 1].clone();
        } else {
            self.ui.history_cursor = None;
            self.ui.input = std::mem::take(&mut self.ui.draft);
        }
    }

    /// Handles one submitted line. `redraw` runs after the question is recorded
    /// and before the tutor is asked, so the thinking indicator is visible.
    pub(crate) async fn submit<F>(&mut self, line: String, mut redraw: F) -> Result<()>
    where
        F: FnMut(&Self) -> Result<()>,
    {
        let line = line.trim_end().to_string();
        if !line.trim().is_empty() && self.ui.input_history.last() != Some(&line) {
            self.ui.input_history.push(line.clone());
        }

        if is_exit_word(&line) {
            self.ui.should_quit = true;
            return Ok(());
        }

        let trimmed = line.trim_start();
        if is_command_line(trimmed) {
            self.trace.log_event("command", trimmed);
            self.run_command(trimmed);
            return Ok(());
        }

        let pending = match self.session.begin(&line) {
            Ok(pending) => pending,
            Err(err) => {
                self.notice(NoticeKind::Warning, err.to_string());
                return Ok(());
            }
        };

        self.trace.log_student(&line);
        self.ui.scroll_from_bottom = 0;
        redraw(self)?;

        let result = self.client.complete(pending.prompt()).await;
        let turn = self.session.finish(pending, result);
        if turn.is_failure() {
            self.trace.log_tutor_error(turn.text());
        } else {
            self.trace.log_tutor(turn.text());
        }
        Ok(())
    }

    fn run_command(&mut self, line: &str) {
        match parse_command(line) {
            Ok(Command::Help) => self.notice(NoticeKind::Info, HELP_TEXT),
            Ok(Command::History(limit)) => {
                let summary = history_summary(
                    self.session.transcript(),
                    limit.unwrap_or(DEFAULT_HISTORY_ITEMS),
                );
                self.notice(NoticeKind::Info, summary);
            }
            Ok(Command::Trace) => {
                let text = format!("Trace file: {}", self.trace.file_path().display());
                self.notice(NoticeKind::Info, text);
            }
            Ok(Command::Quit) => self.ui.should_quit = true,
            Err(err) => self.notice(NoticeKind::Warning, err.message()),
        }
    }

    fn notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        let text = text.into();
        self.trace.log_event("notice", &text);
        let anchor = self.session.transcript().len();
        self.ui.notices.push(anchor, kind, text);
        self.ui.scroll_from_bottom = 0;
    }

    fn input_rows(&self) -> usize {
        self.ui.input.split('\n').count().clamp(1, MAX_INPUT_ROWS)
    }
}

pub(crate) fn layout_regions(area: Rect, input_rows: usize) -> UiRegions {
    let input_height = u16::try_from(input_rows + 2).unwrap_or(u16::MAX);
    let [timeline, input, status] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);
    UiRegions {
        timeline,
        input,
        status,
    }
}

pub(crate) fn regions_for<C: CompletionClient>(area: Rect, state: &AppState<C>) -> UiRegions {
    layout_regions(area, state.input_rows())
}

pub(crate) fn draw<C: CompletionClient>(frame: &mut Frame, state: &AppState<C>) {
    let regions = regions_for(frame.area(), state);
    draw_timeline(frame, regions.timeline, state);
    draw_input(frame, regions.input, state);
    draw_status(frame, regions.status, state);
}

fn draw_timeline<C: CompletionClient>(frame: &mut Frame, area: Rect, state: &AppState<C>) {
    let lines = render_lines(
        state.session.transcript(),
        &state.ui.notices,
        state.session.is_responding(),
        &state.theme,
        area.width,
    );

    let visible = usize::from(area.height);
    let max_offset = lines.len().saturating_sub(visible);
    let start = max_offset - state.ui.scroll_from_bottom.min(max_offset);
    let shown = lines.into_iter().skip(start).take(visible).collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(shown), area);
}

fn draw_input<C: CompletionClient>(frame: &mut Frame, area: Rect, state: &AppState<C>) {
    let theme = &state.theme;
    let block = Block::bordered()
        .border_style(theme.style(ThemeToken::Status))
        .style(theme.style(ThemeToken::InputBlock));
    let inner = block.inner(area);

    let prompt = state.prompt();
    let prompt_token = if prompt == COMMAND_PROMPT {
        ThemeToken::CommandPrompt
    } else {
        ThemeToken::StudentPrompt
    };
    let indent = " ".repeat(prompt.len());

    let rows = state.ui.input.split('\n').collect::<Vec<_>>();
    let skip = rows.len().saturating_sub(usize::from(inner.height).max(1));
    let lines = rows
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(idx, row)| {
            let lead = if idx == 0 {
                Span::styled(prompt, theme.style(prompt_token))
            } else {
                Span::raw(indent.clone())
            };
            Line::from(vec![lead, Span::raw((*row).to_string())])
        })
        .collect::<Vec<_>>();

    let last_len = rows.last().map_or(0, |row| row.chars().count());
    let cursor_x = inner
        .x
        .saturating_add(u16::try_from(prompt.len() + last_len).unwrap_or(u16::MAX))
        .min(inner.right().saturating_sub(1));
    let cursor_y = inner
        .y
        .saturating_add(u16::try_from(rows.len() - skip).unwrap_or(1).saturating_sub(1));

    frame.render_widget(Paragraph::new(lines).block(block), area);
    frame.set_cursor_position(Position::new(cursor_x, cursor_y));
}

fn draw_status<C: CompletionClient>(frame: &mut Frame, area: Rect, state: &AppState<C>) {
    let activity = if state.session.is_responding() {
        "Thinking..."
    } else {
        "Idle"
    };
    let text = format!("TutorAI | Session: {} | {activity}", state.session.id());
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            text,
            state.theme.style(ThemeToken::Status),
        ))),
        area,
    );
}

pub async fn run_repl<C: CompletionClient>(state: &mut AppState<C>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, state).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    state.trace.log_event("session", "ended");
    result
}

async fn event_loop<B, C>(terminal: &mut Terminal<B>, state: &mut AppState<C>) -> Result<()>
where
    B: Backend,
    C: CompletionClient,
{
    while !state.should_quit() {
        terminal.draw(|frame| draw(frame, state))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match state.handle_key(key) {
            KeyOutcome::Continue => {}
            KeyOutcome::Quit => state.ui.should_quit = true,
            KeyOutcome::Submit(line) => {
                state
                    .submit(line, |current| {
                        terminal.draw(|frame| draw(frame, current))?;
                        Ok(())
                    })
                    .await?;
            }
        }
    }
    Ok(())
}
