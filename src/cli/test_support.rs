use crate::cli::repl::{AppState, KeyOutcome, UiRegions, UiStateView, draw, regions_for};
use crate::cli::theme::Theme;
use crate::config::ThemePreset;
use crate::llm::provider::{CompletionClient, CompletionError, CompletionResult};
use crate::trace::SessionTrace;
use crate::tutor::{ContextOptions, Session};
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Completion client that replays canned results and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<CompletionResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<CompletionResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = CompletionResult<String>> + Send {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Generic("no scripted reply left".to_string())));
        async move { reply }
    }
}

pub fn deterministic_app_state(
    session_id: &str,
    replies: Vec<CompletionResult<String>>,
) -> Result<AppState<ScriptedClient>> {
    let trace_dir = std::env::temp_dir().join("tutorai-ui-tests");
    let trace = SessionTrace::create_in_temp_dir(session_id, &trace_dir)?;
    Ok(AppState::new(
        Session::new(session_id, ContextOptions::chat()),
        ScriptedClient::new(replies),
        trace,
        Theme::new(ThemePreset::Default, false),
    ))
}

/// Drives the real key handling and drawing code against an in-memory terminal.
pub struct UiHarness {
    terminal: Terminal<TestBackend>,
    state: AppState<ScriptedClient>,
}

impl UiHarness {
    pub fn new(width: u16, height: u16, state: AppState<ScriptedClient>) -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(width, height))?;
        Ok(Self { terminal, state })
    }

    pub fn render(&mut self) -> Result<()> {
        let state = &self.state;
        self.terminal.draw(|frame| draw(frame, state))?;
        Ok(())
    }

    pub async fn send_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.state.handle_key(key) {
            KeyOutcome::Continue | KeyOutcome::Quit => {}
            KeyOutcome::Submit(line) => {
                let terminal = &mut self.terminal;
                self.state
                    .submit(line, |current| {
                        terminal.draw(|frame| draw(frame, current))?;
                        Ok(())
                    })
                    .await?;
            }
        }
        self.render()
    }

    pub fn buffer_lines(&self) -> Vec<String> {
        let buffer = self.terminal.backend().buffer();
        let area = buffer.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    pub fn line(&self, row: u16) -> Option<String> {
        self.buffer_lines().into_iter().nth(usize::from(row))
    }

    pub fn regions(&self) -> Result<UiRegions> {
        let size = self.terminal.size()?;
        Ok(regions_for(
            Rect::new(0, 0, size.width, size.height),
            &self.state,
        ))
    }

    pub fn ui_state_view(&self) -> UiStateView {
        self.state.ui_state_view()
    }

    pub fn state(&self) -> &AppState<ScriptedClient> {
        &self.state
    }

    pub fn session(&self) -> &Session {
        self.state.session()
    }
}
