use crate::config::ThemePreset;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ThemeToken {
    StudentPrompt,
    CommandPrompt,
    StudentText,
    TutorLabel,
    TutorText,
    TutorError,
    TutorThinking,
    SystemInfo,
    SystemWarning,
    Status,
    InputBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    preset: ThemePreset,
    enabled: bool,
}

impl Theme {
    pub fn new(preset: ThemePreset, enabled: bool) -> Self {
        Self { preset, enabled }
    }

    /// Colors are dropped when `NO_COLOR` is set to anything.
    pub fn from_env(preset: ThemePreset) -> Self {
        Self::new(preset, std::env::var_os("NO_COLOR").is_none())
    }

    pub(crate) fn style(&self, token: ThemeToken) -> Style {
        if !self.enabled {
            return plain_style(token);
        }

        let palette = Palette::for_preset(self.preset);
        match token {
            ThemeToken::StudentPrompt => Style::default()
                .fg(palette.student)
                .add_modifier(Modifier::BOLD),
            ThemeToken::CommandPrompt => Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::BOLD),
            ThemeToken::StudentText => Style::default().fg(palette.text),
            ThemeToken::TutorLabel => Style::default()
                .fg(palette.tutor)
                .add_modifier(Modifier::BOLD),
            ThemeToken::TutorText => Style::default().fg(palette.tutor),
            ThemeToken::TutorError | ThemeToken::SystemWarning => Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
            ThemeToken::TutorThinking => Style::default()
                .fg(palette.tutor)
                .add_modifier(Modifier::ITALIC),
            ThemeToken::SystemInfo | ThemeToken::Status => Style::default().fg(palette.muted),
            ThemeToken::InputBlock => Style::default().fg(palette.text).bg(palette.input_bg),
        }
    }
}

struct Palette {
    student: Color,
    tutor: Color,
    text: Color,
    muted: Color,
    error: Color,
    input_bg: Color,
}

impl Palette {
    fn for_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Default => Self {
                student: Color::Rgb(158, 206, 106),
                tutor: Color::Rgb(122, 162, 247),
                text: Color::White,
                muted: Color::Rgb(86, 95, 137),
                error: Color::Rgb(247, 118, 142),
                input_bg: Color::Rgb(22, 22, 30),
            },
            ThemePreset::Light => Self {
                student: Color::Rgb(5, 80, 40),
                tutor: Color::Rgb(31, 111, 235),
                text: Color::Rgb(36, 41, 47),
                muted: Color::Rgb(80, 90, 110),
                error: Color::Rgb(176, 0, 32),
                input_bg: Color::Rgb(246, 248, 250),
            },
            ThemePreset::HighContrast => Self {
                student: Color::Rgb(0, 255, 127),
                tutor: Color::Rgb(255, 215, 0),
                text: Color::Rgb(255, 255, 255),
                muted: Color::Rgb(173, 216, 230),
                error: Color::Rgb(255, 64, 64),
                input_bg: Color::Rgb(0, 0, 0),
            },
        }
    }
}

fn plain_style(token: ThemeToken) -> Style {
    match token {
        ThemeToken::StudentPrompt | ThemeToken::TutorLabel | ThemeToken::TutorError => {
            Style::default().add_modifier(Modifier::BOLD)
        }
        _ => Style::default(),
    }
}
