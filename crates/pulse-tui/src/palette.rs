use pulse_core::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub user: Color,
    pub assistant: Color,
    pub code_fg: Color,
    pub code_bg: Color,
    pub error: Color,
    pub bar_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Reset,
                fg: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                border: Color::DarkGray,
                user: Color::Cyan,
                assistant: Color::Yellow,
                code_fg: Color::LightGreen,
                code_bg: Color::Rgb(30, 30, 30),
                error: Color::LightRed,
                bar_bg: Color::DarkGray,
            },
            Theme::Light => Self {
                bg: Color::Rgb(250, 250, 250),
                fg: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                border: Color::Gray,
                user: Color::Blue,
                assistant: Color::Magenta,
                code_fg: Color::Rgb(0, 100, 0),
                code_bg: Color::Rgb(230, 230, 230),
                error: Color::Red,
                bar_bg: Color::Rgb(220, 220, 220),
            },
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn inline_code(&self) -> Style {
        Style::default().fg(self.code_fg).bg(self.code_bg)
    }

    pub fn code_block(&self) -> Style {
        Style::default().fg(self.code_fg).bg(self.code_bg)
    }

    pub fn role(&self, color: Color) -> Style {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
