use ratatui::style::{Color, Modifier, Style};

/// Colors used to draw a presentation.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub title: Color,
    pub heading_colors: [Color; 6],
    pub inline_code_fg: Color,
    pub inline_code_bg: Color,
    pub code_fence: Color,
    pub list_bullet: Color,
    pub blockquote_border: Color,
    pub blockquote_fg: Color,
    pub link_fg: Color,
    pub rule: Color,
    pub gauge_fg: Color,
    pub gauge_bg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub warning_bg: Color,
    pub error_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Rgb(220, 220, 230),
            border: Color::Rgb(100, 100, 120),
            title: Color::Rgb(100, 200, 255),
            heading_colors: [
                Color::Rgb(100, 200, 255),
                Color::Rgb(130, 220, 160),
                Color::Rgb(240, 200, 110),
                Color::Rgb(200, 160, 240),
                Color::Rgb(170, 170, 190),
                Color::Rgb(150, 150, 170),
            ],
            inline_code_fg: Color::Rgb(255, 180, 120),
            inline_code_bg: Color::Rgb(45, 45, 55),
            code_fence: Color::Rgb(90, 90, 110),
            list_bullet: Color::Rgb(100, 200, 255),
            blockquote_border: Color::Rgb(100, 100, 140),
            blockquote_fg: Color::Rgb(180, 180, 200),
            link_fg: Color::Rgb(100, 180, 255),
            rule: Color::Rgb(80, 80, 100),
            gauge_fg: Color::Gray,
            gauge_bg: Color::DarkGray,
            status_bg: Color::Rgb(40, 40, 55),
            status_fg: Color::Rgb(180, 180, 200),
            warning_bg: Color::Rgb(120, 90, 0),
            error_bg: Color::Rgb(140, 30, 30),
        }
    }
}

impl Theme {
    /// Color for a heading level (1-based). Deeper levels reuse the last color.
    pub fn heading_color(&self, level: usize) -> Color {
        let index = level.clamp(1, self.heading_colors.len()) - 1;
        self.heading_colors[index]
    }

    pub fn content_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn bold_style(&self) -> Style {
        self.text_style().add_modifier(Modifier::BOLD)
    }

    pub fn italic_style(&self) -> Style {
        self.text_style().add_modifier(Modifier::ITALIC)
    }

    pub fn inline_code_style(&self) -> Style {
        Style::default()
            .fg(self.inline_code_fg)
            .bg(self.inline_code_bg)
    }

    pub fn code_fence_style(&self) -> Style {
        Style::default().fg(self.code_fence)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }
}
