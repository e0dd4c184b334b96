use ratatui::style::{Color, Modifier, Style};

/// Terminal colors for one color scheme
#[derive(Debug, Clone)]
pub struct Palette {
    pub text: Color,
    pub text_dim: Color,
    pub background: Color,
    pub surface: Color,
    pub border: Color,
    pub primary: Color,

    /// Variant accents
    pub danger: Color,
    pub warning: Color,
    pub info: Color,
    pub success: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            text: Color::Rgb(248, 250, 252),       // Slate-50
            text_dim: Color::Rgb(148, 163, 184),   // Slate-400
            background: Color::Rgb(15, 23, 42),    // Slate-900
            surface: Color::Rgb(30, 41, 59),       // Slate-800
            border: Color::Rgb(71, 85, 105),       // Slate-600
            primary: Color::Rgb(147, 51, 234),     // Purple

            danger: Color::Rgb(239, 68, 68),       // Red-500
            warning: Color::Rgb(245, 158, 11),     // Amber-500
            info: Color::Rgb(59, 130, 246),        // Blue-500
            success: Color::Rgb(34, 197, 94),      // Green-500
        }
    }

    pub fn light() -> Self {
        Self {
            text: Color::Rgb(15, 23, 42),
            text_dim: Color::Rgb(100, 116, 139),
            background: Color::Rgb(255, 255, 255),
            surface: Color::Rgb(241, 245, 249),
            border: Color::Rgb(203, 213, 225),
            primary: Color::Rgb(124, 58, 237),

            danger: Color::Rgb(220, 38, 38),
            warning: Color::Rgb(217, 119, 6),
            info: Color::Rgb(37, 99, 235),
            success: Color::Rgb(22, 163, 74),
        }
    }

    /// Plain palette for `data-unstyled` dialogs
    pub fn unstyled() -> Self {
        Self {
            text: Color::Reset,
            text_dim: Color::Reset,
            background: Color::Reset,
            surface: Color::Reset,
            border: Color::Reset,
            primary: Color::Reset,
            danger: Color::Reset,
            warning: Color::Reset,
            info: Color::Reset,
            success: Color::Reset,
        }
    }

    /// Accent color for a `data-variant` value
    pub fn accent(&self, variant: Option<&str>) -> Color {
        match variant {
            Some("danger") => self.danger,
            Some("warning") => self.warning,
            Some("info") => self.info,
            Some("success") => self.success,
            _ => self.primary,
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn button_style(&self, accent: Color, focused: bool, disabled: bool) -> Style {
        let style = if focused {
            Style::default()
                .bg(accent)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(self.surface).fg(self.text)
        };

        if disabled {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }
}
