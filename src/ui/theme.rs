use crate::status::Status;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output. Every style is a no-op when color is off.
#[derive(Debug, Clone)]
pub struct Theme {
    colored: bool,
    pub header: Style,
    pub label: Style,
    pub muted: Style,
    pub info: Style,
    pub warn: Style,
    success: Style,
    cancelled: Style,
    error: Style,
}

impl Theme {
    /// Color only on an interactive stdout, and never with `NO_COLOR` set
    pub fn detect() -> Self {
        let colored =
            console::Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();
        Self::new(colored)
    }

    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            colored,
            header: pick(Style::new().cyan().bold()),
            label: pick(Style::new().white().dimmed()),
            muted: pick(Style::new().bright_black()),
            info: pick(Style::new().magenta()),
            warn: pick(Style::new().yellow().bold()),
            success: pick(Style::new().green().bold()),
            cancelled: pick(Style::new().yellow()),
            error: pick(Style::new().red().bold()),
        }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Style for a mutation outcome
    pub fn outcome(&self, status: Status) -> Style {
        match status {
            Status::Success => self.success.clone(),
            Status::Cancelled => self.cancelled.clone(),
            Status::Error => self.error.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let plain = Theme::new(false);
        assert!(!plain.is_colored());
        for status in [Status::Success, Status::Cancelled, Status::Error] {
            assert_eq!("done".style(plain.outcome(status)).to_string(), "done");
        }
    }

    #[test]
    fn test_colored_theme_styles_outcomes() {
        let colored = Theme::new(true);
        let rendered = "done".style(colored.outcome(Status::Error)).to_string();
        assert_ne!(rendered, "done");
        assert!(rendered.contains("done"));
    }
}
