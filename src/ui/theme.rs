//! cliclack theme

use cliclack::ThemeState;
use console::Style;

/// Green while working, red on failure
#[derive(Debug, Clone, Default)]
pub struct TexsyncTheme;

impl cliclack::Theme for TexsyncTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().blue(),
        }
    }
}

/// Install the theme for every cliclack widget
pub fn init_theme() {
    cliclack::set_theme(TexsyncTheme);
}
