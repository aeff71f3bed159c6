//! Terminal output for event lines.

use std::io;

use beacon_consumer::{LineSink, Presentation, RenderedLine};
use console::{Style, Term};

use crate::cli::ColorChoice;

/// Writes event lines to stdout, styled by presentation.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    term: Term,
    colors: bool,
}

impl ConsoleSink {
    /// Sink on stdout honoring `choice`.
    pub fn stdout(choice: ColorChoice) -> Self {
        let term = Term::stdout();
        let colors = match choice {
            ColorChoice::Auto => term.features().colors_supported() && term.is_term(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Self { term, colors }
    }

    /// Write an unstyled line.
    pub fn plain(&self, text: &str) -> io::Result<()> {
        self.term.write_line(text)
    }
}

/// Terminal style for a presentation.
pub fn style(presentation: Presentation) -> Style {
    match presentation {
        Presentation::Success => Style::new().green(),
        Presentation::Caution => Style::new().yellow(),
        Presentation::Danger => Style::new().red(),
        Presentation::Highlight => Style::new().magenta(),
        Presentation::Neutral => Style::new().white(),
    }
}

impl LineSink for ConsoleSink {
    fn emit(&self, line: &RenderedLine) -> io::Result<()> {
        if self.colors {
            let styled = style(line.presentation)
                .force_styling(true)
                .apply_to(&line.text);
            self.term.write_line(&styled.to_string())
        } else {
            self.term.write_line(&line.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentations_map_to_distinct_colors() {
        let text = |p| {
            style(p)
                .force_styling(true)
                .apply_to("x")
                .to_string()
        };
        let up = text(Presentation::Success);
        let down = text(Presentation::Danger);
        assert_ne!(up, down);
        assert!(down.contains("\u{1b}[31m"));
        assert!(text(Presentation::Highlight).contains("\u{1b}[35m"));
    }

    #[test]
    fn never_disables_colors() {
        assert!(!ConsoleSink::stdout(ColorChoice::Never).colors);
        assert!(ConsoleSink::stdout(ColorChoice::Always).colors);
    }
}
