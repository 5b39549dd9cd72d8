use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;

use super::Theme;

/// Text renderer for the `dsstore` subcommands. Styling is applied only when
/// stdout is a terminal and the theme is not `plain`.
pub struct Ui {
    palette: Palette,
    paint: bool,
}

impl Ui {
    pub fn new(theme: Theme) -> Self {
        let paint = theme != Theme::Plain && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Light => Palette::light(),
            Theme::Plain | Theme::Dark | Theme::Auto => Palette::dark(),
        };
        Self { palette, paint }
    }

    fn style(&self, style: Style, text: impl Display) -> String {
        if self.paint {
            style.paint(text.to_string()).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, title: &str) {
        println!("{}", self.style(self.palette.title, format!("[{title}]")));
    }

    /// Labelled values, labels padded to a common width.
    pub fn fields<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(label, value)| (label, value.to_string()))
            .collect();
        self.heading(title);
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            let label = format!("{label:<width$}");
            println!("  {}  {value}", self.style(self.palette.label, label));
        }
        println!();
    }

    /// One line per entry under a heading; `(none)` when empty.
    pub fn entries<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.heading(title);
        let mut any = false;
        for entry in entries {
            any = true;
            println!("  {entry}");
        }
        if !any {
            println!("  {}", self.style(self.palette.note, "(none)"));
        }
        println!();
    }

    /// A record as `filename<TAB>type<TAB>value`.
    pub fn record(&self, filename: &str, code: impl Display, value: &str) {
        println!(
            "{}\t{}\t{value}",
            self.style(self.palette.filename, filename),
            self.style(self.palette.code, code)
        );
    }

    /// A half-open arena range with its length.
    pub fn free_range(&self, start: u64, end: u64) {
        println!(
            "  [{}, {}) {} bytes",
            self.style(self.palette.offset, format!("0x{start:x}")),
            self.style(self.palette.offset, format!("0x{end:x}")),
            end - start
        );
    }

    /// Prints `ok` on stdout when there is no problem, else warns.
    pub fn verdict(&self, problem: Option<&str>, ok: &str) {
        match problem {
            None => println!("{}", self.style(self.palette.ok, format!("ok: {ok}"))),
            Some(problem) => self.warn(problem),
        }
    }

    pub fn note(&self, message: &str) {
        println!("{}", self.style(self.palette.note, message));
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.style(self.palette.warn, format!("warning: {message}")));
    }
}

#[derive(Clone, Copy)]
struct Palette {
    title: Style,
    label: Style,
    filename: Style,
    code: Style,
    offset: Style,
    note: Style,
    ok: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            title: Style::new().fg(Color::LightPurple).bold(),
            label: Style::new().fg(Color::LightBlue),
            filename: Style::new().fg(Color::White).bold(),
            code: Style::new().fg(Color::LightCyan),
            offset: Style::new().fg(Color::LightYellow),
            note: Style::new().fg(Color::DarkGray),
            ok: Style::new().fg(Color::LightGreen),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            title: Style::new().fg(Color::Purple).bold(),
            label: Style::new().fg(Color::Blue),
            filename: Style::new().fg(Color::Black).bold(),
            code: Style::new().fg(Color::Cyan),
            offset: Style::new().fg(Color::Magenta),
            note: Style::new().fg(Color::DarkGray),
            ok: Style::new().fg(Color::Green),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }
}
