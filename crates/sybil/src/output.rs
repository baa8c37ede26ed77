//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Colors for status lines on stderr. Table cells stay uncolored so
/// column widths are computed on plain text.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            enabled: should_color(global.color),
        }
    }

    pub fn success(self, text: &str) -> String {
        if self.enabled { text.green().to_string() } else { text.to_owned() }
    }

    pub fn failure(self, text: &str) -> String {
        if self.enabled { text.red().to_string() } else { text.to_owned() }
    }

    pub fn warning(self, text: &str) -> String {
        if self.enabled { text.yellow().to_string() } else { text.to_owned() }
    }

    pub fn heading(self, text: &str) -> String {
        if self.enabled { text.bold().cyan().to_string() } else { text.to_owned() }
    }

    pub fn dim(self, text: &str) -> String {
        if self.enabled { text.dimmed().to_string() } else { text.to_owned() }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list: a table of `to_row` rows, the serialized data, or one
/// `id_fn` per line.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render one item; table mode uses the pre-formatted `detail_fn` view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn notice(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.map_err(CliError::Render)
}

// ── Cell helpers ─────────────────────────────────────────────────────

pub fn opt(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_owned()
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Seconds as `1m 12s`; negative or non-finite input shows `-`.
pub fn seconds(secs: f64) -> String {
    Duration::try_from_secs_f64(secs)
        .map(|d| humantime::format_duration(Duration::from_secs(d.as_secs())).to_string())
        .unwrap_or_else(|_| "-".into())
}

/// Milliseconds as `5s 300ms`.
pub fn millis(ms: f64) -> String {
    Duration::try_from_secs_f64(ms / 1000.0)
        .map(|d| {
            let d = Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
            humantime::format_duration(d).to_string()
        })
        .unwrap_or_else(|_| "-".into())
}

/// Truncate to `max` characters with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
