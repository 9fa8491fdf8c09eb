//! Astral-style CLI output formatting.
//!
//! Human-readable lines on stdout with colored symbols, or JSON lines of the
//! form `{"type": ..., "payload": ...}` in `--json` mode. Quiet mode drops
//! everything except warnings, errors and JSON.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::{OwoColorize, Stream};
use parking_lot::RwLock;
use serde_json::json;

use crate::domain::{ConnectionStatus, RiskLevel};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    *config_cell().read()
}

fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

macro_rules! styles {
    ($($name:ident),* $(,)?) => {
        $(
            fn $name(text: impl Display) -> String {
                text.if_supports_color(Stream::Stdout, |t| t.$name()).to_string()
            }
        )*
    };
}

// Styled stdout text. Plain when `--color never` or stdout is not a terminal.
styles!(bold, dimmed, green, yellow, red, cyan);

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *config_cell().write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

#[must_use]
pub fn is_quiet() -> bool {
    read_config().quiet
}

#[must_use]
pub fn verbosity() -> u8 {
    read_config().verbose
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    let config = read_config();
    if config.json {
        emit_json_line(
            "header",
            json!({
                "app": "eegwatch",
                "version": version,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("{} {}", bold("eegwatch"), dimmed(version));
    println!();
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line(
            "field",
            json!({
                "label": label,
                "value": value,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {:<14} {}", dimmed(label), value);
}

/// Print a success line.
pub fn success(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {}", green("✓"), message);
}

/// Print a warning line. Shown in quiet mode.
pub fn warning(message: &str) {
    if is_json() {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }

    println!("  {} {}", yellow("⚠"), message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!(
            "{}",
            json!({
                "type": "error",
                "payload": { "message": message },
            })
        );
        return;
    }

    eprintln!("  {} {}", "×".if_supports_color(Stream::Stderr, |t| t.red()), message);
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!();
    println!("{}", bold(title));
}

/// Print a dimmed note.
pub fn note(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("note", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {}", dimmed(message));
}

/// Print a hint with "hint:" prefix.
pub fn hint(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("hint", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {}: {}", dimmed(cyan("hint")), dimmed(message));
}

/// Print a connection status transition.
pub fn status(timestamp: &str, status: ConnectionStatus, detail: Option<&str>) {
    let config = read_config();

    if config.json {
        emit_json_line(
            "status",
            json!({
                "timestamp": timestamp,
                "status": status,
                "detail": detail,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) && status != ConnectionStatus::Failed {
        return;
    }

    let label = match status {
        ConnectionStatus::Connected => green(status.as_str()),
        ConnectionStatus::Connecting => cyan(status.as_str()),
        ConnectionStatus::Disconnected => yellow(status.as_str()),
        ConnectionStatus::Failed => red(status.as_str()),
    };
    match detail {
        Some(detail) => println!("  {} {} {}", dimmed(timestamp), label, dimmed(detail)),
        None => println!("  {} {}", dimmed(timestamp), label),
    }
}

/// Print one live-view line per flush, or `payload` in JSON mode.
pub fn flush(timestamp: &str, risk: RiskLevel, message: &str, payload: serde_json::Value) {
    let config = read_config();

    if config.json {
        emit_json_line("flush", payload);
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {} {}", dimmed(timestamp), risk_label(risk), message);
}

fn risk_label(risk: RiskLevel) -> String {
    let text = format!("{risk:<8}");
    match risk {
        RiskLevel::Good => green(text),
        RiskLevel::Moderate => yellow(text),
        RiskLevel::Critical => bold(red(text)),
    }
}

/// Braille spinner animation frames.
const BRAILLE_SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Create and start a progress spinner.
///
/// Returns a hidden progress bar in JSON or quiet mode.
pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let config = read_config();
    if config.json || config.quiet {
        let pb = indicatif::ProgressBar::hidden();
        pb.set_message(message.to_string());
        return pb;
    }

    let style = indicatif::ProgressStyle::default_spinner()
        .tick_strings(BRAILLE_SPINNER)
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner());
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Finish a spinner with a success checkmark.
pub fn spinner_success(pb: &indicatif::ProgressBar, message: &str) {
    let config = read_config();
    if config.json {
        emit_json_line("spinner_success", json!({ "message": message }));
        pb.finish_and_clear();
        return;
    }
    if config.quiet {
        pb.finish_and_clear();
        return;
    }

    pb.finish_with_message(format!("{} {}", green("✓"), message));
}

/// Finish a spinner with a failure mark.
pub fn spinner_fail(pb: &indicatif::ProgressBar, message: &str) {
    if is_json() {
        emit_json_line("spinner_fail", json!({ "message": message }));
        pb.finish_and_clear();
        return;
    }

    pb.finish_with_message(format!("{} {}", red("×"), message));
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    cyan(value)
}

/// Format a dimmed value.
pub fn muted(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    dimmed(value)
}

/// Emit a JSON line with a custom payload.
pub fn json_line(kind: &str, payload: serde_json::Value) {
    emit_json_line(kind, payload);
}
