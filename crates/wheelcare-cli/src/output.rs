//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command builds an [`Envelope`] through the core adapters and hands it
//! to [`render_envelope`]. JSON mode prints the envelope unchanged on stdout.
//! The human modes print the payload on stdout and failures on stderr.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `WHEELCARE_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use wheelcare_core::Envelope;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output with section headings.
    Pretty,
    /// Plain text for pipes and scripts.
    Text,
    /// The response envelope as JSON.
    Json,
}

impl OutputMode {
    /// Map a resolved output name onto a mode; unknown names read as text.
    pub fn parse(resolved: &str) -> Self {
        match resolved {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Text,
        }
    }
}

/// Render an envelope to stdout/stderr and report whether it succeeded.
pub fn render_envelope<T: Serialize>(
    mode: OutputMode,
    heading: &str,
    envelope: &Envelope<T>,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<bool> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    write_envelope(
        &mut stdout.lock(),
        &mut stderr.lock(),
        mode,
        heading,
        envelope,
        human_fn,
    )
}

fn write_envelope<T: Serialize>(
    out: &mut dyn Write,
    err: &mut dyn Write,
    mode: OutputMode,
    heading: &str,
    envelope: &Envelope<T>,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<bool> {
    if mode == OutputMode::Json {
        serde_json::to_writer_pretty(&mut *out, envelope)?;
        writeln!(out)?;
        return Ok(envelope.success);
    }

    match (&envelope.data, envelope.success) {
        (Some(data), true) => {
            if mode == OutputMode::Pretty {
                pretty_section(out, heading)?;
            }
            human_fn(data, out)?;
        }
        _ => write_failure(err, envelope)?,
    }
    Ok(envelope.success)
}

/// Print a failure as `error: ...` with its code and per-field messages.
fn write_failure<T>(w: &mut dyn Write, envelope: &Envelope<T>) -> io::Result<()> {
    let message = envelope.error.as_deref().unwrap_or("request failed");
    writeln!(w, "error: {message}")?;
    if let Some(code) = envelope.code {
        writeln!(w, "  code: {code}")?;
    }
    for field in &envelope.fields {
        writeln!(w, "  {}: {}", field.field, field.message)?;
    }
    Ok(())
}

/// Write every field of a record as key/value lines, nested objects dotted.
pub fn record_fields(w: &mut dyn Write, record: &impl Serialize) -> io::Result<()> {
    let value = serde_json::to_value(record).map_err(io::Error::other)?;
    write_value(w, "", &value)
}

fn write_value(w: &mut dyn Write, prefix: &str, value: &Value) -> io::Result<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                write_value(w, &key, child)?;
            }
            Ok(())
        }
        Value::Null => Ok(()),
        Value::String(text) => pretty_kv(w, prefix, text),
        other => pretty_kv(w, prefix, other.to_string()),
    }
}
