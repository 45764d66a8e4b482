use crate::level::Level;
use crate::record::{LogEntry, DEFAULT_CATEGORY};
use serde_json::Value;

pub const COLOR_RESET: &str = "\x1b[0m";
pub const COLOR_DIM: &str = "\x1b[2m";
pub const COLOR_BOLD: &str = "\x1b[1m";

pub fn level_color(level: Level) -> &'static str {
    match level {
        Level::Debug => "\x1b[36m",
        Level::Info => "\x1b[32m",
        Level::Warn => "\x1b[33m",
        Level::Error => "\x1b[31m",
    }
}

/// Turns an assembled entry into one output line, without separator.
///
/// The variant is picked once when the logger is built and never
/// switched per call.
pub trait Render: Send + Sync {
    fn render(&self, entry: &LogEntry) -> Result<String, serde_json::Error>;
}

/// Compact single-line JSON, the collector wire format.
#[derive(Clone, Copy, Debug, Default)]
pub struct MachineRenderer;

impl Render for MachineRenderer {
    fn render(&self, entry: &LogEntry) -> Result<String, serde_json::Error> {
        serde_json::to_string(entry)
    }
}

/// Human-oriented line:
/// `[HH:MM:SS] LEVEL service [category] [trace8...] (Nms) - message`
/// followed by an indented JSON dump of a non-empty `context`.
///
/// The category segment is skipped for `"app"`, the trace segment when no
/// `trace_id` is set and the duration segment when `duration_ms` is absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrettyRenderer {
    colorize: bool,
}

impl PrettyRenderer {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.colorize && !code.is_empty() {
            format!("{code}{text}{COLOR_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Render for PrettyRenderer {
    fn render(&self, entry: &LogEntry) -> Result<String, serde_json::Error> {
        let mut parts: Vec<String> = Vec::with_capacity(8);

        let time = entry.timestamp.format("%H:%M:%S").to_string();
        parts.push(self.paint(&format!("[{time}]"), COLOR_DIM));
        parts.push(self.paint(&entry.level.as_str().to_uppercase(), level_color(entry.level)));
        if !entry.service.is_empty() {
            parts.push(self.paint(&entry.service, COLOR_BOLD));
        }
        if !entry.category.is_empty() && entry.category != DEFAULT_CATEGORY {
            parts.push(format!("[{}]", entry.category));
        }
        if let Some(trace) = entry.trace_id.as_ref().map(plain_text).filter(|t| !t.is_empty()) {
            let short: String = trace.chars().take(8).collect();
            parts.push(format!("[{short}...]"));
        }
        if let Some(duration) = &entry.duration_ms {
            parts.push(format!("({}ms)", plain_text(duration)));
        }
        parts.push("-".to_string());
        if !entry.message.is_empty() {
            parts.push(entry.message.clone());
        }

        let line = parts.join(" ");
        if entry.context.is_empty() {
            return Ok(line);
        }
        let dump = serde_json::to_string_pretty(&entry.context)?;
        Ok(format!("{line}\n{}", self.paint(&dump, COLOR_DIM)))
    }
}

/// Strings without JSON quoting, everything else as compact JSON.
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
