//! Diagnostic sink and call tracer.
//!
//! The engine never prints. Every human-readable line goes through a
//! caller-owned [`DiagnosticSink`]; the CLI plugs in [`TracingSink`], tests use
//! [`MemorySink`].

use std::fmt;
use std::time::Instant;

use colored::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::program::{Fault, Value};

/// Diagnostic line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Debug => write!(f, "debug"),
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Receives leveled, free-text diagnostic lines.
pub trait DiagnosticSink {
    fn emit(&mut self, level: Level, line: &str);

    fn debug(&mut self, line: &str) {
        self.emit(Level::Debug, line);
    }

    fn info(&mut self, line: &str) {
        self.emit(Level::Info, line);
    }

    fn warn(&mut self, line: &str) {
        self.emit(Level::Warn, line);
    }

    fn error(&mut self, line: &str) {
        self.emit(Level::Error, line);
    }
}

/// Forwards lines to `tracing` events under the `nakurity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, level: Level, line: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "nakurity", "{}", line),
            Level::Info => tracing::info!(target: "nakurity", "{}", line),
            Level::Warn => tracing::warn!(target: "nakurity", "{}", line),
            Level::Error => tracing::error!(target: "nakurity", "{}", line),
        }
    }
}

/// Collects lines in memory, with ANSI colour codes stripped.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<(Level, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, line)| line.contains(needle))
    }

    pub fn at(&self, level: Level) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |(l, _)| *l == level)
            .map(|(_, line)| line.as_str())
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, level: Level, line: &str) {
        self.lines.push((level, strip_ansi(line)));
    }
}

static ANSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Remove ANSI colour sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

/// Tracer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Emit call/return events at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub use_color: bool,
    #[serde(default = "default_true")]
    pub show_timestamp: bool,
    /// Rendered values longer than this are truncated with `...`.
    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_value_len() -> usize {
    60
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_color: true,
            show_timestamp: true,
            max_value_len: default_max_value_len(),
        }
    }
}

/// Renders call and return events of simulated invocations at debug level.
#[derive(Debug, Clone)]
pub struct Tracer {
    config: TraceConfig,
    start: Instant,
}

impl Tracer {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            start: Instant::now(),
        }
    }

    /// `call` event: entity name and bound arguments.
    pub fn call(&self, sink: &mut dyn DiagnosticSink, name: &str, args: &[(&str, &Value)]) {
        if !self.config.enabled {
            return;
        }
        let header = format!(
            "{} {}(){}",
            self.paint("╭▶", |s| s.cyan().bold()),
            self.paint(name, |s| s.green().bold()),
            self.timestamp()
        );
        sink.debug(&header);
        if !args.is_empty() {
            let rendered: Vec<String> = args
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        self.paint(k, |s| s.blue()),
                        self.paint(&self.short(v), |s| s.dimmed())
                    )
                })
                .collect();
            sink.debug(&format!(
                "{} {}",
                self.paint("│ args:", |s| s.yellow()),
                rendered.join(", ")
            ));
        }
    }

    /// `return` event: the result, or the fault that propagated.
    pub fn returned(&self, sink: &mut dyn DiagnosticSink, outcome: &Result<Value, Fault>) {
        if !self.config.enabled {
            return;
        }
        let line = match outcome {
            Ok(value) => format!(
                "{} {} {}{}",
                self.paint("╰↩", |s| s.green().bold()),
                self.paint("return", |s| s.dimmed()),
                self.short(value),
                self.timestamp()
            ),
            Err(fault) => format!(
                "{} {}: {}{}",
                self.paint("💥", |s| s.red().bold()),
                fault.kind,
                fault.message,
                self.timestamp()
            ),
        };
        sink.debug(&line);
    }

    fn short(&self, value: &Value) -> String {
        let s = value.to_string();
        let max = self.config.max_value_len;
        if s.chars().count() <= max {
            return s;
        }
        let keep: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", keep)
    }

    fn timestamp(&self) -> String {
        if !self.config.show_timestamp {
            return String::new();
        }
        format!(" [{:6.3}s]", self.start.elapsed().as_secs_f64())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.config.use_color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(TraceConfig::default())
    }
}
