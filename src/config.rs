//! Configuration file schema.
//!
//! A config file tunes a lint run: which rule plugins are installed, whether
//! module enforcement is strict, which paths are scanned and how call traces
//! are rendered.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enforce::DEFAULT_HOOK_PREFIXES;
use crate::rules::RulePlugin;
use crate::sink::TraceConfig;

/// File names probed, in order, when no config path is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["nakurity.yaml", ".nakurity.yaml"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub name: String,
    /// Fail the run when a module has unannotated entities.
    #[serde(default)]
    pub strict: bool,
    /// Invoke annotated functions once with synthesized arguments.
    #[serde(default = "default_true")]
    pub simulate: bool,
    /// Run the rule plugins over every defined entity, annotated or not.
    #[serde(default)]
    pub lint_all: bool,
    /// Rule plugins by name. `None` installs every built-in rule.
    #[serde(default)]
    pub rules: Option<Vec<String>>,
    /// Module-name prefixes the load hook enforces.
    #[serde(default)]
    pub hook_prefixes: Option<Vec<String>>,
    /// Glob patterns for paths to exclude from scanning (e.g., "**/venv/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub include_test_files: bool,
    /// Default log filter for the CLI (trace, debug, info, warn, error, off).
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub trace: TraceConfig,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            strict: false,
            simulate: true,
            lint_all: false,
            rules: None,
            hook_prefixes: None,
            excluded_paths: Vec::new(),
            include_test_files: false,
            log_level: None,
            trace: TraceConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, all-default config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Returns the log level (defaults to "warn").
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }

    /// Returns the load-hook prefixes, falling back to the defaults.
    pub fn hook_prefixes(&self) -> Vec<String> {
        match &self.hook_prefixes {
            Some(prefixes) => prefixes.clone(),
            None => DEFAULT_HOOK_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if let Some(rules) = &config.rules {
        for name in rules {
            if RulePlugin::from_name(name).is_none() {
                anyhow::bail!("unknown rule {:?}", name);
            }
        }
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    if let Some(level) = &config.log_level {
        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            anyhow::bail!(
                "invalid log_level {:?}, must be one of {}",
                level,
                LOG_LEVELS.join(", ")
            );
        }
    }

    if config.trace.max_value_len < 4 {
        anyhow::bail!(
            "trace.max_value_len must be at least 4, got {}",
            config.trace.max_value_len
        );
    }

    Ok(())
}

/// Starter configuration written by `nakurity init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# nakurity configuration
name: "my project"

# Fail when a module defines functions or classes without annotations.
strict: false

# Invoke annotated functions once with synthesized arguments.
simulate: true

# Apply the rules below to unannotated functions and classes as well.
lint_all: false

rules:
  - DocstringRule
  - TypeHintRule
  - NamingConventionRule

# Only modules whose names start with one of these are checked for coverage.
hook_prefixes:
  - "nakurity_"
  - "nakuritycore."

excluded_paths:
  - "**/venv/**"
  - "**/.venv/**"

include_test_files: false
log_level: warn

trace:
  enabled: true
  use_color: true
  show_timestamp: true
  max_value_len: 60
"#;
