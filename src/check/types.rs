//! Core types for lint findings.

use serde::{Deserialize, Serialize};

use crate::program::Origin;

/// Severity levels for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Glyph prefixed to diagnostic lines.
    pub fn glyph(&self) -> &'static str {
        match self {
            Severity::Error => "💥",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    // Static checks
    ArgCountMismatch,
    ArgNameMismatch,
    MissingReturnAnnotation,
    EmptyClass,
    // Dynamic simulation
    UnexpectedException,
    ObservedException,
    ReturnTypeMismatch,
    SimulationSkipped,
    // Requirements and guards
    MissingRequirement,
    GuardFailed,
    GuardEvaluationError,
    // Rule plugins
    RuleFailed,
    RuleFault,
    // Module enforcement
    MissingAnnotation,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::ArgCountMismatch => "arg_count_mismatch",
            FindingKind::ArgNameMismatch => "arg_name_mismatch",
            FindingKind::MissingReturnAnnotation => "missing_return_annotation",
            FindingKind::EmptyClass => "empty_class",
            FindingKind::UnexpectedException => "unexpected_exception",
            FindingKind::ObservedException => "observed_exception",
            FindingKind::ReturnTypeMismatch => "return_type_mismatch",
            FindingKind::SimulationSkipped => "simulation_skipped",
            FindingKind::MissingRequirement => "missing_requirement",
            FindingKind::GuardFailed => "guard_failed",
            FindingKind::GuardEvaluationError => "guard_evaluation_error",
            FindingKind::RuleFailed => "rule_failed",
            FindingKind::RuleFault => "rule_fault",
            FindingKind::MissingAnnotation => "missing_annotation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "arg_count_mismatch" => Some(FindingKind::ArgCountMismatch),
            "arg_name_mismatch" => Some(FindingKind::ArgNameMismatch),
            "missing_return_annotation" => Some(FindingKind::MissingReturnAnnotation),
            "empty_class" => Some(FindingKind::EmptyClass),
            "unexpected_exception" => Some(FindingKind::UnexpectedException),
            "observed_exception" => Some(FindingKind::ObservedException),
            "return_type_mismatch" => Some(FindingKind::ReturnTypeMismatch),
            "simulation_skipped" => Some(FindingKind::SimulationSkipped),
            "missing_requirement" => Some(FindingKind::MissingRequirement),
            "guard_failed" => Some(FindingKind::GuardFailed),
            "guard_evaluation_error" => Some(FindingKind::GuardEvaluationError),
            "rule_failed" => Some(FindingKind::RuleFailed),
            "rule_fault" => Some(FindingKind::RuleFault),
            "missing_annotation" => Some(FindingKind::MissingAnnotation),
            _ => None,
        }
    }

    /// Severity used when a check reports this kind.
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingKind::UnexpectedException
            | FindingKind::GuardEvaluationError
            | FindingKind::RuleFault => Severity::Error,
            FindingKind::MissingReturnAnnotation
            | FindingKind::ObservedException
            | FindingKind::SimulationSkipped => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single reported observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Name of the entity the finding is about.
    pub entity: String,
    pub message: String,
    /// Plugin rule name, for plugin findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl Finding {
    /// Create a finding with the kind's default severity.
    pub fn new(kind: FindingKind, entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            entity: entity.into(),
            message: message.into(),
            rule: None,
            origin: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_origin(mut self, origin: Option<Origin>) -> Self {
        self.origin = origin;
        self
    }

    /// Human-readable line: severity glyph, entity name, message.
    pub fn line(&self) -> String {
        format!("{} {}: {}", self.severity.glyph(), self.entity, self.message)
    }
}

/// Outcome of one plugin rule on one entity. `passed` is `None` when the rule faulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub entity: String,
    pub rule: String,
    pub passed: Option<bool>,
}

/// Results of a lint pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub findings: Vec<Finding>,
    /// Per-entity plugin outcomes, in evaluation order.
    #[serde(default)]
    pub rule_outcomes: Vec<RuleOutcome>,
    /// Number of registry entries inspected.
    pub entries: usize,
}

impl LintReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: LintReport) {
        self.findings.extend(other.findings);
        self.rule_outcomes.extend(other.rule_outcomes);
        self.entries += other.entries;
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Check if there are any error-severity findings.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    pub fn has_kind(&self, kind: FindingKind) -> bool {
        self.of_kind(kind).next().is_some()
    }
}
