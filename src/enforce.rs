//! Module-level annotation coverage.
//!
//! [`verify_module`] lists the entities a module defines without annotating,
//! [`enforce_module`] reports them and runs a lint pass, and
//! [`EnforcementHook`] applies enforcement to modules as they are loaded.

use std::fmt;

use crate::check::{Finding, FindingKind, LintReport};
use crate::lint::Linter;
use crate::program::{EntityId, ModuleId, Program};
use crate::registry::Registry;
use crate::sink::DiagnosticSink;

/// Module-name prefixes enforced by a default hook.
pub const DEFAULT_HOOK_PREFIXES: &[&str] = &["nakurity_", "nakuritycore."];

/// Raised by strict enforcement when a module has unannotated entities.
#[derive(Debug, thiserror::Error)]
#[error("module '{module}' has unannotated entities: {}", .missing.join(", "))]
pub struct MissingAnnotationError {
    pub module: String,
    pub missing: Vec<String>,
    /// Report of the lint pass that ran before the error was raised.
    pub report: LintReport,
}

/// How coverage gaps are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforcementMode {
    /// Gaps fail enforcement with [`MissingAnnotationError`].
    Strict,
    /// Gaps become `missing_annotation` findings.
    #[default]
    Warn,
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnforcementMode::Strict => write!(f, "strict"),
            EnforcementMode::Warn => write!(f, "warn"),
        }
    }
}

/// Entities whose home is `module` and that have no registry entry.
pub fn verify_module(program: &Program, registry: &Registry, module: ModuleId) -> Vec<EntityId> {
    program
        .defined_in(module)
        .into_iter()
        .filter(|id| !registry.contains(*id))
        .collect()
}

/// Report coverage gaps for `module`, then lint the whole registry.
///
/// The lint pass runs whether or not gaps were found. In strict mode any gap
/// turns the result into an error carrying that pass's report.
pub fn enforce_module(
    linter: &Linter,
    program: &Program,
    registry: &Registry,
    module: ModuleId,
    mode: EnforcementMode,
    sink: &mut dyn DiagnosticSink,
) -> Result<LintReport, MissingAnnotationError> {
    let missing = verify_module(program, registry, module);
    for id in &missing {
        sink.warn(&format!(
            "🚫 {} is missing annotations.",
            program.entity(*id).name
        ));
    }

    let mut report = linter.run(program, registry, sink);

    if missing.is_empty() {
        return Ok(report);
    }
    match mode {
        EnforcementMode::Strict => Err(MissingAnnotationError {
            module: program.module(module).name.clone(),
            missing: missing
                .iter()
                .map(|id| program.entity(*id).name.clone())
                .collect(),
            report,
        }),
        EnforcementMode::Warn => {
            for id in missing {
                let entity = program.entity(id);
                report.add_finding(
                    Finding::new(
                        FindingKind::MissingAnnotation,
                        entity.name.clone(),
                        format!("{} has no annotations", entity.kind_str()),
                    )
                    .with_origin(entity.origin.clone()),
                );
            }
            Ok(report)
        }
    }
}

/// Opt-in enforcement for modules as they are loaded.
#[derive(Debug)]
pub struct EnforcementHook {
    prefixes: Vec<String>,
    mode: EnforcementMode,
    linter: Linter,
}

impl EnforcementHook {
    /// Hook with the default prefixes, in warn mode.
    pub fn new(linter: Linter) -> Self {
        Self {
            prefixes: DEFAULT_HOOK_PREFIXES.iter().map(|p| p.to_string()).collect(),
            mode: EnforcementMode::Warn,
            linter,
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn mode(mut self, mode: EnforcementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn linter(&self) -> &Linter {
        &self.linter
    }

    /// Whether a module with this name is enforced.
    pub fn matches(&self, module_name: &str) -> bool {
        self.prefixes.iter().any(|p| module_name.starts_with(p.as_str()))
    }

    /// Enforce `module` if its name matches. Returns `None` for modules the
    /// hook ignores. Enforcement failures are written to the sink as warnings
    /// and never propagate.
    pub fn on_load(
        &self,
        program: &Program,
        registry: &Registry,
        module: ModuleId,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<LintReport> {
        let name = &program.module(module).name;
        if !self.matches(name) {
            return None;
        }
        tracing::debug!(module = %name, mode = %self.mode, "enforcing module");
        match enforce_module(&self.linter, program, registry, module, self.mode, sink) {
            Ok(report) => Some(report),
            Err(err) => {
                sink.warn(&format!("Enforcement failed for {}: {}", name, err));
                Some(err.report)
            }
        }
    }
}
