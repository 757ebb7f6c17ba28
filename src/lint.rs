//! Lint driver that walks the registry and runs every check.

use crate::check::{
    catch_quietly, check_guard, check_requirements, check_static, simulate, Finding, FindingKind,
    GuardScope, LintReport, RuleOutcome, Severity,
};
use crate::config::Config;
use crate::expect;
use crate::program::{ModuleId, Program};
use crate::registry::{Registry, RegistryEntry};
use crate::rules::RulePlugin;
use crate::sink::{DiagnosticSink, Level, TraceConfig, Tracer};

/// Runs the built-in checks and the installed rule plugins over a registry.
#[derive(Debug)]
pub struct Linter {
    rules: Vec<RulePlugin>,
    simulate: bool,
    tracer: Tracer,
}

impl Linter {
    /// Linter with every built-in rule and simulation enabled.
    pub fn new() -> Self {
        Self {
            rules: RulePlugin::builtin(),
            simulate: true,
            tracer: Tracer::default(),
        }
    }

    /// Build a linter from configuration. Unknown rule names are an error.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let rules = match &config.rules {
            Some(names) => names
                .iter()
                .map(|name| {
                    RulePlugin::from_name(name)
                        .ok_or_else(|| anyhow::anyhow!("unknown rule: {}", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => RulePlugin::builtin(),
        };
        Ok(Self {
            rules,
            simulate: config.simulate,
            tracer: Tracer::new(config.trace.clone()),
        })
    }

    /// Linter with no rule plugins installed.
    pub fn without_rules() -> Self {
        Self {
            rules: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_rule(mut self, rule: RulePlugin) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rule(&mut self, rule: RulePlugin) {
        self.rules.push(rule);
    }

    /// Enable or disable dynamic simulation.
    pub fn simulate(mut self, enabled: bool) -> Self {
        self.simulate = enabled;
        self
    }

    pub fn trace(mut self, config: TraceConfig) -> Self {
        self.tracer = Tracer::new(config);
        self
    }

    pub fn rules(&self) -> &[RulePlugin] {
        &self.rules
    }

    /// Lint every registry entry in registration order.
    ///
    /// Never fails: problems in one entry, including panicking targets or
    /// rules, become findings and the pass moves on to the next entry.
    pub fn run(
        &self,
        program: &Program,
        registry: &Registry,
        sink: &mut dyn DiagnosticSink,
    ) -> LintReport {
        let mut report = LintReport::new();
        sink.info("🧠 Pre-runtime lint initiated...");

        for entry in registry.entries() {
            self.lint_entry(program, registry, entry, sink, &mut report);
            report.entries += 1;
        }

        sink.info(&format!(
            "🏁 Lint complete: {} entries, {} errors, {} warnings.",
            report.entries,
            report.count(Severity::Error),
            report.count(Severity::Warning)
        ));
        report
    }

    /// Register every entity `module` defines, then lint the registry.
    ///
    /// Unannotated functions and classes get empty entries, so the rule
    /// plugins see them too.
    pub fn run_module(
        &self,
        program: &Program,
        registry: &mut Registry,
        module: ModuleId,
        sink: &mut dyn DiagnosticSink,
    ) -> LintReport {
        let added = registry.register_module(program, module);
        tracing::debug!(
            module = %program.module(module).name,
            added,
            "registered module entities"
        );
        self.run(program, registry, sink)
    }

    fn lint_entry(
        &self,
        program: &Program,
        registry: &Registry,
        entry: &RegistryEntry,
        sink: &mut dyn DiagnosticSink,
        report: &mut LintReport,
    ) {
        let entity = program.entity(entry.target);
        let origin = entity.origin.as_ref();

        sink.info(&format!(
            "🔍 Inspecting {}: {}",
            entity.kind_str(),
            entity.name
        ));
        if let Some(comment) = &entry.comment {
            sink.info(&format!("💬 {}", comment));
        }
        if entry.expectation.is_some() {
            sink.info("📋 Expectations defined.");
        }
        if !entry.requires.is_empty() {
            sink.info(&format!("📦 Requires: {}", entry.requires.join(", ")));
        }
        if let Some(guard) = &entry.guard {
            sink.info(&format!("🧩 Guard: {}", guard));
        }

        let mut findings = check_requirements(program, &entity.name, origin, &entry.requires);

        if let Some(guard) = &entry.guard {
            let scope = GuardScope { program, registry };
            findings.extend(check_guard(&scope, &entity.name, origin, guard));
        }

        if let Some(text) = &entry.expectation {
            let rule = expect::parse(text);
            findings.extend(check_static(program, entry.target, &rule));
            if self.simulate {
                findings.extend(simulate(program, entry.target, &rule, &self.tracer, sink));
            }
        }
        record(findings, sink, report);

        for rule in &self.rules {
            let outcome = catch_quietly(|| rule.check(entry, entity, sink));
            let (passed, finding) = match outcome {
                Ok(Ok(true)) => {
                    sink.info(&format!("✅ [{}] {}", rule.name(), rule.description()));
                    (Some(true), None)
                }
                Ok(Ok(false)) => (
                    Some(false),
                    Some(Finding::new(
                        FindingKind::RuleFailed,
                        entity.name.clone(),
                        format!("[{}] {}", rule.name(), rule.description()),
                    )),
                ),
                Ok(Err(err)) => (
                    None,
                    Some(Finding::new(
                        FindingKind::RuleFault,
                        entity.name.clone(),
                        format!("[{}] rule error: {:#}", rule.name(), err),
                    )),
                ),
                Err(_) => (
                    None,
                    Some(Finding::new(
                        FindingKind::RuleFault,
                        entity.name.clone(),
                        format!("[{}] rule panicked", rule.name()),
                    )),
                ),
            };
            report.rule_outcomes.push(RuleOutcome {
                entity: entity.name.clone(),
                rule: rule.name().to_string(),
                passed,
            });
            if let Some(finding) = finding {
                let finding = finding
                    .with_rule(rule.name())
                    .with_origin(entity.origin.clone());
                record(vec![finding], sink, report);
            }
        }
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink level a finding is written at.
pub fn level_for(severity: Severity) -> Level {
    match severity {
        Severity::Error => Level::Error,
        Severity::Warning => Level::Warn,
        Severity::Info => Level::Info,
    }
}

fn record(findings: Vec<Finding>, sink: &mut dyn DiagnosticSink, report: &mut LintReport) {
    for finding in findings {
        sink.emit(level_for(finding.severity), &finding.line());
        report.add_finding(finding);
    }
}
