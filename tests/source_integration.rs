//! Linting Python fixtures through the tree-sitter frontend.

#![cfg(feature = "tree-sitter")]

use std::path::{Path, PathBuf};

use nakurity::check::{FindingKind, Severity};
use nakurity::cli::collect_files;
use nakurity::program::{ModuleId, Program};
use nakurity::registry::Registry;
use nakurity::sink::MemorySink;
use nakurity::{source, verify_module, Config, LintReport, Linter};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn load_demo() -> (Program, Registry, Vec<ModuleId>) {
    let root = testdata_path();
    let files = collect_files(&root.join("nakurity_demo"), &Config::default())
        .expect("should collect fixture files");
    assert_eq!(files.len(), 2, "fixture files: {:?}", files);

    let mut program = Program::new();
    let mut registry = Registry::new();
    let modules = files
        .iter()
        .map(|f| source::load_file(&mut program, &mut registry, &root, f).expect("should load"))
        .collect();
    (program, registry, modules)
}

fn lint_demo() -> LintReport {
    let (program, registry, _) = load_demo();
    let config = Config::parse_file(testdata_path().join("nakurity.yaml")).expect("should parse config");
    let linter = Linter::from_config(&config).expect("should build linter");
    linter.run(&program, &registry, &mut MemorySink::new())
}

fn entities_with(report: &LintReport, kind: FindingKind) -> Vec<String> {
    report.of_kind(kind).map(|f| f.entity.clone()).collect()
}

#[test]
fn test_modules_and_entries() {
    let (program, registry, modules) = load_demo();
    let names: Vec<_> = modules.iter().map(|m| program.module(*m).name.as_str()).collect();
    assert_eq!(names, vec!["nakurity_demo", "nakurity_demo.formatting"]);

    // add, double, greet, broken_guard, sayHello, Widget, label
    assert_eq!(registry.len(), 7);
    assert!(program.is_module_loaded("json"));
    assert!(program.is_module_loaded("nakuritycore"));
}

#[test]
fn test_unannotated_entities() {
    let (program, registry, modules) = load_demo();
    let gaps: Vec<String> = modules
        .iter()
        .flat_map(|m| verify_module(&program, &registry, *m))
        .map(|id| program.entity(id).name.clone())
        .collect();
    assert_eq!(gaps, vec!["unannotated_helper", "Formatter"]);
}

#[test]
fn test_static_findings() {
    let report = lint_demo();
    assert_eq!(entities_with(&report, FindingKind::ArgCountMismatch), vec!["sayHello"]);
    assert_eq!(entities_with(&report, FindingKind::MissingReturnAnnotation), vec!["double"]);
    assert_eq!(entities_with(&report, FindingKind::EmptyClass), vec!["Widget"]);
    assert!(!report.has_kind(FindingKind::ArgNameMismatch));
}

#[test]
fn test_source_entities_are_not_simulated() {
    let report = lint_demo();
    assert_eq!(
        entities_with(&report, FindingKind::SimulationSkipped),
        vec!["add", "double", "sayHello"]
    );
    assert!(!report.has_kind(FindingKind::UnexpectedException));
}

#[test]
fn test_requirements_and_guards() {
    let report = lint_demo();
    let missing: Vec<_> = report.of_kind(FindingKind::MissingRequirement).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].entity, "greet");
    assert!(missing[0].message.contains("'missing_helper'"));

    assert!(!report.has_kind(FindingKind::GuardFailed));
    let guard_errors = entities_with(&report, FindingKind::GuardEvaluationError);
    assert_eq!(guard_errors, vec!["broken_guard"]);
    assert!(report.has_errors());
}

#[test]
fn test_rule_failures() {
    let report = lint_demo();
    let failed: Vec<_> = report
        .of_kind(FindingKind::RuleFailed)
        .map(|f| (f.entity.as_str(), f.rule.as_deref().unwrap_or("")))
        .collect();
    assert_eq!(
        failed,
        vec![
            ("double", "TypeHintRule"),
            ("sayHello", "DocstringRule"),
            ("sayHello", "TypeHintRule"),
            ("sayHello", "NamingConventionRule"),
        ]
    );
    assert_eq!(report.rule_outcomes.len(), 7 * 3);
}

#[test]
fn test_findings_carry_origin() {
    let report = lint_demo();
    let mismatch = report
        .of_kind(FindingKind::ArgCountMismatch)
        .next()
        .expect("should report arity mismatch");
    let origin = mismatch.origin.as_ref().expect("source findings have an origin");
    assert!(origin.file.ends_with(Path::new("nakurity_demo/__init__.py")));
    assert_eq!(origin.line, 60);
    assert_eq!(mismatch.severity, Severity::Warning);
}

#[test]
fn test_lint_all_covers_unannotated_entities() {
    let (program, mut registry, modules) = load_demo();
    for module in &modules {
        registry.register_module(&program, *module);
    }
    assert_eq!(registry.len(), 9);

    let config = Config::parse_file(testdata_path().join("nakurity.yaml")).expect("should parse config");
    let linter = Linter::from_config(&config).expect("should build linter");
    let report = linter.run(&program, &registry, &mut MemorySink::new());

    assert_eq!(report.entries, 9);
    let failed: Vec<_> = report
        .of_kind(FindingKind::RuleFailed)
        .filter(|f| f.entity == "unannotated_helper" || f.entity == "Formatter")
        .map(|f| (f.entity.as_str(), f.rule.as_deref().unwrap_or("")))
        .collect();
    assert_eq!(
        failed,
        vec![
            ("unannotated_helper", "DocstringRule"),
            ("unannotated_helper", "TypeHintRule"),
            ("Formatter", "DocstringRule"),
        ]
    );
}
