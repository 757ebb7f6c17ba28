//! Command-line interface for nakurity.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::check::{Finding, FindingKind, LintReport, Severity};
use crate::config::{self, Config, DEFAULT_CONFIG_NAMES, DEFAULT_CONFIG_TEMPLATE};
use crate::enforce::{verify_module, EnforcementHook, EnforcementMode};
use crate::lint::Linter;
use crate::program::{ModuleId, Program};
use crate::registry::Registry;
use crate::report;
use crate::rules::BUILTIN_RULES;
use crate::sink::{DiagnosticSink, TracingSink};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Annotation-driven contract linter for Python code.
///
/// Functions and classes declare their expected behavior with decorators
/// (`expect`, `comment`, `require`, `guard`). nakurity checks those
/// declarations against signatures, resolves requirements, evaluates guards
/// and reports entities that carry no annotations at all.
#[derive(Parser)]
#[command(name = "nakurity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint annotated Python sources
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// List the built-in rule plugins
    Rules,
    /// Create a default nakurity configuration file
    Init(InitArgs),
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Fail when a module defines unannotated functions or classes
    #[arg(long)]
    pub strict: bool,

    /// Skip dynamic simulation
    #[arg(long)]
    pub no_simulate: bool,

    /// Apply rule plugins to unannotated functions and classes too
    #[arg(long)]
    pub all: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "nakurity.yaml")]
    pub output: PathBuf,
}

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over both
/// the configured level and `-v`.
fn init_tracing(config_level: &str, verbose: u8) {
    let level = match verbose {
        0 => config_level,
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

fn is_test_file(name: &str) -> bool {
    name.starts_with("test_") || name.ends_with("_test.py") || name == "conftest.py"
}

/// Collect Python files to scan under `root`.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let include_tests = config.include_test_files;
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if !e.file_type().is_dir() || e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if name.starts_with('.') {
                return false;
            }
            // Skip environments, caches and (unless included) test directories
            if name == "venv" || name == "__pycache__" || name == "node_modules" {
                return false;
            }
            include_tests || (name != "tests" && name != "test")
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        if config.is_path_excluded(path) {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !include_tests && is_test_file(name) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// `missing_annotation` findings for unannotated entities in every module the
/// hook matches. Strict mode makes them errors.
fn coverage_gaps(
    hook: &EnforcementHook,
    mode: EnforcementMode,
    program: &Program,
    registry: &Registry,
    modules: &[ModuleId],
    sink: &mut dyn DiagnosticSink,
) -> LintReport {
    let severity = match mode {
        EnforcementMode::Strict => Severity::Error,
        EnforcementMode::Warn => Severity::Warning,
    };
    let mut gaps = LintReport::new();
    for &module in modules {
        let name = &program.module(module).name;
        if !hook.matches(name) {
            tracing::debug!(module = %name, "outside hook prefixes, coverage not enforced");
            continue;
        }
        for id in verify_module(program, registry, module) {
            let entity = program.entity(id);
            sink.warn(&format!("🚫 {} is missing annotations.", entity.name));
            gaps.add_finding(
                Finding::new(
                    FindingKind::MissingAnnotation,
                    entity.name.clone(),
                    format!("{} has no annotations", entity.kind_str()),
                )
                .with_severity(severity)
                .with_origin(entity.origin.clone()),
            );
        }
    }
    gaps
}

/// Directory module names are computed from: the parent of the outermost
/// package (a directory with `__init__.py`) containing `dir`.
fn package_root(dir: &Path) -> PathBuf {
    let mut root = dir;
    while root.join("__init__.py").is_file() {
        match root.parent() {
            Some(parent) => root = parent,
            None => break,
        }
    }
    root.to_path_buf()
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Load config, falling back to defaults when none is found
    let config_path = args.config.clone().or_else(discover_config);
    let config = match &config_path {
        Some(path) => match Config::parse_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error parsing config: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    init_tracing(config.log_level(), args.verbose);

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let (dir, files) = if abs_path.is_dir() {
        let files = collect_files(&abs_path, &config)?;
        (abs_path.clone(), files)
    } else {
        let dir = abs_path.parent().map(Path::to_path_buf).unwrap_or_default();
        (dir, vec![abs_path.clone()])
    };
    let root = package_root(&dir);

    if files.is_empty() {
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let mut program = Program::new();
    let mut registry = Registry::new();
    let modules = load_sources(&mut program, &mut registry, &root, &files)?;

    let linter = Linter::from_config(&config)?.simulate(config.simulate && !args.no_simulate);
    let strict = config.strict || args.strict;
    let lint_all = config.lint_all || args.all;
    let mode = if strict {
        EnforcementMode::Strict
    } else {
        EnforcementMode::Warn
    };
    let hook = EnforcementHook::new(linter)
        .with_prefixes(config.hook_prefixes())
        .mode(mode);
    tracing::info!(
        files = files.len(),
        entries = registry.len(),
        rules = hook.linter().rules().len(),
        prefixes = ?hook.prefixes(),
        %mode,
        lint_all,
        "starting lint"
    );

    // Coverage is checked before lint_all registers the remaining entities.
    let mut sink = TracingSink;
    let gaps = coverage_gaps(&hook, mode, &program, &registry, &modules, &mut sink);

    if lint_all {
        for &module in &modules {
            registry.register_module(&program, module);
        }
    }

    let mut result = hook.linter().run(&program, &registry, &mut sink);
    result.merge(gaps);

    // Output results
    let config_path_str = config_path
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    let path_str = args.path.to_string_lossy().to_string();

    match args.format.as_str() {
        "json" => report::write_json(&path_str, &config_path_str, files.len(), &result)?,
        _ => report::write_pretty(&path_str, &config_path_str, files.len(), &result),
    }

    if report::passed(&result) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

#[cfg(feature = "tree-sitter")]
fn load_sources(
    program: &mut Program,
    registry: &mut Registry,
    root: &Path,
    files: &[PathBuf],
) -> anyhow::Result<Vec<ModuleId>> {
    files
        .iter()
        .map(|path| crate::source::load_file(program, registry, root, path))
        .collect()
}

#[cfg(not(feature = "tree-sitter"))]
fn load_sources(
    _program: &mut Program,
    _registry: &mut Registry,
    _root: &Path,
    _files: &[PathBuf],
) -> anyhow::Result<Vec<ModuleId>> {
    anyhow::bail!("nakurity was built without the tree-sitter feature; source files cannot be parsed")
}

/// Run the rules command.
pub fn run_rules() -> anyhow::Result<i32> {
    println!("Built-in rules:");
    println!();
    for (name, description) in BUILTIN_RULES {
        println!("  {:<24} {}", name, description);
    }
    println!();
    println!("Select rules with the `rules:` list in nakurity.yaml.");
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: nakurity lint . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
