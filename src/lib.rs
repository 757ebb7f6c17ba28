//! nakurity - annotation-driven contract linter.
//!
//! Functions and classes carry free-text expectations, comments, required
//! symbols and guard conditions. A lint pass checks each annotated entity
//! statically against its signature and dynamically by invoking it once with
//! synthesized arguments, then runs the installed rule plugins.
//!
//! # Architecture
//!
//! - `program`: arena of modules and entities, addressed by stable handles
//! - `registry`: identity-keyed side table of annotations
//! - `expect`: free-text expectation parser
//! - `check`: static checker, simulator, requirement and guard checks
//! - `rules`: rule plugins applied after the built-in checks
//! - `lint`: the driver that walks the registry
//! - `enforce`: module-level annotation coverage and the load hook
//! - `sink`: diagnostic sink and call tracer
//! - `source`: Python frontend (tree-sitter)
//! - `config`, `report`, `cli`: the command-line tool
//!
//! # Example
//!
//! ```
//! use nakurity::program::{Entity, Fault, Param, Program, Signature, TypeHint, Value};
//! use nakurity::registry::{self, Registry};
//! use nakurity::sink::MemorySink;
//! use nakurity::Linter;
//!
//! let mut program = Program::new();
//! let app = program.add_module("app");
//! let double = program.define(
//!     app,
//!     Entity::native(
//!         "double",
//!         Signature::new().param(Param::new("x").typed(TypeHint::INT)).returns(TypeHint::INT),
//!         |args| match args {
//!             [Value::Int(x)] => Ok(Value::Int(x * 2)),
//!             _ => Err(Fault::type_error("expected an int")),
//!         },
//!     ),
//! );
//!
//! let mut reg = Registry::new();
//! reg.annotate(double, registry::expect("takes 1 argument: x\nreturn int"));
//!
//! let report = Linter::new().run(&program, &reg, &mut MemorySink::new());
//! assert_eq!(report.entries, 1);
//! ```

pub mod check;
pub mod cli;
pub mod config;
pub mod enforce;
pub mod expect;
pub mod lint;
pub mod program;
pub mod registry;
pub mod report;
pub mod rules;
pub mod sink;
pub mod source;

pub use check::{Finding, FindingKind, LintReport, Severity};
pub use config::Config;
pub use enforce::{
    enforce_module, verify_module, EnforcementHook, EnforcementMode, MissingAnnotationError,
};
pub use expect::ExpectationRule;
pub use lint::Linter;
pub use registry::{Annotation, Registry, RegistryEntry};
pub use rules::RulePlugin;
pub use sink::{DiagnosticSink, MemorySink, TracingSink};
