//! Checks run against each registry entry.

mod guard;
mod requirements;
mod simulate;
mod static_check;
mod synth;
mod types;
mod unwind;

pub use guard::{check_guard, parse_guard, GuardError, GuardExpr, GuardScope};
pub use requirements::check_requirements;
pub use simulate::simulate;
pub use static_check::check_static;
pub use synth::{synthesize, PLACEHOLDER_FILE, PLACEHOLDER_STR};
pub use types::{Finding, FindingKind, LintReport, RuleOutcome, Severity};
pub use unwind::catch_quietly;
