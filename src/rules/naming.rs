//! Function naming convention.

use crate::program::Entity;
use crate::sink::DiagnosticSink;

pub const NAME: &str = "NamingConventionRule";
pub const DESCRIPTION: &str = "Function names must be snake_case.";

pub fn check(entity: &Entity, sink: &mut dyn DiagnosticSink) -> bool {
    if entity.is_class() || !entity.name.chars().any(char::is_uppercase) {
        return true;
    }
    sink.debug(&format!("⚠️ {}: name not snake_case.", entity.name));
    false
}
