//! Required-symbol resolution.

use crate::program::{Origin, Program};

use super::{Finding, FindingKind};

/// Report every name in `names` that does not resolve in `program`.
pub fn check_requirements(
    program: &Program,
    entity: &str,
    origin: Option<&Origin>,
    names: &[String],
) -> Vec<Finding> {
    names
        .iter()
        .filter(|name| !program.resolves(name))
        .map(|name| {
            Finding::new(
                FindingKind::MissingRequirement,
                entity,
                format!("required '{}' not found in current scope", name),
            )
            .with_origin(origin.cloned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Entity, Signature};

    #[test]
    fn test_missing_names_only() {
        let mut program = Program::new();
        let m = program.add_module("app");
        program.define(m, Entity::function("greet", Signature::new()));
        program.add_module("json");

        let names = vec!["greet".to_string(), "json".to_string(), "ghost".to_string()];
        let findings = check_requirements(&program, "say_hi", None, &names);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingRequirement);
        assert_eq!(findings[0].entity, "say_hi");
        assert!(findings[0].message.contains("'ghost'"));
    }
}
