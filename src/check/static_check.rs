//! Signature-shape checks. Never invokes the target.

use std::collections::BTreeSet;

use crate::expect::ExpectationRule;
use crate::program::{EntityId, EntityKind, Program};

use super::{Finding, FindingKind};

/// Validate `rule` against the declared shape of entity `id`.
pub fn check_static(program: &Program, id: EntityId, rule: &ExpectationRule) -> Vec<Finding> {
    let entity = program.entity(id);
    let mut findings = Vec::new();
    let finding = |kind, message: String| {
        Finding::new(kind, entity.name.clone(), message).with_origin(entity.origin.clone())
    };

    match &entity.kind {
        EntityKind::Function(func) => {
            let sig = &func.signature;

            if let Some(expected) = rule.argument_count {
                if sig.params.len() != expected {
                    findings.push(finding(
                        FindingKind::ArgCountMismatch,
                        format!("expected {} args, found {}", expected, sig.params.len()),
                    ));
                }
            }

            if !rule.argument_names.is_empty() {
                let declared: BTreeSet<String> =
                    sig.param_names().map(str::to_string).collect();
                if declared != rule.argument_names {
                    findings.push(finding(
                        FindingKind::ArgNameMismatch,
                        format!(
                            "argument names mismatch -> expected {:?} got {:?}",
                            rule.argument_names,
                            sig.param_names().collect::<Vec<_>>()
                        ),
                    ));
                }
            }

            if let Some(expected) = &rule.return_kind {
                if sig.returns.is_none() {
                    findings.push(finding(
                        FindingKind::MissingReturnAnnotation,
                        format!("missing return annotation (expected {})", expected),
                    ));
                }
            }
        }
        EntityKind::Class(class) => {
            if class.methods.is_empty() {
                findings.push(finding(
                    FindingKind::EmptyClass,
                    "class has no methods defined".to_string(),
                ));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect;
    use crate::program::{Entity, Method, Param, Signature, TypeHint};

    fn define(entity: Entity) -> (Program, EntityId) {
        let mut program = Program::new();
        let m = program.add_module("app");
        let id = program.define(m, entity);
        (program, id)
    }

    fn add_signature() -> Signature {
        Signature::new()
            .param(Param::new("x").typed(TypeHint::INT))
            .param(Param::new("y").typed(TypeHint::INT))
            .returns(TypeHint::INT)
    }

    #[test]
    fn test_matching_signature_passes() {
        let (program, id) = define(Entity::function("add", add_signature()));
        let rule = expect::parse("takes 2 arguments: x, y\nreturn int\nshould not raise exception");
        assert!(check_static(&program, id, &rule).is_empty());
    }

    #[test]
    fn test_count_mismatch() {
        let (program, id) = define(Entity::function("add", add_signature()));
        let rule = expect::parse("takes 3 values");
        let findings = check_static(&program, id, &rule);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::ArgCountMismatch);
        assert!(findings[0].message.contains("expected 3 args, found 2"));
    }

    #[test]
    fn test_name_mismatch_is_set_based() {
        let (program, id) = define(Entity::function("add", add_signature()));
        assert!(check_static(&program, id, &expect::parse("arguments: y, x")).is_empty());

        let findings = check_static(&program, id, &expect::parse("arguments: x, z"));
        assert_eq!(findings[0].kind, FindingKind::ArgNameMismatch);
    }

    #[test]
    fn test_missing_return_annotation() {
        let sig = Signature::new().param(Param::new("x"));
        let (program, id) = define(Entity::function("double", sig));
        let findings = check_static(&program, id, &expect::parse("returns int"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingReturnAnnotation);
    }

    #[test]
    fn test_empty_class() {
        let (program, id) = define(Entity::class("Empty", vec![]));
        let findings = check_static(&program, id, &expect::parse(""));
        assert_eq!(findings[0].kind, FindingKind::EmptyClass);

        let (program, id) = define(Entity::class(
            "Greeter",
            vec![Method::new("greet", Signature::new().param(Param::new("self")))],
        ));
        assert!(check_static(&program, id, &expect::parse("")).is_empty());
    }
}
