//! Type annotation presence on functions.

use crate::program::{Entity, EntityKind};
use crate::sink::DiagnosticSink;

pub const NAME: &str = "TypeHintRule";
pub const DESCRIPTION: &str = "Ensure functions and methods use consistent type annotations.";

pub fn check(entity: &Entity, sink: &mut dyn DiagnosticSink) -> bool {
    let sig = match &entity.kind {
        EntityKind::Function(func) => &func.signature,
        EntityKind::Class(_) => return true,
    };

    let mut ok = true;
    for param in sig.params.iter().filter(|p| p.annotation.is_none()) {
        sink.debug(&format!(
            "⚠️ {}: parameter '{}' missing type annotation.",
            entity.name, param.name
        ));
        ok = false;
    }
    if sig.returns.is_none() {
        sink.debug(&format!(
            "⚠️ {}: missing return type annotation.",
            entity.name
        ));
        ok = false;
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Param, Signature, TypeHint};
    use crate::sink::MemorySink;

    #[test]
    fn test_reports_every_gap() {
        let mut sink = MemorySink::new();
        let broken = Entity::function(
            "broken",
            Signature::new().param(Param::new("x")).param(Param::new("y")),
        );
        assert!(!check(&broken, &mut sink));
        assert_eq!(sink.lines.len(), 3);
    }

    #[test]
    fn test_fully_annotated() {
        let mut sink = MemorySink::new();
        let add = Entity::function(
            "add",
            Signature::new()
                .param(Param::new("x").typed(TypeHint::INT))
                .returns(TypeHint::INT),
        );
        assert!(check(&add, &mut sink));
        assert!(check(&Entity::class("C", vec![]), &mut sink));
    }
}
