//! Documentation presence.

use crate::program::{Entity, EntityKind};
use crate::sink::DiagnosticSink;

pub const NAME: &str = "DocstringRule";
pub const DESCRIPTION: &str = "Ensure all functions and classes have docstrings.";

pub fn check(entity: &Entity, sink: &mut dyn DiagnosticSink) -> bool {
    let doc = match entity.doc.as_deref().map(str::trim) {
        Some(doc) if !doc.is_empty() => doc,
        _ => {
            sink.debug(&format!("⚠️ {}: missing docstring.", entity.name));
            return false;
        }
    };

    // Section hints are advisory; a documented entity passes.
    if let EntityKind::Function(func) = &entity.kind {
        let sig = &func.signature;
        if !sig.params.is_empty() && !doc.contains("Args:") && !doc.contains("Parameters:") {
            sink.debug(&format!(
                "⚠️ {}: docstring missing 'Args:' section.",
                entity.name
            ));
        }
        if sig.returns.is_some() && !doc.contains("Returns:") {
            sink.debug(&format!(
                "⚠️ {}: docstring missing 'Returns:' section.",
                entity.name
            ));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Param, Signature, TypeHint};
    use crate::sink::MemorySink;

    #[test]
    fn test_missing_doc_fails() {
        let mut sink = MemorySink::new();
        let entity = Entity::function("f", Signature::new());
        assert!(!check(&entity, &mut sink));
        assert!(sink.contains("f: missing docstring."));

        let blank = Entity::function("g", Signature::new()).with_doc("   ");
        assert!(!check(&blank, &mut sink));
    }

    #[test]
    fn test_section_hints_do_not_fail() {
        let mut sink = MemorySink::new();
        let entity = Entity::function(
            "add",
            Signature::new()
                .param(Param::new("x").typed(TypeHint::INT))
                .returns(TypeHint::INT),
        )
        .with_doc("Add things.");
        assert!(check(&entity, &mut sink));
        assert!(sink.contains("missing 'Args:' section"));
        assert!(sink.contains("missing 'Returns:' section"));
    }

    #[test]
    fn test_structured_doc() {
        let mut sink = MemorySink::new();
        let entity = Entity::function(
            "add",
            Signature::new()
                .param(Param::new("x"))
                .returns(TypeHint::INT),
        )
        .with_doc("Add.\n\nArgs:\n    x: value\nReturns:\n    int");
        assert!(check(&entity, &mut sink));
        assert!(sink.lines.is_empty());
    }
}
