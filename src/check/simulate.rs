//! Dynamic simulation: one representative invocation with synthesized arguments.

use crate::expect::ExpectationRule;
use crate::program::{EntityId, EntityKind, Fault, Function, Program, Value};
use crate::sink::{DiagnosticSink, Tracer};

use super::synth::synthesize;
use super::unwind::catch_quietly;
use super::{Finding, FindingKind};

/// Invoke entity `id` once and compare what happened against `rule`.
///
/// Classes are never invoked. Functions without a native body, or with a
/// parameter that needs synthesis but is declared with a type outside the
/// synthesizable set, are reported as skipped. Faults and panics raised by the
/// body are caught here and always come back as findings.
pub fn simulate(
    program: &Program,
    id: EntityId,
    rule: &ExpectationRule,
    tracer: &Tracer,
    sink: &mut dyn DiagnosticSink,
) -> Vec<Finding> {
    let entity = program.entity(id);
    let func = match &entity.kind {
        EntityKind::Function(func) => func,
        EntityKind::Class(_) => return Vec::new(),
    };
    let finding = |kind, message: String| {
        Finding::new(kind, entity.name.clone(), message).with_origin(entity.origin.clone())
    };

    let body = match &func.body {
        Some(body) => body,
        None => {
            return vec![finding(
                FindingKind::SimulationSkipped,
                "no native body; static checks only".to_string(),
            )]
        }
    };

    let args = match bind_arguments(func) {
        Ok(args) => args,
        Err(param) => {
            return vec![finding(
                FindingKind::SimulationSkipped,
                format!(
                    "parameter '{}' has a type that cannot be synthesized; static checks only",
                    param
                ),
            )]
        }
    };

    let named: Vec<(&str, &Value)> = func
        .signature
        .param_names()
        .zip(args.iter())
        .collect();
    tracer.call(sink, &entity.name, &named);

    let outcome = match catch_quietly(|| body(&args)) {
        Ok(result) => result,
        Err(payload) => Err(Fault::new("Panic", panic_message(payload.as_ref()))),
    };
    tracer.returned(sink, &outcome);

    let mut findings = Vec::new();
    match outcome {
        Err(fault) => {
            if rule.forbids_exceptions {
                findings.push(finding(
                    FindingKind::UnexpectedException,
                    format!("raised {} but should not ({})", fault.kind, fault.message),
                ));
            } else {
                findings.push(finding(
                    FindingKind::ObservedException,
                    format!("exception observed (allowed): {}", fault),
                ));
            }
        }
        Ok(value) => {
            if let Some(expected) = rule.return_kind.as_ref().and_then(|k| k.primitive()) {
                if value.kind() != expected {
                    findings.push(finding(
                        FindingKind::ReturnTypeMismatch,
                        format!("returned {}, expected {}", value.kind(), expected),
                    ));
                }
            }
        }
    }
    findings
}

/// Defaults first, synthesized values otherwise. Fails with the offending
/// parameter name when a value would have to be made up for an unsupported type.
fn bind_arguments(func: &Function) -> Result<Vec<Value>, String> {
    func.signature
        .params
        .iter()
        .map(|param| {
            if let Some(default) = &param.default {
                return Ok(default.clone());
            }
            match &param.annotation {
                Some(hint) if !hint.is_synthesizable() => Err(param.name.clone()),
                _ => Ok(synthesize(&param.name)),
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect;
    use crate::program::{Entity, Param, Signature, TypeHint};
    use crate::sink::{Level, MemorySink, TraceConfig};

    fn quiet_tracer() -> Tracer {
        Tracer::new(TraceConfig {
            use_color: false,
            show_timestamp: false,
            ..TraceConfig::default()
        })
    }

    fn run(entity: Entity, expectation: &str) -> (Vec<Finding>, MemorySink) {
        let mut program = Program::new();
        let m = program.add_module("app");
        let id = program.define(m, entity);
        let mut sink = MemorySink::new();
        let findings = simulate(
            &program,
            id,
            &expect::parse(expectation),
            &quiet_tracer(),
            &mut sink,
        );
        (findings, sink)
    }

    fn always_fails() -> Entity {
        Entity::native("explode", Signature::new(), |_| {
            Err(Fault::value_error("always"))
        })
    }

    #[test]
    fn test_fault_never_propagates() {
        let (findings, _) = run(always_fails(), "should not raise");
        assert_eq!(findings[0].kind, FindingKind::UnexpectedException);

        let (findings, _) = run(always_fails(), "");
        assert_eq!(findings[0].kind, FindingKind::ObservedException);
    }

    #[test]
    fn test_panic_is_caught() {
        let entity = Entity::native("boom", Signature::new(), |_| panic!("kaboom"));
        let (findings, sink) = run(entity, "no exceptions");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::UnexpectedException);
        assert!(findings[0].message.contains("kaboom"));
        assert!(sink.contains("Panic: kaboom"));
    }

    #[test]
    fn test_defaults_take_precedence() {
        let entity = Entity::native(
            "scale",
            Signature::new()
                .param(Param::new("x").default_value(4i64))
                .param(Param::new("count")),
            |args| match args {
                [Value::Int(x), Value::Int(n)] => Ok(Value::Int(x * n)),
                _ => Err(Fault::type_error("expected ints")),
            },
        );
        let (findings, sink) = run(entity, "return int\nshould not raise");
        assert!(findings.is_empty(), "unexpected: {:?}", findings);
        assert!(sink.contains("x=4, count=1"));
        assert!(sink.contains("return 4"));
    }

    #[test]
    fn test_return_type_mismatch() {
        let entity = Entity::native("name", Signature::new(), |_| Ok(Value::Int(1)));
        let (findings, _) = run(entity, "returns str");
        assert_eq!(findings[0].kind, FindingKind::ReturnTypeMismatch);
        assert_eq!(findings[0].message, "returned int, expected str");
    }

    #[test]
    fn test_described_return_is_not_compared() {
        let entity = Entity::native("name", Signature::new(), |_| Ok(Value::Int(1)));
        let (findings, _) = run(entity, "returns a greeting");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_skips_unsynthesizable_types() {
        let entity = Entity::native(
            "load",
            Signature::new().param(Param::new("conn").typed(TypeHint::parse("Connection"))),
            |_| Ok(Value::None),
        );
        let (findings, sink) = run(entity, "");
        assert_eq!(findings[0].kind, FindingKind::SimulationSkipped);
        assert!(sink.lines.is_empty());
    }

    #[test]
    fn test_skips_bodiless_functions() {
        let (findings, _) = run(Entity::function("decl", Signature::new()), "return int");
        assert_eq!(findings[0].kind, FindingKind::SimulationSkipped);
    }

    #[test]
    fn test_emits_trace_events() {
        let entity = Entity::native("one", Signature::new(), |_| Ok(Value::Int(1)));
        let (_, sink) = run(entity, "");
        let debug: Vec<_> = sink.at(Level::Debug).collect();
        assert_eq!(debug, vec!["╭▶ one()", "╰↩ return 1"]);
    }
}
