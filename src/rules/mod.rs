//! Pluggable rules applied to every registry entry after the built-in checks.
//!
//! The set is closed: three built-in variants plus [`RulePlugin::Custom`],
//! which carries a user-supplied predicate.

mod documentation;
mod naming;
mod type_hints;

use std::fmt;

use crate::program::Entity;
use crate::registry::RegistryEntry;
use crate::sink::DiagnosticSink;

/// Predicate used by a custom rule.
pub type CustomCheck =
    Box<dyn Fn(&RegistryEntry, &Entity, &mut dyn DiagnosticSink) -> anyhow::Result<bool>>;

/// A user-defined rule.
pub struct CustomRule {
    name: String,
    description: String,
    check: CustomCheck,
}

impl CustomRule {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&RegistryEntry, &Entity, &mut dyn DiagnosticSink) -> anyhow::Result<bool> + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// A named, independently checkable rule.
#[derive(Debug)]
pub enum RulePlugin {
    /// Entities carry documentation.
    Documentation,
    /// Function parameters and return values are annotated.
    TypeAnnotations,
    /// Function names are snake_case.
    NamingConvention,
    Custom(CustomRule),
}

/// Built-in rules: (name, description).
pub const BUILTIN_RULES: &[(&str, &str)] = &[
    (documentation::NAME, documentation::DESCRIPTION),
    (type_hints::NAME, type_hints::DESCRIPTION),
    (naming::NAME, naming::DESCRIPTION),
];

impl RulePlugin {
    /// All built-in rules in their default order.
    pub fn builtin() -> Vec<RulePlugin> {
        vec![
            RulePlugin::Documentation,
            RulePlugin::TypeAnnotations,
            RulePlugin::NamingConvention,
        ]
    }

    /// Look up a built-in rule by name.
    pub fn from_name(name: &str) -> Option<RulePlugin> {
        match name {
            documentation::NAME => Some(RulePlugin::Documentation),
            type_hints::NAME => Some(RulePlugin::TypeAnnotations),
            naming::NAME => Some(RulePlugin::NamingConvention),
            _ => None,
        }
    }

    pub fn custom<F>(name: impl Into<String>, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&RegistryEntry, &Entity, &mut dyn DiagnosticSink) -> anyhow::Result<bool> + 'static,
    {
        RulePlugin::Custom(CustomRule::new(name, description, check))
    }

    pub fn name(&self) -> &str {
        match self {
            RulePlugin::Documentation => documentation::NAME,
            RulePlugin::TypeAnnotations => type_hints::NAME,
            RulePlugin::NamingConvention => naming::NAME,
            RulePlugin::Custom(rule) => &rule.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            RulePlugin::Documentation => documentation::DESCRIPTION,
            RulePlugin::TypeAnnotations => type_hints::DESCRIPTION,
            RulePlugin::NamingConvention => naming::DESCRIPTION,
            RulePlugin::Custom(rule) => &rule.description,
        }
    }

    /// `Ok(true)` passes, `Ok(false)` fails. Built-in rules never return `Err`.
    pub fn check(
        &self,
        entry: &RegistryEntry,
        entity: &Entity,
        sink: &mut dyn DiagnosticSink,
    ) -> anyhow::Result<bool> {
        match self {
            RulePlugin::Documentation => Ok(documentation::check(entity, sink)),
            RulePlugin::TypeAnnotations => Ok(type_hints::check(entity, sink)),
            RulePlugin::NamingConvention => Ok(naming::check(entity, sink)),
            RulePlugin::Custom(rule) => (rule.check)(entry, entity, sink),
        }
    }
}
