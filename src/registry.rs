//! Annotation registry.
//!
//! A side table from [`EntityId`] to the metadata attached by the four
//! annotators. Annotating never touches the [`Program`](crate::program::Program):
//! the entity keeps its signature, body and behavior, and the annotator hands
//! the same handle back so calls can be chained or stacked in any order.

use std::collections::HashMap;

use crate::program::{EntityId, ModuleId, Program};

/// Metadata attached to one annotated entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub target: EntityId,
    pub expectation: Option<String>,
    pub comment: Option<String>,
    /// Symbols that must resolve before the entity can run, in annotation order.
    pub requires: Vec<String>,
    pub guard: Option<String>,
}

impl RegistryEntry {
    fn new(target: EntityId) -> Self {
        Self {
            target,
            expectation: None,
            comment: None,
            requires: Vec::new(),
            guard: None,
        }
    }
}

/// One annotation, ready to be applied to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Expect(String),
    Comment(String),
    Require(Vec<String>),
    Guard(String),
}

/// Attach a free-text expectation block.
pub fn expect(text: impl Into<String>) -> Annotation {
    Annotation::Expect(text.into())
}

/// Attach a human-readable description.
pub fn comment(text: impl Into<String>) -> Annotation {
    Annotation::Comment(text.into())
}

/// Require that each name resolves at lint time. Repeated calls append.
pub fn require<I, S>(names: I) -> Annotation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Annotation::Require(names.into_iter().map(Into::into).collect())
}

/// Attach a guard expression, evaluated at lint time.
pub fn guard(condition: impl Into<String>) -> Annotation {
    Annotation::Guard(condition.into())
}

impl Annotation {
    /// Merge this annotation into the entry for `target` and return `target` unchanged.
    pub fn apply(self, registry: &mut Registry, target: EntityId) -> EntityId {
        registry.annotate(target, self)
    }
}

/// Identity-keyed store of annotation entries.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<EntityId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `annotation` into the entry for `target`, creating it if absent.
    pub fn annotate(&mut self, target: EntityId, annotation: Annotation) -> EntityId {
        let entry = self.entry_mut(target);
        match annotation {
            Annotation::Expect(text) => entry.expectation = Some(text.trim().to_string()),
            Annotation::Comment(text) => entry.comment = Some(text.trim().to_string()),
            Annotation::Require(names) => entry.requires.extend(names),
            Annotation::Guard(condition) => entry.guard = Some(condition.trim().to_string()),
        }
        target
    }

    /// Apply several annotations to one entity.
    pub fn annotate_all<I>(&mut self, target: EntityId, annotations: I) -> EntityId
    where
        I: IntoIterator<Item = Annotation>,
    {
        for annotation in annotations {
            self.annotate(target, annotation);
        }
        target
    }

    /// Ensure `target` has an entry, leaving existing annotations untouched.
    pub fn register(&mut self, target: EntityId) -> EntityId {
        self.entry_mut(target);
        target
    }

    /// Register every entity `module` defines, annotated or not, so a lint
    /// pass covers the whole module. Returns how many entries were created.
    pub fn register_module(&mut self, program: &Program, module: ModuleId) -> usize {
        let before = self.len();
        for id in program.defined_in(module) {
            self.register(id);
        }
        self.len() - before
    }

    fn entry_mut(&mut self, target: EntityId) -> &mut RegistryEntry {
        let idx = match self.index.get(&target) {
            Some(&idx) => idx,
            None => {
                self.entries.push(RegistryEntry::new(target));
                let idx = self.entries.len() - 1;
                self.index.insert(target, idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    pub fn get(&self, target: EntityId) -> Option<&RegistryEntry> {
        self.index.get(&target).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, target: EntityId) -> bool {
        self.index.contains_key(&target)
    }

    /// Entries in first-annotation order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Entity, Signature};

    fn two_entities() -> (EntityId, EntityId) {
        let mut program = Program::new();
        let m = program.add_module("app");
        let a = program.define(m, Entity::function("a", Signature::new()));
        let b = program.define(m, Entity::function("b", Signature::new()));
        (a, b)
    }

    #[test]
    fn test_merges_into_one_entry() {
        let (a, _) = two_entities();
        let mut registry = Registry::new();

        let returned = expect("  takes 1 argument: x  ").apply(&mut registry, a);
        assert_eq!(returned, a);
        comment("Doubles a number").apply(&mut registry, a);

        assert_eq!(registry.len(), 1);
        let entry = registry.get(a).unwrap();
        assert_eq!(entry.expectation.as_deref(), Some("takes 1 argument: x"));
        assert_eq!(entry.comment.as_deref(), Some("Doubles a number"));
    }

    #[test]
    fn test_require_appends() {
        let (a, _) = two_entities();
        let mut registry = Registry::new();
        registry.annotate(a, require(["a"]));
        registry.annotate(a, require(["b"]));
        assert_eq!(registry.get(a).unwrap().requires, vec!["a", "b"]);
    }

    #[test]
    fn test_order_is_irrelevant() {
        let (a, b) = two_entities();
        let mut registry = Registry::new();
        registry.annotate_all(a, [expect("return int"), guard("true")]);
        registry.annotate_all(b, [guard("true"), expect("return int")]);

        let ea = registry.get(a).unwrap();
        let eb = registry.get(b).unwrap();
        assert_eq!(ea.expectation, eb.expectation);
        assert_eq!(ea.guard, eb.guard);
    }

    #[test]
    fn test_entries_keep_annotation_order() {
        let (a, b) = two_entities();
        let mut registry = Registry::new();
        registry.annotate(b, comment("second defined, first annotated"));
        registry.annotate(a, comment("first defined"));
        registry.annotate(b, expect("return int"));

        let targets: Vec<_> = registry.entries().iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![b, a]);
    }

    #[test]
    fn test_register_module_keeps_annotations() {
        let mut program = Program::new();
        let m = program.add_module("app");
        let lib = program.add_module("lib");
        let a = program.define(m, Entity::function("a", Signature::new()));
        let b = program.define(m, Entity::function("b", Signature::new()));
        let foreign = program.define(lib, Entity::function("helper", Signature::new()));
        program.import(m, foreign, None);

        let mut registry = Registry::new();
        registry.annotate(b, comment("kept"));
        assert_eq!(registry.register_module(&program, m), 1);
        assert_eq!(registry.register_module(&program, m), 0);

        assert!(registry.contains(a));
        assert!(!registry.contains(foreign));
        assert_eq!(registry.get(b).unwrap().comment.as_deref(), Some("kept"));
        assert!(registry.get(a).unwrap().comment.is_none());
    }
}
