//! Program model: the arena of defined entities and the modules that bind them.
//!
//! Every entity is owned by the [`Program`] and addressed by a stable
//! [`EntityId`]. Identity is the handle, not the name: defining two functions
//! called `helper` yields two distinct ids. Modules record which names they bind;
//! a binding created with [`Program::import`] does not change the entity's home
//! module, which is how module enforcement tells defined entities from imported ones.

mod entity;
mod value;

use std::collections::BTreeSet;
use std::fmt;

pub use entity::{
    Class, Entity, EntityKind, Fault, Function, Method, NativeFn, Origin, Param, Signature,
};
pub use value::{PrimitiveKind, TypeHint, Value};

/// Stable handle of a defined entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

/// Stable handle of a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A loaded module and the names it binds.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    members: Vec<(String, EntityId)>,
    symbols: BTreeSet<String>,
}

impl Module {
    /// Entity bindings in definition order, including imported ones.
    pub fn members(&self) -> &[(String, EntityId)] {
        &self.members
    }

    /// Non-entity names bound at module level (assignments, imported names).
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    fn binds(&self, name: &str) -> bool {
        self.symbols.contains(name) || self.members.iter().any(|(n, _)| n == name)
    }
}

#[derive(Debug)]
struct Slot {
    home: ModuleId,
    entity: Entity,
}

/// Arena of modules and entities.
#[derive(Debug, Default)]
pub struct Program {
    modules: Vec<Module>,
    slots: Vec<Slot>,
    globals: BTreeSet<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a module by name, returning the existing handle if it is already loaded.
    pub fn add_module(&mut self, name: impl Into<String>) -> ModuleId {
        let name = name.into();
        if let Some(id) = self.module_by_name(&name) {
            return id;
        }
        self.modules.push(Module {
            name,
            members: Vec::new(),
            symbols: BTreeSet::new(),
        });
        ModuleId(self.modules.len() - 1)
    }

    /// Define an entity in `module` and bind it under its own name.
    pub fn define(&mut self, module: ModuleId, entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len());
        self.modules[module.0].members.push((entity.name.clone(), id));
        self.slots.push(Slot {
            home: module,
            entity,
        });
        id
    }

    /// Bind an entity defined elsewhere into `module`, optionally under an alias.
    pub fn import(&mut self, module: ModuleId, entity: EntityId, alias: Option<&str>) {
        let name = alias
            .map(str::to_string)
            .unwrap_or_else(|| self.entity(entity).name.clone());
        self.modules[module.0].members.push((name, entity));
    }

    /// Bind a plain symbol (not an entity) at module level.
    pub fn bind_symbol(&mut self, module: ModuleId, name: impl Into<String>) {
        self.modules[module.0].symbols.insert(name.into());
    }

    /// Declare a name resolvable everywhere, e.g. a builtin.
    pub fn declare_global(&mut self, name: impl Into<String>) {
        self.globals.insert(name.into());
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.slots[id.0].entity
    }

    /// The module that defined `id`.
    pub fn home(&self, id: EntityId) -> ModuleId {
        self.slots[id.0].home
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(ModuleId)
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i), m))
    }

    /// Entities whose home is `module`, in definition order. Imported bindings are excluded.
    pub fn defined_in(&self, module: ModuleId) -> Vec<EntityId> {
        let mut seen = BTreeSet::new();
        self.modules[module.0]
            .members
            .iter()
            .map(|(_, id)| *id)
            .filter(|id| self.home(*id) == module && seen.insert(*id))
            .collect()
    }

    pub fn is_module_loaded(&self, name: &str) -> bool {
        self.module_by_name(name).is_some()
    }

    /// Whether `name` resolves: a loaded module, a name bound in any module, or a global.
    pub fn resolves(&self, name: &str) -> bool {
        self.globals.contains(name)
            || self.is_module_loaded(name)
            || self.modules.iter().any(|m| m.binds(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_distinct_identity() {
        let mut program = Program::new();
        let a = program.add_module("pkg_a");
        let b = program.add_module("pkg_b");
        let first = program.define(a, Entity::function("helper", Signature::new()));
        let second = program.define(b, Entity::function("helper", Signature::new()));
        assert_ne!(first, second);
        assert_eq!(program.home(first), a);
        assert_eq!(program.home(second), b);
    }

    #[test]
    fn test_add_module_is_idempotent() {
        let mut program = Program::new();
        let a = program.add_module("app");
        assert_eq!(program.add_module("app"), a);
    }

    #[test]
    fn test_defined_in_excludes_imports() {
        let mut program = Program::new();
        let lib = program.add_module("lib");
        let app = program.add_module("app");
        let helper = program.define(lib, Entity::function("helper", Signature::new()));
        let main = program.define(app, Entity::function("main", Signature::new()));
        program.import(app, helper, Some("h"));

        assert_eq!(program.defined_in(app), vec![main]);
        assert_eq!(program.defined_in(lib), vec![helper]);
        assert_eq!(program.module(app).members().len(), 2);
    }

    #[test]
    fn test_resolves() {
        let mut program = Program::new();
        let app = program.add_module("app");
        program.define(app, Entity::function("greet", Signature::new()));
        program.bind_symbol(app, "CONFIG");
        program.declare_global("print");

        assert!(program.resolves("greet"));
        assert!(program.resolves("CONFIG"));
        assert!(program.resolves("print"));
        assert!(program.resolves("app"));
        assert!(!program.resolves("missing"));
    }
}
