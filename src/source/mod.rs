//! Building a [`Program`] and [`Registry`] from Python source files.
//!
//! Entities loaded from source carry their signature, documentation and
//! origin but no native body, so the linter checks them statically only.

#[cfg(feature = "tree-sitter")]
mod python;

#[cfg(feature = "tree-sitter")]
pub use python::{parse_python, SourceError};

use std::path::{Path, PathBuf};

use crate::program::{Entity, Method, ModuleId, Origin, Program, Signature};
use crate::registry::{Annotation, Registry};

/// A parsed source module, before it is loaded into a [`Program`].
#[derive(Debug, Clone, Default)]
pub struct SourceModule {
    pub name: String,
    pub path: PathBuf,
    pub items: Vec<SourceItem>,
    pub imports: Vec<Import>,
    /// Names bound by top-level assignments.
    pub assignments: Vec<String>,
}

/// A top-level function or class and the annotations decorating it.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub name: String,
    pub line: usize,
    pub doc: Option<String>,
    pub kind: SourceKind,
    /// In source order, top decorator first.
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub enum SourceKind {
    Function(Signature),
    Class(Vec<Method>),
}

/// One imported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module being imported from. Relative imports keep their leading dots.
    pub module: String,
    /// Name bound in the importing module; `None` for wildcard imports.
    pub binds: Option<String>,
}

impl SourceItem {
    fn to_entity(&self, path: &Path) -> Entity {
        let entity = match &self.kind {
            SourceKind::Function(sig) => Entity::function(self.name.clone(), sig.clone()),
            SourceKind::Class(methods) => Entity::class(self.name.clone(), methods.clone()),
        };
        let entity = entity.with_origin(Origin {
            file: path.to_path_buf(),
            line: self.line,
        });
        match &self.doc {
            Some(doc) => entity.with_doc(doc.clone()),
            None => entity,
        }
    }
}

/// Load a parsed module: define its entities, bind its imports and
/// assignments, and register every decorator annotation.
///
/// Absolute imports also load the imported module by name so that guards and
/// requirements can see it.
pub fn load_module(program: &mut Program, registry: &mut Registry, source: &SourceModule) -> ModuleId {
    let module = program.add_module(source.name.clone());

    for import in &source.imports {
        if !import.module.starts_with('.') {
            program.add_module(import.module.clone());
        }
        if let Some(name) = &import.binds {
            program.bind_symbol(module, name.clone());
        }
    }
    for name in &source.assignments {
        program.bind_symbol(module, name.clone());
    }

    for item in &source.items {
        let id = program.define(module, item.to_entity(&source.path));
        if !item.annotations.is_empty() {
            registry.annotate_all(id, item.annotations.iter().cloned());
        }
    }

    tracing::debug!(
        module = %source.name,
        items = source.items.len(),
        imports = source.imports.len(),
        "loaded module"
    );
    module
}

/// Dotted module name for `path`, relative to the scan `root`.
///
/// `pkg/mod.py` becomes `pkg.mod` and `pkg/__init__.py` becomes `pkg`.
pub fn module_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = if rel.as_os_str().is_empty() {
        Path::new(path.file_name().unwrap_or_default())
    } else {
        rel
    };

    let mut parts: Vec<String> = rel
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.last().map(|p| p == "__init__").unwrap_or(false) {
        parts.pop();
    }
    if parts.is_empty() {
        // A package's own __init__.py scanned as the root.
        return root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "__main__".to_string());
    }
    parts.join(".")
}

/// Read, parse and load one Python file.
#[cfg(feature = "tree-sitter")]
pub fn load_file(
    program: &mut Program,
    registry: &mut Registry,
    root: &Path,
    path: &Path,
) -> anyhow::Result<ModuleId> {
    use anyhow::Context;

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = parse_python(path, &module_name(root, path), &source)?;
    Ok(load_module(program, registry, &parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn test_module_name() {
        let root = Path::new("/proj");
        assert_eq!(module_name(root, Path::new("/proj/app.py")), "app");
        assert_eq!(module_name(root, Path::new("/proj/pkg/mod.py")), "pkg.mod");
        assert_eq!(module_name(root, Path::new("/proj/pkg/__init__.py")), "pkg");
        assert_eq!(
            module_name(Path::new("/proj/app.py"), Path::new("/proj/app.py")),
            "app"
        );
    }

    #[test]
    fn test_load_module() {
        let source = SourceModule {
            name: "nakurity_demo".into(),
            path: PathBuf::from("nakurity_demo.py"),
            items: vec![
                SourceItem {
                    name: "greet".into(),
                    line: 4,
                    doc: Some("Say hello.".into()),
                    kind: SourceKind::Function(Signature::new()),
                    annotations: vec![registry::comment("hi"), registry::require(["json"])],
                },
                SourceItem {
                    name: "Greeter".into(),
                    line: 9,
                    doc: None,
                    kind: SourceKind::Class(vec![]),
                    annotations: vec![],
                },
            ],
            imports: vec![
                Import {
                    module: "json".into(),
                    binds: Some("json".into()),
                },
                Import {
                    module: ".sibling".into(),
                    binds: Some("helper".into()),
                },
            ],
            assignments: vec!["VERSION".into()],
        };

        let mut program = Program::new();
        let mut registry = Registry::new();
        let m = load_module(&mut program, &mut registry, &source);

        assert_eq!(program.module(m).name, "nakurity_demo");
        assert!(program.is_module_loaded("json"));
        assert!(!program.is_module_loaded(".sibling"));
        assert!(program.resolves("helper"));
        assert!(program.resolves("VERSION"));
        assert_eq!(program.defined_in(m).len(), 2);
        assert_eq!(registry.len(), 1);

        let entry = &registry.entries()[0];
        let greet = program.entity(entry.target);
        assert_eq!(greet.doc.as_deref(), Some("Say hello."));
        assert_eq!(greet.origin.as_ref().map(|o| o.line), Some(4));
        assert_eq!(entry.requires, vec!["json"]);
    }
}
