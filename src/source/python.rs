//! Python frontend built on tree-sitter-python.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser as TsParser, Query, QueryCursor};

use crate::program::{Method, Param, Signature, TypeHint, Value};
use crate::registry::{self, Annotation};

use super::{Import, SourceItem, SourceKind, SourceModule};

/// Errors raised while parsing a Python file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to load python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("invalid query: {0}")]
    Query(#[from] tree_sitter::QueryError),
    #[error("failed to parse {0}")]
    Parse(String),
}

/// Imports anywhere in the file.
///
/// Captures:
/// - `module` / `alias`: `import a.b [as c]`
/// - `from` / `name` / `alias`: `from a import b [as c]`
/// - `from` / `wildcard`: `from a import *`
const IMPORT_QUERY: &str = r#"
(import_statement name: (dotted_name) @module)
(import_statement name: (aliased_import name: (dotted_name) @module alias: (identifier) @alias))
(import_from_statement module_name: (_) @from name: (dotted_name) @name)
(import_from_statement module_name: (_) @from name: (aliased_import name: (dotted_name) @name alias: (identifier) @alias))
(import_from_statement module_name: (_) @from (wildcard_import) @wildcard)
"#;

const ANNOTATORS: &[&str] = &["expect", "comment", "require", "guard"];

/// Parse Python `source` into a [`SourceModule`] named `module_name`.
///
/// Only top-level functions and classes become items. Syntax errors are
/// tolerated: whatever tree-sitter recovers is used.
pub fn parse_python(path: &Path, module_name: &str, source: &str) -> Result<SourceModule, SourceError> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = TsParser::new();
    parser.set_language(&language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| SourceError::Parse(path.display().to_string()))?;
    let root = tree.root_node();
    let src = source.as_bytes();

    if root.has_error() {
        tracing::warn!(path = %path.display(), "syntax errors in python source; parsing what was recovered");
    }

    let mut module = SourceModule {
        name: module_name.to_string(),
        path: path.to_path_buf(),
        imports: collect_imports(&language, root, src)?,
        ..SourceModule::default()
    };

    for node in named_children(root) {
        match node.kind() {
            "function_definition" | "class_definition" => {
                module.items.push(item(node, Vec::new(), src));
            }
            "decorated_definition" => {
                if let Some(def) = node.child_by_field_name("definition") {
                    let annotations = named_children(node)
                        .into_iter()
                        .filter(|c| c.kind() == "decorator")
                        .filter_map(|d| decorator_annotation(d, src))
                        .collect();
                    module.items.push(item(def, annotations, src));
                }
            }
            "expression_statement" => {
                for stmt in named_children(node) {
                    if stmt.kind() == "assignment" {
                        if let Some(left) = stmt.child_by_field_name("left") {
                            bound_names(left, src, &mut module.assignments);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        path = %path.display(),
        items = module.items.len(),
        imports = module.imports.len(),
        "parsed python module"
    );
    Ok(module)
}

fn collect_imports(language: &Language, root: Node, src: &[u8]) -> Result<Vec<Import>, SourceError> {
    let query = Query::new(language, IMPORT_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, src);

    let mut imports = Vec::new();
    while let Some(m) = matches.next() {
        let mut module = None;
        let mut from = None;
        let mut name = None;
        let mut alias = None;
        let mut wildcard = false;
        for capture in m.captures {
            let value = text(capture.node, src);
            match query.capture_names()[capture.index as usize] {
                "module" => module = Some(value),
                "from" => from = Some(value),
                "name" => name = Some(value),
                "alias" => alias = Some(value),
                "wildcard" => wildcard = true,
                _ => {}
            }
        }

        let import = match (module, from) {
            // `import a.b` binds `a`; `import a.b as c` binds `c`.
            (Some(module), None) => Import {
                module: module.to_string(),
                binds: Some(
                    alias
                        .unwrap_or_else(|| module.split('.').next().unwrap_or(module))
                        .to_string(),
                ),
            },
            (None, Some(from)) if wildcard => Import {
                module: from.to_string(),
                binds: None,
            },
            (None, Some(from)) => match alias.or(name) {
                Some(bound) => Import {
                    module: from.to_string(),
                    binds: Some(bound.to_string()),
                },
                None => continue,
            },
            _ => continue,
        };
        imports.push(import);
    }
    Ok(imports)
}

fn item(def: Node, annotations: Vec<Annotation>, src: &[u8]) -> SourceItem {
    let name = def
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string())
        .unwrap_or_default();
    let kind = if def.kind() == "class_definition" {
        SourceKind::Class(methods(def, src))
    } else {
        SourceKind::Function(signature(def, src))
    };
    SourceItem {
        name,
        line: def.start_position().row + 1,
        doc: docstring(def, src),
        kind,
        annotations,
    }
}

fn methods(class: Node, src: &[u8]) -> Vec<Method> {
    let body = match class.child_by_field_name("body") {
        Some(body) => body,
        None => return Vec::new(),
    };
    named_children(body)
        .into_iter()
        .filter_map(|node| match node.kind() {
            "function_definition" => Some(node),
            "decorated_definition" => node
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        })
        .map(|def| {
            let name = def
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default();
            let mut method = Method::new(name, signature(def, src));
            method.doc = docstring(def, src);
            method
        })
        .collect()
}

fn signature(def: Node, src: &[u8]) -> Signature {
    let mut sig = Signature::new();
    if let Some(params) = def.child_by_field_name("parameters") {
        for node in named_children(params) {
            if let Some(param) = param(node, src) {
                sig = sig.param(param);
            }
        }
    }
    if let Some(ret) = def.child_by_field_name("return_type") {
        sig = sig.returns(TypeHint::parse(text(ret, src)));
    }
    sig
}

fn param(node: Node, src: &[u8]) -> Option<Param> {
    let (name_node, type_node, value_node) = match node.kind() {
        "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => (node, None, None),
        "typed_parameter" => (
            *named_children(node).first()?,
            node.child_by_field_name("type"),
            None,
        ),
        "default_parameter" | "typed_default_parameter" => (
            node.child_by_field_name("name")?,
            node.child_by_field_name("type"),
            node.child_by_field_name("value"),
        ),
        // `*` and `/` separators bind nothing
        _ => return None,
    };

    let mut param = Param::new(text(name_node, src).trim_start_matches('*'));
    if let Some(ty) = type_node {
        param = param.typed(TypeHint::parse(text(ty, src)));
    }
    if let Some(value) = value_node {
        let literal = text(value, src);
        param = param.default_value(
            Value::from_literal(literal).unwrap_or_else(|| Value::Str(literal.to_string())),
        );
    }
    Some(param)
}

/// Turn a `@x.expect("...")`-style decorator into an annotation.
fn decorator_annotation(decorator: Node, src: &[u8]) -> Option<Annotation> {
    let call = named_children(decorator)
        .into_iter()
        .find(|n| n.kind() != "comment")?;
    if call.kind() != "call" {
        return None;
    }
    let callee = call.child_by_field_name("function")?;
    let name = match callee.kind() {
        "identifier" => text(callee, src),
        "attribute" => text(callee.child_by_field_name("attribute")?, src),
        _ => return None,
    };
    if !ANNOTATORS.contains(&name) {
        return None;
    }

    let mut strings = Vec::new();
    if let Some(args) = call.child_by_field_name("arguments") {
        for arg in named_children(args) {
            match arg.kind() {
                "list" | "tuple" => strings.extend(
                    named_children(arg)
                        .into_iter()
                        .filter_map(|n| string_value(n, src)),
                ),
                _ => strings.extend(string_value(arg, src)),
            }
        }
    }

    let annotation = match name {
        "require" => registry::require(strings),
        _ => {
            let text = match strings.into_iter().next() {
                Some(text) => text,
                None => {
                    tracing::debug!(
                        line = decorator.start_position().row + 1,
                        "skipping @{} without a string literal argument",
                        name
                    );
                    return None;
                }
            };
            match name {
                "expect" => registry::expect(text),
                "comment" => registry::comment(text),
                _ => registry::guard(text),
            }
        }
    };
    Some(annotation)
}

/// Docstring of a function or class, cleaned the way `inspect.getdoc` does.
fn docstring(def: Node, src: &[u8]) -> Option<String> {
    let body = def.child_by_field_name("body")?;
    let first = named_children(body)
        .into_iter()
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = *named_children(first).first()?;
    string_value(expr, src).map(|doc| clean_doc(&doc))
}

fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_blanks(l))
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim()
            } else {
                line[leading_blanks(line).min(indent)..].trim_end()
            }
        })
        .collect();
    cleaned.join("\n").trim().to_string()
}

fn leading_blanks(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Value of a string literal, or of adjacent literals concatenated. F-strings
/// and byte strings are not literals here.
fn string_value(node: Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => unquote(text(node, src)),
        "concatenated_string" => named_children(node)
            .into_iter()
            .map(|n| string_value(n, src))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
        "parenthesized_expression" => named_children(node)
            .first()
            .and_then(|inner| string_value(*inner, src)),
        _ => None,
    }
}

fn unquote(literal: &str) -> Option<String> {
    let quote_at = literal.find(['"', '\''])?;
    let prefix = literal[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    let body = &literal[quote_at..];
    let delim = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        &body[..3]
    } else {
        &body[..1]
    };
    let inner = body.strip_prefix(delim)?.strip_suffix(delim)?;
    if prefix.contains('r') {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // line continuation
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Names bound by an assignment target; tuple targets bind each element.
fn bound_names(target: Node, src: &[u8], out: &mut Vec<String>) {
    match target.kind() {
        "identifier" => out.push(text(target, src).to_string()),
        "pattern_list" | "tuple_pattern" | "list_pattern" => {
            for child in named_children(target) {
                bound_names(child, src, out);
            }
        }
        _ => {}
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn text<'s>(node: Node, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::PrimitiveKind;

    fn parse(source: &str) -> SourceModule {
        parse_python(Path::new("demo.py"), "demo", source).unwrap()
    }

    #[test]
    fn test_decorated_function() {
        let module = parse(
            r#"
from nakuritycore import linter as nk

@nk.expect("""
    takes 2 arguments: x, y
    return int
""")
@nk.comment('Adds numbers.')
@nk.require("json", "os")
def add(x: int, y: int = 2) -> int:
    """Add two numbers.

    Args:
        x: first
    """
    return x + y
"#,
        );

        assert_eq!(module.items.len(), 1);
        let add = &module.items[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.line, 10);
        assert_eq!(add.annotations.len(), 3);
        assert!(matches!(&add.annotations[0], Annotation::Expect(t) if t.contains("takes 2 arguments")));
        assert_eq!(add.annotations[1], registry::comment("Adds numbers."));
        assert_eq!(add.annotations[2], registry::require(["json", "os"]));
        assert_eq!(add.doc.as_deref(), Some("Add two numbers.\n\nArgs:\n    x: first"));

        let sig = match &add.kind {
            SourceKind::Function(sig) => sig,
            SourceKind::Class(_) => panic!("expected a function"),
        };
        assert_eq!(sig.to_string(), "(x: int, y: int) -> int");
        assert_eq!(sig.params[1].default, Some(Value::Int(2)));
        assert_eq!(sig.returns, Some(TypeHint::Primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn test_bare_decorators_and_unrelated_ones() {
        let module = parse(
            r#"
import functools

@guard("'greet' in globals()")
@functools.lru_cache()
def cached(*args, **kwargs):
    pass
"#,
        );
        let item = &module.items[0];
        assert_eq!(item.annotations, vec![registry::guard("'greet' in globals()")]);
        let sig = match &item.kind {
            SourceKind::Function(sig) => sig,
            SourceKind::Class(_) => panic!("expected a function"),
        };
        assert_eq!(sig.param_names().collect::<Vec<_>>(), vec!["args", "kwargs"]);
    }

    #[test]
    fn test_class_methods() {
        let module = parse(
            r#"
class Greeter:
    """Says hello."""

    def greet(self, name: str) -> str:
        return "hi " + name

    @staticmethod
    def wave():
        pass

class Empty:
    pass
"#,
        );
        assert_eq!(module.items.len(), 2);
        match &module.items[0].kind {
            SourceKind::Class(methods) => {
                let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["greet", "wave"]);
            }
            SourceKind::Function(_) => panic!("expected a class"),
        }
        assert_eq!(module.items[0].doc.as_deref(), Some("Says hello."));
        assert!(matches!(&module.items[1].kind, SourceKind::Class(m) if m.is_empty()));
    }

    #[test]
    fn test_imports_and_assignments() {
        let module = parse(
            r#"
import os.path
import json as j
from typing import Optional, List as L
from . import sibling
from helpers import *

VERSION = "1.0"
a, b = 1, 2
"#,
        );
        let imports: Vec<(&str, Option<&str>)> = module
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.binds.as_deref()))
            .collect();
        assert!(imports.contains(&("os.path", Some("os"))));
        assert!(imports.contains(&("json", Some("j"))));
        assert!(imports.contains(&("typing", Some("Optional"))));
        assert!(imports.contains(&("typing", Some("L"))));
        assert!(imports.contains(&(".", Some("sibling"))));
        assert!(imports.contains(&("helpers", None)));
        assert_eq!(module.assignments, vec!["VERSION", "a", "b"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a\nb""#).as_deref(), Some("a\nb"));
        assert_eq!(unquote(r#"r"a\nb""#).as_deref(), Some(r"a\nb"));
        assert_eq!(unquote("'''x'''").as_deref(), Some("x"));
        assert_eq!(unquote(r#"f"{x}""#), None);
    }
}
