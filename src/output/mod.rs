// Output module: documentation data handed to writers
//
// A `PackageDoc` is one package after merging, export filtering and rendering.
// Writers here emit plain text and JSON; page layout belongs to the consumer.

pub mod literal;

use crate::error::Result;
use crate::package::{filter_exported, license_text, merge, PackageKey, Registry};
use crate::parser::{Declaration, GenKind, ImportSpec};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

/// Rendered documentation data for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDoc {
    pub key: String,
    pub name: String,
    pub canonical_style: bool,
    /// Language tag of a canonical single-file package
    pub lang: Option<String>,
    pub license: Option<String>,
    pub import_comment: Option<String>,
    /// Sorted import paths
    pub imports: Vec<String>,
    /// One literal signature per surviving function or spec
    pub declarations: Vec<String>,
}

impl PackageDoc {
    /// Merge, optionally filter and render the package at `key`.
    ///
    /// Returns `None` for unknown keys, and for packages without exported
    /// content when `exported_only` is set.
    pub fn build(registry: &Registry, key: &PackageKey, exported_only: bool) -> Option<Self> {
        let package = registry.lookup(key)?;
        let mut merged = merge(package)?;

        if exported_only && !filter_exported(&mut merged) {
            debug!(key = %key, "no exported declarations");
            return None;
        }

        let license = merged
            .license
            .as_ref()
            .map(|c| c.text())
            .or_else(|| license_text(&merged.unit));

        // imports are reported through `imports`
        let declarations = merged
            .unit
            .decls
            .iter()
            .filter(|d| !matches!(d, Declaration::Gen(gen) if gen.kind == GenKind::Import))
            .flat_map(literal::declaration_lits)
            .collect();

        Some(Self {
            key: key.to_string(),
            name: merged.unit.name.name.clone(),
            canonical_style: merged.canonical_style,
            lang: registry.normal_lang(key).map(str::to_string),
            license,
            import_comment: merged.import_comment.as_ref().map(|c| c.text().trim_end().to_string()),
            imports: merged.imports.iter().map(|i| i.path.clone()).collect(),
            declarations,
        })
    }

    /// Source form of the import list
    pub fn imports_source(&self) -> String {
        let imports: Vec<ImportSpec> = self.imports.iter().map(|p| ImportSpec::new(p)).collect();
        literal::imports_source(&imports)
    }
}

/// Build documentation for every registered package, one task per package
pub fn document_all(registry: &Registry, exported_only: bool) -> Vec<PackageDoc> {
    let keys: Vec<&PackageKey> = registry.keys().collect();
    keys.par_iter()
        .filter_map(|key| PackageDoc::build(registry, key, exported_only))
        .collect()
}

/// Write packages as plain text
pub fn write_text<W: Write>(docs: &[PackageDoc], out: &mut W) -> Result<()> {
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        match &doc.import_comment {
            Some(comment) => writeln!(out, "package {} // {}", doc.name, comment)?,
            None => writeln!(out, "package {} // {}", doc.name, doc.key)?,
        }
        if let Some(license) = &doc.license {
            writeln!(out)?;
            for line in license.lines() {
                writeln!(out, "// {}", line)?;
            }
        }
        let imports = doc.imports_source();
        if !imports.is_empty() {
            writeln!(out)?;
            write!(out, "{}", imports)?;
        }
        if !doc.declarations.is_empty() {
            writeln!(out)?;
            for decl in &doc.declarations {
                writeln!(out, "{}", decl)?;
            }
        }
    }
    Ok(())
}

/// Serialize packages as pretty JSON
pub fn to_json(docs: &[PackageDoc]) -> Result<String> {
    Ok(serde_json::to_string_pretty(docs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{CompilationUnit, Field, FuncDecl, GenDecl, Spec, TypeExpr, TypeSpec};
    use std::path::PathBuf;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        let key = PackageKey::new("example.com/shapes");

        let mut a = CompilationUnit::new(PathBuf::from("/src/shapes/area.go"), "shapes");
        let mut area = FuncDecl::new("Area").with_receiver(TypeExpr::name("Widget"));
        area.results.push(Field::unnamed(TypeExpr::name("int")));
        a.decls.push(Declaration::Func(area));
        a.decls.push(Declaration::Gen(GenDecl::new(
            GenKind::Import,
            vec![Spec::Import(ImportSpec::new("fmt"))],
        )));
        a.decls.push(Declaration::Func(FuncDecl::new("internalHelper")));

        let mut b = CompilationUnit::new(PathBuf::from("/src/shapes/widget.go"), "shapes");
        b.decls.push(Declaration::Gen(GenDecl::new(
            GenKind::Type,
            vec![Spec::Type(TypeSpec::new(
                "Widget",
                TypeExpr::Struct(vec![
                    Field::named(&["X"], TypeExpr::name("int")),
                    Field::named(&["y"], TypeExpr::name("int")),
                ]),
            ))],
        )));

        registry.register(key.clone(), a.path.clone(), a).unwrap();
        registry.register(key, b.path.clone(), b).unwrap();

        let mut hidden = CompilationUnit::new(PathBuf::from("/src/hidden/h.go"), "hidden");
        hidden.decls.push(Declaration::Func(FuncDecl::new("helper")));
        registry
            .register(PackageKey::new("example.com/hidden"), hidden.path.clone(), hidden)
            .unwrap();

        registry
    }

    #[test]
    fn test_build_exported() {
        let registry = registry();
        let doc = PackageDoc::build(&registry, &PackageKey::new("example.com/shapes"), true).unwrap();
        assert_eq!(doc.name, "shapes");
        assert_eq!(
            doc.declarations,
            vec!["func (Widget) Area() int", "type Widget struct{X int}"]
        );
        assert_eq!(doc.imports, vec!["fmt"]);
        assert!(!doc.canonical_style);
        assert!(doc.lang.is_none());
    }

    #[test]
    fn test_build_all_declarations() {
        let registry = registry();
        let doc = PackageDoc::build(&registry, &PackageKey::new("example.com/hidden"), false).unwrap();
        assert_eq!(doc.declarations, vec!["func helper()"]);
        assert!(PackageDoc::build(&registry, &PackageKey::new("example.com/hidden"), true).is_none());
        assert!(PackageDoc::build(&registry, &PackageKey::new("example.com/none"), false).is_none());
    }

    #[test]
    fn test_document_all_in_key_order() {
        let registry = registry();
        let docs = document_all(&registry, false);
        let keys: Vec<&str> = docs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["example.com/hidden", "example.com/shapes"]);

        let exported = document_all(&registry, true);
        assert_eq!(exported.len(), 1);
    }

    #[test]
    fn test_write_text() {
        let doc = PackageDoc {
            key: "example.com/shapes".to_string(),
            name: "shapes".to_string(),
            canonical_style: false,
            lang: None,
            license: Some("Copyright 2024 The Authors.\n".to_string()),
            import_comment: None,
            imports: vec!["fmt".to_string()],
            declarations: vec!["func New() *Widget".to_string()],
        };
        let mut out = Vec::new();
        write_text(&[doc], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "package shapes // example.com/shapes\n\n// Copyright 2024 The Authors.\n\nimport \"fmt\"\n\nfunc New() *Widget\n"
        );
    }

    #[test]
    fn test_to_json() {
        let registry = registry();
        let docs = document_all(&registry, true);
        let json = to_json(&docs).unwrap();
        let parsed: Vec<PackageDoc> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, docs);
    }
}
