// Package merging
//
// Combines the files of one package into a single canonical unit: duplicate
// functions and imports are dropped, free comments are reduced to the license
// notice and the import annotation, and the import list is sorted.
//
// License and annotation detection compare comment offsets against the package
// clause. This is pattern matching on common layouts, not a grammar rule, and
// unusually formatted files can miss or mis-attribute them.

use crate::output::literal::recv_ident_lit;
use crate::package::imports::sort_imports;
use crate::package::registry::PackageUnit;
use crate::parser::{
    CommentBlock, CompilationUnit, Declaration, GenKind, ImportSpec, Pos, Spec,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Language tags recognized in canonical file names (`doc_<lang>.go`)
const KNOWN_LANGS: &[&str] = &[
    "ar", "cs", "da", "de", "el", "en", "en_GB", "en_US", "es", "fa", "fi", "fr", "he", "hi",
    "hu", "id", "it", "ja", "ko", "nl", "no", "pl", "pt", "pt_BR", "ro", "ru", "sv", "th", "tr",
    "uk", "vi", "zh", "zh_CN", "zh_HK", "zh_TW",
];

/// First words that keep a comment from being a synopsis
const NON_SYNOPSIS_PREFIXES: &[&str] = &["copyright", "all rights", "author"];

/// The canonical representation of one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedUnit {
    pub unit: CompilationUnit,
    /// Deduplicated imports sorted by path
    pub imports: Vec<ImportSpec>,
    pub license: Option<CommentBlock>,
    pub import_comment: Option<CommentBlock>,
    /// Single file following the canonical naming convention
    pub canonical_style: bool,
}

/// Check whether `lang` is a known language tag
pub fn is_known_lang(lang: &str) -> bool {
    KNOWN_LANGS.contains(&lang)
}

/// Language tag of a canonical file name: the text between the first `_` and
/// the first `.`, when it is a known tag.
pub fn canonical_lang(file_name: &str) -> Option<&str> {
    let start = file_name.find('_')? + 1;
    let end = file_name.find('.')?;
    if end <= start {
        return None;
    }
    let lang = &file_name[start..end];
    is_known_lang(lang).then_some(lang)
}

/// Check the canonical naming convention `<stem>_<lang>.go`
pub fn is_canonical_name(file_name: &str) -> bool {
    file_name.ends_with(".go") && canonical_lang(file_name).is_some()
}

/// First sentence of a comment text with whitespace collapsed.
///
/// Empty when the sentence starts with a copyright or authorship notice.
pub fn synopsis(text: &str) -> String {
    let paragraph = text.split("\n\n").next().unwrap_or("");
    let collapsed = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentence = first_sentence(&collapsed);

    let lower = sentence.to_lowercase();
    if NON_SYNOPSIS_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return String::new();
    }
    sentence.to_string()
}

// A period ends a sentence when followed by a space, unless it follows a
// lone capital letter (initials).
fn first_sentence(s: &str) -> &str {
    let (mut ppp, mut pp, mut p) = (' ', ' ', ' ');
    for (i, q) in s.char_indices() {
        if q == ' ' && p == '.' && (!pp.is_uppercase() || ppp.is_uppercase()) {
            return &s[..i];
        }
        if p == '。' || p == '．' {
            return &s[..i];
        }
        ppp = pp;
        pp = p;
        p = q;
    }
    s
}

/// Check whether a comment text reads as a license notice
pub fn is_license(text: &str) -> bool {
    let first_word = text.split(' ').next().unwrap_or("");
    first_word.eq_ignore_ascii_case("copyright") && synopsis(text).is_empty()
}

/// Text of the first free comment of `unit` that reads as a license notice
pub fn license_text(unit: &CompilationUnit) -> Option<String> {
    unit.comments
        .iter()
        .map(|c| c.text())
        .find(|text| is_license(text))
}

/// Merge the files of a package. Empty packages yield `None`.
pub fn merge(package: &PackageUnit) -> Option<MergedUnit> {
    let files: Vec<&CompilationUnit> = package.units().collect();
    let first = *files.first()?;

    if files.len() == 1 {
        let canonical_style = is_canonical_name(first.file_name());
        let mut imports: Vec<ImportSpec> = first.imports().cloned().collect();
        sort_imports(&mut imports);
        return Some(MergedUnit {
            unit: first.clone(),
            imports,
            license: None,
            import_comment: None,
            canonical_style,
        });
    }

    let mut merged = CompilationUnit::new(first.dir().to_path_buf(), &package.name);
    merged.package_pos = first.package_pos;
    merged.decls = merge_decls(&files);

    let (license, import_comment) = extract_metadata(&files, &mut merged);
    merged.comments = license.iter().chain(import_comment.iter()).cloned().collect();

    let mut imports: Vec<ImportSpec> = merged.imports().cloned().collect();
    sort_imports(&mut imports);

    debug!(
        package = %package.name,
        files = files.len(),
        decls = merged.decls.len(),
        imports = imports.len(),
        "merged package"
    );

    Some(MergedUnit {
        unit: merged,
        imports,
        license,
        import_comment,
        canonical_style: false,
    })
}

/// Concatenate declarations, dropping repeated functions and import paths.
/// The first occurrence wins.
fn merge_decls(files: &[&CompilationUnit]) -> Vec<Declaration> {
    let mut decls = Vec::new();
    let mut funcs: HashSet<(String, String)> = HashSet::new();
    let mut import_paths: HashSet<String> = HashSet::new();

    for file in files {
        for decl in &file.decls {
            match decl {
                Declaration::Func(func) => {
                    // keyed on name and receiver only, signatures are not compared
                    let key = (func.name.name.clone(), recv_ident_lit(func));
                    if !funcs.insert(key) {
                        debug!(func = %func.name, file = %file.path.display(), "dropping duplicate function");
                        continue;
                    }
                    decls.push(decl.clone());
                }
                Declaration::Gen(gen) if gen.kind == GenKind::Import => {
                    let mut gen = gen.clone();
                    gen.specs.retain(|spec| match spec {
                        Spec::Import(imp) => import_paths.insert(imp.path.clone()),
                        _ => true,
                    });
                    if !gen.specs.is_empty() {
                        decls.push(Declaration::Gen(gen));
                    }
                }
                Declaration::Gen(_) => decls.push(decl.clone()),
            }
        }
    }

    decls
}

/// Find the license block and the import annotation.
///
/// Each file's comments are scanned in source order up to the annotation slot
/// (one byte past the package name). The annotation also fixes the merged
/// package name and clause position.
fn extract_metadata(
    files: &[&CompilationUnit],
    merged: &mut CompilationUnit,
) -> (Option<CommentBlock>, Option<CommentBlock>) {
    let mut license: Option<CommentBlock> = None;
    let mut import_comment: Option<CommentBlock> = None;

    for file in files {
        if !file.name.pos.is_valid() {
            continue;
        }
        let slot = Pos(file.name.end().0 + 1);

        for block in &file.comments {
            let at = block.pos().offset_from(slot);
            if at > 0 {
                break;
            }
            if license.is_none() && at < 0 && is_license(&block.text()) {
                license = Some(block.clone());
                continue;
            }
            if import_comment.is_none()
                && at == 0
                && block.len() == 1
                && block.list[0].pos.is_valid()
            {
                merged.name = file.name.clone();
                merged.package_pos = file.package_pos;
                import_comment = Some(block.clone());
                break;
            }
        }

        if license.is_some() && import_comment.is_some() {
            break;
        }
    }

    (license, import_comment)
}
