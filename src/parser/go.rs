// Go parser using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::{
    Comment, CommentBlock, CompilationUnit, Declaration, Field, FuncDecl, GenDecl, GenKind, Ident,
    ImportSpec, Pos, Spec, TypeExpr, TypeSpec, ValueSpec,
};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Parser for Go source files
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_go::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Go language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse a Go file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<CompilationUnit> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        self.parse_source(&source, path.to_path_buf())
    }

    /// Parse Go source code
    pub fn parse_source(&mut self, source: &str, path: PathBuf) -> Result<CompilationUnit> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse Go source"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root)
                .map(|n| n.start_position().row + 1)
                .unwrap_or(1);
            return Err(Error::parse(path, format!("syntax error at line {}", line)));
        }

        let src = source.as_bytes();
        let mut comments = Vec::new();
        collect_comments(root, src, &mut comments);
        let mut blocks = group_comments(comments, source);

        let mut unit = CompilationUnit::new(path, "");
        let mut has_package = false;

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            let decl = match child.kind() {
                "package_clause" => {
                    unit.package_pos = pos_of(child);
                    let mut pkg_cursor = child.walk();
                    for pkg_child in child.children(&mut pkg_cursor) {
                        if pkg_child.kind() == "package_identifier" {
                            unit.name = ident(pkg_child, src);
                            has_package = true;
                        }
                    }
                    None
                }
                "import_declaration" => Some(Declaration::Gen(parse_gen(child, GenKind::Import, src))),
                "const_declaration" => Some(Declaration::Gen(parse_gen(child, GenKind::Const, src))),
                "var_declaration" => Some(Declaration::Gen(parse_gen(child, GenKind::Var, src))),
                "type_declaration" => {
                    let mut gen = parse_gen(child, GenKind::Type, src);
                    attach_spec_docs(&mut gen, child, &mut blocks, source);
                    Some(Declaration::Gen(gen))
                }
                "function_declaration" | "method_declaration" => {
                    parse_func(child, src).map(Declaration::Func)
                }
                _ => None,
            };

            if let Some(mut decl) = decl {
                let doc = take_doc(&mut blocks, child, source);
                match &mut decl {
                    Declaration::Func(func) => func.doc = doc,
                    Declaration::Gen(gen) => gen.doc = doc,
                }
                unit.decls.push(decl);
            }
        }

        if !has_package {
            return Err(Error::parse(&unit.path, "missing package clause"));
        }

        unit.comments = blocks
            .into_iter()
            .filter(|b| !b.attached)
            .map(|b| b.block)
            .collect();

        Ok(unit)
    }
}

/// A comment node before grouping
struct RawComment {
    text: String,
    start: usize,
    end: usize,
    start_row: usize,
    end_row: usize,
}

/// A grouped comment block with the layout facts doc attachment needs
struct RawBlock {
    block: CommentBlock,
    end: usize,
    end_row: usize,
    own_line: bool,
    attached: bool,
}

fn pos_of(node: Node) -> Pos {
    Pos::from_byte(node.start_byte())
}

fn node_text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or("").to_string()
}

/// Source text with runs of whitespace collapsed to one space
fn normalized_text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src)
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn ident(node: Node, src: &[u8]) -> Ident {
    Ident::at(node.utf8_text(src).unwrap_or(""), pos_of(node))
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Collect every comment node of the tree in source order
fn collect_comments(node: Node, src: &[u8], out: &mut Vec<RawComment>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "comment" {
            out.push(RawComment {
                text: node_text(child, src),
                start: child.start_byte(),
                end: child.end_byte(),
                start_row: child.start_position().row,
                end_row: child.end_position().row,
            });
        } else if child.child_count() > 0 {
            collect_comments(child, src, out);
        }
    }
}

/// Group comments separated by at most one line break and nothing but whitespace
fn group_comments(comments: Vec<RawComment>, source: &str) -> Vec<RawBlock> {
    let mut blocks: Vec<RawBlock> = Vec::new();

    for comment in comments {
        let comment_pos = Pos::from_byte(comment.start);
        if let Some(last) = blocks.last_mut() {
            let between = &source[last.end..comment.start];
            // a comment trailing code is a group of its own
            let trailing_ends = !last.own_line && comment.start_row > last.end_row;
            if !trailing_ends && comment.start_row <= last.end_row + 1 && between.trim().is_empty() {
                last.block.list.push(Comment::new(&comment.text, comment_pos));
                last.end = comment.end;
                last.end_row = comment.end_row;
                continue;
            }
        }

        let line_prefix = source[..comment.start].rsplit('\n').next().unwrap_or("");
        blocks.push(RawBlock {
            block: CommentBlock::new(vec![Comment::new(&comment.text, comment_pos)]),
            end: comment.end,
            end_row: comment.end_row,
            own_line: line_prefix.trim().is_empty(),
            attached: false,
        });
    }

    blocks
}

/// Attach the block that ends on the line right above `node` as its doc comment
fn take_doc(blocks: &mut [RawBlock], node: Node, source: &str) -> Option<CommentBlock> {
    let row = node.start_position().row;
    let start = node.start_byte();
    let block = blocks.iter_mut().find(|b| {
        !b.attached
            && b.own_line
            && b.end <= start
            && b.end_row + 1 == row
            && source[b.end..start].trim().is_empty()
    })?;
    block.attached = true;
    Some(block.block.clone())
}

/// Attach doc comments to the type specs of a parenthesized group.
/// An ungrouped spec shares its declaration's doc comment.
fn attach_spec_docs(gen: &mut GenDecl, node: Node, blocks: &mut [RawBlock], source: &str) {
    let mut cursor = node.walk();
    let grouped = node.children(&mut cursor).any(|c| c.kind() == "(");
    if !grouped {
        return;
    }

    let mut cursor = node.walk();
    let spec_nodes = node
        .named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "type_spec" | "type_alias"));
    for (spec, spec_node) in gen.specs.iter_mut().zip(spec_nodes) {
        if let Spec::Type(ty) = spec {
            ty.doc = take_doc(blocks, spec_node, source);
        }
    }
}

/// Parse an import/const/var/type declaration with all of its specs
fn parse_gen(node: Node, kind: GenKind, src: &[u8]) -> GenDecl {
    let mut specs = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec_list" | "var_spec_list" => {
                let mut list_cursor = child.walk();
                for spec in child.named_children(&mut list_cursor) {
                    if let Some(spec) = parse_spec(spec, src) {
                        specs.push(spec);
                    }
                }
            }
            _ => {
                if let Some(spec) = parse_spec(child, src) {
                    specs.push(spec);
                }
            }
        }
    }

    GenDecl {
        doc: None,
        kind,
        specs,
        pos: pos_of(node),
    }
}

fn parse_spec(node: Node, src: &[u8]) -> Option<Spec> {
    match node.kind() {
        "import_spec" => {
            let path = node.child_by_field_name("path")?;
            let path = node_text(path, src)
                .trim_matches(|c| c == '"' || c == '`')
                .to_string();
            Some(Spec::Import(ImportSpec {
                name: node.child_by_field_name("name").map(|n| ident(n, src)),
                path,
                pos: pos_of(node),
            }))
        }
        "const_spec" | "var_spec" => {
            let mut cursor = node.walk();
            let names = node
                .children_by_field_name("name", &mut cursor)
                .map(|n| ident(n, src))
                .collect();
            let ty = node.child_by_field_name("type").map(|t| parse_type(t, src));
            let values = node
                .child_by_field_name("value")
                .map(|list| {
                    let mut value_cursor = list.walk();
                    list.named_children(&mut value_cursor)
                        .filter(|v| v.kind() != "comment")
                        .map(|v| normalized_text(v, src))
                        .collect()
                })
                .unwrap_or_default();
            Some(Spec::Value(ValueSpec { names, ty, values }))
        }
        "type_spec" | "type_alias" => {
            let name = ident(node.child_by_field_name("name")?, src);
            let ty = parse_type(node.child_by_field_name("type")?, src);
            Some(Spec::Type(TypeSpec {
                doc: None,
                name,
                ty,
            }))
        }
        _ => None,
    }
}

/// Parse a function or method declaration
fn parse_func(node: Node, src: &[u8]) -> Option<FuncDecl> {
    let name = ident(node.child_by_field_name("name")?, src);

    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|r| parse_params(r, src).into_iter().next());

    let params = node
        .child_by_field_name("parameters")
        .map(|p| parse_params(p, src))
        .unwrap_or_default();

    let results = match node.child_by_field_name("result") {
        Some(r) if r.kind() == "parameter_list" => parse_params(r, src),
        Some(r) => vec![Field::unnamed(parse_type(r, src))],
        None => Vec::new(),
    };

    Some(FuncDecl {
        doc: None,
        name,
        receiver,
        params,
        results,
        pos: pos_of(node),
    })
}

/// Parse a parameter list into fields, one per declaration
fn parse_params(node: Node, src: &[u8]) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" => {
                let Some(ty) = child.child_by_field_name("type") else {
                    continue;
                };
                let mut name_cursor = child.walk();
                let names = child
                    .children_by_field_name("name", &mut name_cursor)
                    .map(|n| ident(n, src))
                    .collect();
                fields.push(Field {
                    names,
                    ty: parse_type(ty, src),
                    tag: None,
                });
            }
            "variadic_parameter_declaration" => {
                let Some(ty) = child.child_by_field_name("type") else {
                    continue;
                };
                let names = child
                    .child_by_field_name("name")
                    .map(|n| vec![ident(n, src)])
                    .unwrap_or_default();
                fields.push(Field {
                    names,
                    ty: TypeExpr::Other(format!("...{}", parse_type(ty, src))),
                    tag: None,
                });
            }
            _ => {}
        }
    }

    fields
}

/// Parse a type node
fn parse_type(node: Node, src: &[u8]) -> TypeExpr {
    match node.kind() {
        "type_identifier" | "qualified_type" => TypeExpr::Name(normalized_text(node, src)),
        "pointer_type" => match node.named_child(0) {
            Some(inner) => TypeExpr::pointer(parse_type(inner, src)),
            None => TypeExpr::Other(normalized_text(node, src)),
        },
        "generic_type" => {
            let Some(base) = node.child_by_field_name("type") else {
                return TypeExpr::Other(normalized_text(node, src));
            };
            let mut args = Vec::new();
            if let Some(list) = node.child_by_field_name("type_arguments") {
                let mut cursor = list.walk();
                for arg in list.named_children(&mut cursor) {
                    // newer grammars wrap each argument in a type_elem node
                    let arg = if arg.kind() == "type_elem" {
                        arg.named_child(0).unwrap_or(arg)
                    } else {
                        arg
                    };
                    args.push(parse_type(arg, src));
                }
            }
            TypeExpr::Generic {
                name: normalized_text(base, src),
                args,
            }
        }
        "struct_type" => TypeExpr::Struct(parse_struct_fields(node, src)),
        _ => TypeExpr::Other(normalized_text(node, src)),
    }
}

fn parse_struct_fields(node: Node, src: &[u8]) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut cursor = node.walk();

    for list in node.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut list_cursor = list.walk();
        for decl in list.named_children(&mut list_cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty_node) = decl.child_by_field_name("type") else {
                continue;
            };

            let mut name_cursor = decl.walk();
            let names: Vec<Ident> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| ident(n, src))
                .collect();

            let mut ty = parse_type(ty_node, src);
            // embedded `*T` keeps its star as an anonymous token
            if names.is_empty() {
                let mut star_cursor = decl.walk();
                let starred = decl.children(&mut star_cursor).any(|c| c.kind() == "*");
                if starred {
                    ty = TypeExpr::pointer(ty);
                }
            }

            fields.push(Field {
                names,
                ty,
                tag: decl.child_by_field_name("tag").map(|t| node_text(t, src)),
            });
        }
    }

    fields
}
