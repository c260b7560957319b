// Syntax tree types for parsed Go source files
//
// A `CompilationUnit` is what the parser hands over for one file. The tree only
// keeps what documentation needs: declaration shape, names, positions and comments.
// All types are serializable for caching and debugging.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A source position: 1-based byte offset into the file, `Pos::NONE` when unknown
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos(pub usize);

impl Pos {
    /// The invalid position
    pub const NONE: Pos = Pos(0);

    /// Position of a 0-based byte offset
    pub fn from_byte(byte: usize) -> Self {
        Pos(byte + 1)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Signed distance from `origin` to `self`
    pub fn offset_from(self, origin: Pos) -> i64 {
        self.0 as i64 - origin.0 as i64
    }
}

/// An identifier with its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pos: Pos::NONE,
        }
    }

    pub fn at(name: &str, pos: Pos) -> Self {
        Self {
            name: name.to_string(),
            pos,
        }
    }

    /// End position (one past the last byte of the name)
    pub fn end(&self) -> Pos {
        if self.pos.is_valid() {
            Pos(self.pos.0 + self.name.len())
        } else {
            Pos::NONE
        }
    }

    /// Exported names start with an uppercase letter
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Check the export convention on a bare name
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// A single `//` or `/* */` comment, text includes the markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub pos: Pos,
}

impl Comment {
    pub fn new(text: &str, pos: Pos) -> Self {
        Self {
            text: text.to_string(),
            pos,
        }
    }

    /// Comment text with markers removed
    fn body(&self) -> &str {
        if let Some(rest) = self.text.strip_prefix("//") {
            rest.strip_prefix(' ').unwrap_or(rest)
        } else {
            let rest = self.text.strip_prefix("/*").unwrap_or(&self.text);
            rest.strip_suffix("*/").unwrap_or(rest)
        }
    }
}

/// A run of comments with no blank line between them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBlock {
    pub list: Vec<Comment>,
}

impl CommentBlock {
    pub fn new(list: Vec<Comment>) -> Self {
        Self { list }
    }

    /// Position of the first comment
    pub fn pos(&self) -> Pos {
        self.list.first().map(|c| c.pos).unwrap_or(Pos::NONE)
    }

    /// Number of comments in the block
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Text of the block without comment markers.
    ///
    /// Leading and trailing blank lines are removed, runs of blank lines are
    /// collapsed to one and trailing spaces are trimmed. A non-empty result
    /// ends with a newline.
    pub fn text(&self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for comment in &self.list {
            lines.extend(comment.body().split('\n').map(|l| l.trim_end()));
        }

        let mut out: Vec<&str> = Vec::new();
        for line in lines {
            if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
                continue;
            }
            out.push(line);
        }
        while out.last().map_or(false, |l| l.is_empty()) {
            out.pop();
        }

        if out.is_empty() {
            return String::new();
        }
        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

/// A type expression, reduced to the shapes export filtering cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Named type, possibly package qualified (`int`, `io.Reader`)
    Name(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// Instantiated generic type (`List[T]`)
    Generic { name: String, args: Vec<TypeExpr> },
    /// `struct { ... }`
    Struct(Vec<Field>),
    /// Any other shape, kept as whitespace-normalized source text
    Other(String),
}

impl TypeExpr {
    pub fn name(name: &str) -> Self {
        TypeExpr::Name(name.to_string())
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    /// Base type name, looking through one level of pointer
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Name(name) | TypeExpr::Generic { name, .. } => Some(name),
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Name(name) | TypeExpr::Generic { name, .. } => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Struct fields, looking through one level of pointer
    pub fn struct_fields_mut(&mut self) -> Option<&mut Vec<Field>> {
        match self {
            TypeExpr::Struct(fields) => Some(fields),
            TypeExpr::Pointer(inner) => match inner.as_mut() {
                TypeExpr::Struct(fields) => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, TypeExpr::Struct(_))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) | TypeExpr::Other(name) => f.write_str(name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}[{}]", name, args.join(", "))
            }
            TypeExpr::Struct(fields) => {
                let fields: Vec<String> = fields.iter().map(|fd| fd.to_string()).collect();
                write!(f, "struct{{{}}}", fields.join("; "))
            }
        }
    }
}

/// A parameter, result, receiver or struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Empty for unnamed parameters and embedded fields
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    /// Struct tag literal
    pub tag: Option<String>,
}

impl Field {
    /// An unnamed field of the given type
    pub fn unnamed(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }

    pub fn named(names: &[&str], ty: TypeExpr) -> Self {
        Self {
            names: names.iter().map(|n| Ident::new(n)).collect(),
            ty,
            tag: None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.names.is_empty() {
            return write!(f, "{}", self.ty);
        }
        let names: Vec<&str> = self.names.iter().map(|n| n.name.as_str()).collect();
        write!(f, "{} {}", names.join(", "), self.ty)
    }
}

/// A top-level declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
    Func(FuncDecl),
    Gen(GenDecl),
}

impl Declaration {
    pub fn pos(&self) -> Pos {
        match self {
            Declaration::Func(func) => func.pos,
            Declaration::Gen(gen) => gen.pos,
        }
    }

    pub fn doc(&self) -> Option<&CommentBlock> {
        match self {
            Declaration::Func(func) => func.doc.as_ref(),
            Declaration::Gen(gen) => gen.doc.as_ref(),
        }
    }
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub doc: Option<CommentBlock>,
    pub name: Ident,
    pub receiver: Option<Field>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub pos: Pos,
}

impl FuncDecl {
    pub fn new(name: &str) -> Self {
        Self {
            doc: None,
            name: Ident::new(name),
            receiver: None,
            params: Vec::new(),
            results: Vec::new(),
            pos: Pos::NONE,
        }
    }

    /// Builder-style receiver setter
    pub fn with_receiver(mut self, ty: TypeExpr) -> Self {
        self.receiver = Some(Field::unnamed(ty));
        self
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Receiver's base type name with one pointer level removed
    pub fn receiver_base(&self) -> Option<&str> {
        self.receiver.as_ref().and_then(|r| r.ty.base_name())
    }
}

/// Keyword of a general declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenKind {
    Import,
    Const,
    Var,
    Type,
}

impl GenKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            GenKind::Import => "import",
            GenKind::Const => "const",
            GenKind::Var => "var",
            GenKind::Type => "type",
        }
    }
}

/// An `import`, `const`, `var` or `type` declaration holding one or more specs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenDecl {
    pub doc: Option<CommentBlock>,
    pub kind: GenKind,
    pub specs: Vec<Spec>,
    pub pos: Pos,
}

impl GenDecl {
    pub fn new(kind: GenKind, specs: Vec<Spec>) -> Self {
        Self {
            doc: None,
            kind,
            specs,
            pos: Pos::NONE,
        }
    }
}

/// One entry of a general declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spec {
    Value(ValueSpec),
    Import(ImportSpec),
    Type(TypeSpec),
}

/// `const`/`var` names with optional type and values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    /// Value expressions as source text
    pub values: Vec<String>,
}

impl ValueSpec {
    pub fn new(names: &[&str], ty: Option<TypeExpr>) -> Self {
        Self {
            names: names.iter().map(|n| Ident::new(n)).collect(),
            ty,
            values: Vec::new(),
        }
    }
}

/// An import path with optional local name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    /// Unquoted import path
    pub path: String,
    pub pos: Pos,
}

impl ImportSpec {
    pub fn new(path: &str) -> Self {
        Self {
            name: None,
            path: path.to_string(),
            pos: Pos::NONE,
        }
    }

    /// The path as a quoted string literal
    pub fn literal(&self) -> String {
        format!("\"{}\"", self.path)
    }
}

/// A named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub doc: Option<CommentBlock>,
    pub name: Ident,
    pub ty: TypeExpr,
}

impl TypeSpec {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        Self {
            doc: None,
            name: Ident::new(name),
            ty,
        }
    }
}

/// One parsed source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Absolute source path
    pub path: PathBuf,
    /// Position of the `package` keyword
    pub package_pos: Pos,
    /// Declared package name
    pub name: Ident,
    pub decls: Vec<Declaration>,
    /// Comments not attached to a declaration, in source order
    pub comments: Vec<CommentBlock>,
}

impl CompilationUnit {
    pub fn new(path: PathBuf, package: &str) -> Self {
        Self {
            path,
            package_pos: Pos::NONE,
            name: Ident::new(package),
            decls: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// File name component of the source path
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Directory holding the source file
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// All import specs in declaration order
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Declaration::Gen(gen) if gen.kind == GenKind::Import => gen.specs.as_slice(),
            _ => &[],
        })
        .filter_map(|spec| match spec {
            Spec::Import(imp) => Some(imp),
            _ => None,
        })
    }

    /// Check if the file declares anything besides imports
    pub fn is_empty(&self) -> bool {
        self.decls.iter().all(|decl| {
            matches!(decl, Declaration::Gen(gen) if gen.kind == GenKind::Import)
        })
    }
}
