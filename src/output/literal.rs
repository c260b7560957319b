// Literal signatures
//
// One-line textual forms of declarations, stable across runs.

use crate::parser::{Declaration, Field, FuncDecl, ImportSpec, Spec, TypeExpr};

/// First identifier of a spec: value name, quoted import path or type name
pub fn spec_ident_lit(spec: &Spec) -> String {
    match spec {
        Spec::Value(value) => value
            .names
            .first()
            .map(|n| n.name.clone())
            .unwrap_or_default(),
        Spec::Import(imp) => imp.literal(),
        Spec::Type(ty) => ty.name.name.clone(),
    }
}

/// Receiver type of a method as written (`*T` or `T`), empty for functions
pub fn recv_ident_lit(func: &FuncDecl) -> String {
    let Some(recv) = &func.receiver else {
        return String::new();
    };
    match &recv.ty {
        TypeExpr::Pointer(inner) => match inner.as_ref() {
            TypeExpr::Name(_) | TypeExpr::Generic { .. } => format!("*{}", inner),
            _ => String::new(),
        },
        TypeExpr::Name(_) | TypeExpr::Generic { .. } => recv.ty.to_string(),
        _ => String::new(),
    }
}

/// `name, name type` for one parameter or result
pub fn field_lit(field: &Field) -> String {
    field.to_string()
}

/// Comma-joined parameter or result list
pub fn field_list_lit(fields: &[Field]) -> String {
    fields.iter().map(field_lit).collect::<Vec<_>>().join(", ")
}

/// Signature of a function or method
pub fn func_lit(func: &FuncDecl) -> String {
    let params = field_list_lit(&func.params);
    let results = field_list_lit(&func.results);

    let signature = if results.is_empty() {
        format!("{}({})", func.name, params)
    } else if !results.contains(|c: char| c == ' ' || c == ',') {
        format!("{}({}) {}", func.name, params, results)
    } else {
        format!("{}({}) ({})", func.name, params, results)
    };

    let recv = recv_ident_lit(func);
    if recv.is_empty() {
        format!("func {}", signature)
    } else {
        format!("func ({}) {}", recv, signature)
    }
}

/// Literal of a spec: the quoted path for imports, names then type otherwise
pub fn spec_lit(spec: &Spec) -> String {
    match spec {
        Spec::Import(imp) => imp.literal(),
        Spec::Value(value) => {
            let names: Vec<&str> = value.names.iter().map(|n| n.name.as_str()).collect();
            names_with_type(&names, value.ty.as_ref())
        }
        Spec::Type(ty) => names_with_type(&[ty.name.name.as_str()], Some(&ty.ty)),
    }
}

fn names_with_type(names: &[&str], ty: Option<&TypeExpr>) -> String {
    let names = names.join(", ");
    match ty {
        Some(ty) if names.is_empty() => ty.to_string(),
        Some(ty) => format!("{} {}", names, ty),
        None => names,
    }
}

/// One line per function, one line per spec of a general declaration
pub fn declaration_lits(decl: &Declaration) -> Vec<String> {
    match decl {
        Declaration::Func(func) => vec![func_lit(func)],
        Declaration::Gen(gen) => gen
            .specs
            .iter()
            .map(|spec| format!("{} {}", gen.kind.keyword(), spec_lit(spec)))
            .collect(),
    }
}

/// Source form of an import list
pub fn imports_source(imports: &[ImportSpec]) -> String {
    match imports {
        [] => String::new(),
        [single] => format!("import {}\n", single.literal()),
        _ => {
            let mut s = String::from("import (\n");
            for imp in imports {
                s.push_str("    ");
                s.push_str(&imp.literal());
                s.push('\n');
            }
            s.push_str(")\n");
            s
        }
    }
}
