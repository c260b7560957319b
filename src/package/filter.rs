// Export filtering
//
// Prunes a merged package down to exported declarations. Every pass keeps
// order and is idempotent: filtering filtered content changes nothing.

use crate::package::merge::MergedUnit;
use crate::parser::{is_exported, CompilationUnit, Declaration, Field, Spec};

/// Prune non-exported content of a merged package.
///
/// Returns whether any declaration survived.
pub fn filter_exported(merged: &mut MergedUnit) -> bool {
    filter_unit(&mut merged.unit)
}

/// Prune non-exported declarations of a unit, returning whether any remain
pub fn filter_unit(unit: &mut CompilationUnit) -> bool {
    unit.decls.retain_mut(filter_decl);
    !unit.decls.is_empty()
}

/// Prune a declaration, returning whether it should be kept
pub fn filter_decl(decl: &mut Declaration) -> bool {
    match decl {
        Declaration::Func(func) => {
            let receiver_ok = func
                .receiver
                .as_ref()
                .map_or(true, |recv| exported_receiver(recv));
            receiver_ok && func.name.is_exported()
        }
        Declaration::Gen(gen) => {
            gen.specs.retain_mut(filter_spec);
            !gen.specs.is_empty()
        }
    }
}

// Receivers of unusual shape are let through
fn exported_receiver(recv: &Field) -> bool {
    recv.ty.base_name().map_or(true, is_exported)
}

/// Prune a spec, returning whether it should be kept
pub fn filter_spec(spec: &mut Spec) -> bool {
    match spec {
        Spec::Import(_) => true,
        Spec::Value(value) => {
            // values pair with names unless one call yields them all
            if value.values.len() == value.names.len() {
                let (names, values): (Vec<_>, Vec<_>) = value
                    .names
                    .drain(..)
                    .zip(value.values.drain(..))
                    .filter(|(name, _)| name.is_exported())
                    .unzip();
                value.names = names;
                value.values = values;
            } else {
                value.names.retain(|n| n.is_exported());
            }
            !value.names.is_empty()
        }
        Spec::Type(ty) => {
            if !ty.name.is_exported() {
                return false;
            }
            if let Some(fields) = ty.ty.struct_fields_mut() {
                filter_fields(fields);
            }
            true
        }
    }
}

/// Drop unexported field names, then fields left without names
fn filter_fields(fields: &mut Vec<Field>) {
    fields.retain_mut(|field| {
        field.names.retain(|n| n.is_exported());
        if field.names.is_empty() {
            return false;
        }
        if let Some(inner) = field.ty.struct_fields_mut() {
            filter_fields(inner);
        }
        true
    });
}
