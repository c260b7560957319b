// Package module: registration, merging and export filtering

pub mod filter;
pub mod imports;
pub mod merge;
pub mod registry;

pub use filter::{filter_decl, filter_exported, filter_spec, filter_unit};
pub use imports::sort_imports;
pub use merge::{
    canonical_lang, is_canonical_name, is_license, license_text, merge, synopsis, MergedUnit,
};
pub use registry::{PackageKey, PackageUnit, Registry, Variant};
