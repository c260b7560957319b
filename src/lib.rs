//! pkgdoc - Merge Go package sources and extract their exported API
//!
//! Loads the files of Go packages into a registry, merges each package into
//! one canonical tree, prunes it to exported declarations and renders
//! one-line signatures for documentation tools.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod package;
pub mod parser;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use loader::{LoadReport, Loader, SearchRoots};
pub use output::{document_all, PackageDoc};
pub use package::{filter_exported, merge, MergedUnit, PackageKey, PackageUnit, Registry};
pub use parser::{CompilationUnit, GoParser};
