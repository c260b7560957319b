// Package registry: per-key store of parsed files
//
// Keys are import paths, suffixed with a variant tag when one directory holds
// several packages that must not be merged (`main`, external tests).

use crate::error::{Error, Result};
use crate::package::merge::canonical_lang;
use crate::parser::CompilationUnit;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Variant tag of a package sharing its directory with another package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Main,
    Test,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Main => "main",
            Variant::Test => "test",
        }
    }
}

/// Identity of a logical package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub import_path: String,
    pub variant: Option<Variant>,
}

impl PackageKey {
    pub fn new(import_path: &str) -> Self {
        Self {
            import_path: import_path.to_string(),
            variant: None,
        }
    }

    /// Key for a package declared with `package_name` in the directory at `import_path`
    pub fn for_package(import_path: &str, package_name: &str) -> Self {
        let variant = if package_name == "main" {
            Some(Variant::Main)
        } else if package_name == "test" || package_name.ends_with("_test") {
            Some(Variant::Test)
        } else {
            None
        };
        Self {
            import_path: import_path.to_string(),
            variant,
        }
    }

    /// Parse the display form back into a key
    pub fn parse(s: &str) -> Self {
        match s.rsplit_once("::") {
            Some((path, "main")) => Self {
                import_path: path.to_string(),
                variant: Some(Variant::Main),
            },
            Some((path, "test")) => Self {
                import_path: path.to_string(),
                variant: Some(Variant::Test),
            },
            _ => Self::new(s),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(variant) => write!(f, "{}::{}", self.import_path, variant.as_str()),
            None => f.write_str(&self.import_path),
        }
    }
}

// Keys order by their display form
impl Ord for PackageKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for PackageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The files registered under one key, in registration order
#[derive(Debug, Clone, Default)]
pub struct PackageUnit {
    /// Package name declared by the first registered file
    pub name: String,
    files: Vec<(PathBuf, CompilationUnit)>,
}

impl PackageUnit {
    /// Registered files with their absolute paths
    pub fn files(&self) -> impl Iterator<Item = (&Path, &CompilationUnit)> {
        self.files.iter().map(|(path, unit)| (path.as_path(), unit))
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.files.iter().map(|(_, unit)| unit)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|(p, _)| p == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Keyed store of package units
#[derive(Debug, Default)]
pub struct Registry {
    packages: BTreeMap<PackageKey, PackageUnit>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unit` under `key`. A path may be registered once per key.
    pub fn register(&mut self, key: PackageKey, path: PathBuf, unit: CompilationUnit) -> Result<()> {
        if self.packages.get(&key).map_or(false, |p| p.contains(&path)) {
            return Err(Error::duplicate_unit(key, path));
        }
        let package = self.packages.entry(key).or_default();
        if package.is_empty() {
            package.name = unit.name.name.clone();
        }
        package.files.push((path, unit));
        Ok(())
    }

    pub fn lookup(&self, key: &PackageKey) -> Option<&PackageUnit> {
        self.packages.get(key).filter(|p| !p.is_empty())
    }

    /// Registered keys in order
    pub fn keys(&self) -> impl Iterator<Item = &PackageKey> {
        self.packages.keys()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Language tag of a single-file package named after the canonical convention
    pub fn normal_lang(&self, key: &PackageKey) -> Option<&str> {
        let package = self.lookup(key)?;
        if package.len() != 1 {
            return None;
        }
        let (path, _) = package.files().next()?;
        canonical_lang(path.file_name()?.to_str()?)
    }
}
