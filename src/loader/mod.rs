// Loader module: turns directories and source text into registered units
//
// Errors for one file are collected in the report and never stop the others.

pub mod resolve;

pub use resolve::{is_package_dir_name, walk_packages, SearchRoots};

use crate::config::{Config, FilterConfig};
use crate::error::{Error, Result};
use crate::package::{PackageKey, Registry};
use crate::parser::{CompilationUnit, GoParser};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Accept non-test Go source files that are not hidden or ignored
pub fn default_filter(name: &str) -> bool {
    show_test_filter(name) && !name.ends_with("_test.go")
}

/// Accept Go source files, tests included, that are not hidden or ignored
pub fn show_test_filter(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_') && !name.starts_with('.') && name.ends_with(".go")
}

fn is_test_package(name: &str) -> bool {
    name == "test" || name.ends_with("_test")
}

/// File and package acceptance rules
#[derive(Debug, Clone)]
pub struct FileFilter {
    include_tests: bool,
    exclude: Vec<glob::Pattern>,
}

impl FileFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            include_tests: config.include_tests,
            exclude,
        })
    }

    pub fn accepts_file(&self, name: &str) -> bool {
        let accepted = if self.include_tests {
            show_test_filter(name)
        } else {
            default_filter(name)
        };
        accepted && !self.exclude.iter().any(|p| p.matches(name))
    }

    pub fn accepts_package(&self, name: &str) -> bool {
        self.include_tests || !is_test_package(name)
    }
}

/// Outcome of one load call
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Keys that received at least one file
    pub keys: BTreeSet<PackageKey>,
    /// Files that could not be loaded
    pub errors: Vec<(PathBuf, Error)>,
}

impl LoadReport {
    pub fn absorb(&mut self, other: LoadReport) {
        self.keys.extend(other.keys);
        self.errors.extend(other.errors);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, path: &Path, err: Error) {
        warn!(path = %path.display(), error = %err, "skipping file");
        self.errors.push((path.to_path_buf(), err));
    }
}

/// Loads Go sources into a registry
pub struct Loader {
    registry: Registry,
    parser: GoParser,
    roots: SearchRoots,
    filter: FileFilter,
    verbose: bool,
}

impl Loader {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            registry: Registry::new(),
            parser: GoParser::new()?,
            roots: SearchRoots::new(&config.roots),
            filter: FileFilter::new(&config.filter)?,
            verbose: false,
        })
    }

    /// Show a progress bar while parsing directories
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    pub fn roots(&self) -> &SearchRoots {
        &self.roots
    }

    /// Load a package directory or file, or parse `source` as the file at `path`.
    ///
    /// With `source` set, `path` names the file as `<dir>/<name>`; an empty
    /// name is replaced by `_<n>.go`, `n` being the number of files already
    /// registered under the package key.
    pub fn load(&mut self, path: &str, source: Option<&str>) -> Result<LoadReport> {
        match source {
            Some(text) => Ok(self.load_source(path, text)),
            None => {
                let abs = self.roots.abs(path);
                if abs.is_dir() {
                    self.load_dir(&abs)
                } else if abs.is_file() {
                    let mut report = LoadReport::default();
                    self.load_file(&abs, &mut report);
                    Ok(report)
                } else {
                    Err(Error::PathNotFound(abs))
                }
            }
        }
    }

    /// Load every package directory below `path`
    pub fn load_tree(&mut self, path: &str) -> Result<LoadReport> {
        let abs = self.roots.abs(path);
        if !abs.exists() {
            return Err(Error::PathNotFound(abs));
        }

        let mut dirs = Vec::new();
        let mut report = LoadReport::default();
        walk_packages(
            &abs,
            |dir| {
                dirs.push(dir.to_path_buf());
                Ok(())
            },
            |path, err| report.fail(&path, err),
        )?;

        for dir in dirs {
            if !dir.is_dir() {
                self.load_file(&dir, &mut report);
                continue;
            }
            // the walk already reported directories it could not read
            if report.errors.iter().any(|(path, _)| path == &dir) {
                continue;
            }
            match self.load_dir(&dir) {
                Ok(loaded) => report.absorb(loaded),
                Err(err) => report.fail(&dir, err),
            }
        }
        Ok(report)
    }

    /// Load the accepted `.go` files of one directory, sorted by name
    pub fn load_dir(&mut self, dir: &Path) -> Result<LoadReport> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if self.filter.accepts_file(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        files.sort();
        debug!(dir = %dir.display(), files = files.len(), "loading directory");

        let progress = if self.verbose && !files.is_empty() {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let mut report = LoadReport::default();
        for path in &files {
            if let Some(ref pb) = progress {
                let msg = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                pb.set_message(msg);
            }
            self.load_file(path, &mut report);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(report)
    }

    fn load_file(&mut self, path: &Path, report: &mut LoadReport) {
        let dir = path.parent().unwrap_or(Path::new(""));
        let import_path = match self.roots.import_path(dir) {
            Ok(import_path) => import_path,
            Err(err) => return report.fail(path, err),
        };
        let unit = match self.parser.parse_file(path) {
            Ok(unit) => unit,
            Err(err) => return report.fail(path, err),
        };
        self.register(&import_path, path.to_path_buf(), unit, report);
    }

    fn load_source(&mut self, path: &str, text: &str) -> LoadReport {
        let mut report = LoadReport::default();
        let (dir, name) = match path.rfind(|c: char| c == '/' || c == '\\') {
            Some(at) => (&path[..at], &path[at + 1..]),
            None => ("", path),
        };
        let dir = self.roots.abs(dir);
        let placeholder = dir.join(if name.is_empty() { "_.go" } else { name });

        let import_path = match self.roots.import_path(&dir) {
            Ok(import_path) => import_path,
            Err(err) => {
                report.fail(&placeholder, err);
                return report;
            }
        };
        let mut unit = match self.parser.parse_source(text, placeholder.clone()) {
            Ok(unit) => unit,
            Err(err) => {
                report.fail(&placeholder, err);
                return report;
            }
        };

        let file = if name.is_empty() {
            let key = PackageKey::for_package(&import_path, &unit.name.name);
            let n = self.registry.lookup(&key).map_or(0, |p| p.len());
            let file = dir.join(format!("_{}.go", n));
            unit.path = file.clone();
            file
        } else {
            placeholder
        };

        self.register(&import_path, file, unit, &mut report);
        report
    }

    fn register(
        &mut self,
        import_path: &str,
        path: PathBuf,
        unit: CompilationUnit,
        report: &mut LoadReport,
    ) {
        if !self.filter.accepts_package(&unit.name.name) {
            debug!(path = %path.display(), package = %unit.name.name, "test package skipped");
            return;
        }

        let key = PackageKey::for_package(import_path, &unit.name.name);
        match self.registry.register(key.clone(), path.clone(), unit) {
            Ok(()) => {
                info!(key = %key, path = %path.display(), "registered");
                report.keys.insert(key);
            }
            Err(err) => report.fail(&path, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootsConfig;
    use tempfile::TempDir;

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let ws = TempDir::new().unwrap();
        for (rel, text) in files {
            let path = ws.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        ws
    }

    fn loader(ws: &TempDir, include_tests: bool) -> Loader {
        let mut config = Config::default();
        config.roots = RootsConfig {
            lang_root: None,
            workspace_roots: vec![ws.path().to_path_buf()],
        };
        config.filter.include_tests = include_tests;
        Loader::new(&config).unwrap()
    }

    #[test]
    fn test_default_filter() {
        assert!(default_filter("widget.go"));
        assert!(!default_filter("widget_test.go"));
        assert!(!default_filter("_widget.go"));
        assert!(!default_filter(".widget.go"));
        assert!(!default_filter("widget.txt"));
        assert!(!default_filter(""));
    }

    #[test]
    fn test_show_test_filter() {
        assert!(show_test_filter("widget_test.go"));
        assert!(show_test_filter("widget.go"));
        assert!(!show_test_filter("_widget_test.go"));
    }

    #[test]
    fn test_file_filter_excludes() {
        let filter = FileFilter::new(&FilterConfig {
            include_tests: false,
            exclude: vec!["*_gen.go".to_string()],
            exported_only: true,
        })
        .unwrap();
        assert!(filter.accepts_file("widget.go"));
        assert!(!filter.accepts_file("widget_gen.go"));
        assert!(!filter.accepts_package("shapes_test"));
        assert!(filter.accepts_package("shapes"));
    }

    #[test]
    fn test_load_directory() {
        let ws = workspace(&[
            ("src/example.com/shapes/b.go", "package shapes\n\nfunc B() {}\n"),
            ("src/example.com/shapes/a.go", "package shapes\n\nfunc A() {}\n"),
            ("src/example.com/shapes/a_test.go", "package shapes\n\nfunc TestA() {}\n"),
            ("src/example.com/shapes/notes.txt", "not go"),
        ]);
        let mut loader = loader(&ws, false);
        let report = loader.load("example.com/shapes", None).unwrap();
        assert!(report.is_clean());

        let key = PackageKey::new("example.com/shapes");
        assert_eq!(report.keys.iter().collect::<Vec<_>>(), vec![&key]);
        let names: Vec<&str> = loader
            .registry()
            .lookup(&key)
            .unwrap()
            .units()
            .map(|u| u.file_name())
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_load_with_tests_and_variants() {
        let ws = workspace(&[
            ("src/example.com/shapes/a.go", "package shapes\n"),
            ("src/example.com/shapes/a_test.go", "package shapes_test\n"),
            ("src/example.com/shapes/main.go", "package main\n"),
        ]);
        let mut loader = loader(&ws, true);
        let report = loader.load("example.com/shapes", None).unwrap();
        let keys: Vec<String> = report.keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["example.com/shapes", "example.com/shapes::main", "example.com/shapes::test"]
        );
    }

    #[test]
    fn test_parse_error_isolated() {
        let ws = workspace(&[
            ("src/example.com/shapes/good.go", "package shapes\n\nfunc Good() {}\n"),
            ("src/example.com/shapes/bad.go", "package shapes\n\nfunc Bad( {\n"),
        ]);
        let mut loader = loader(&ws, false);
        let report = loader.load("example.com/shapes", None).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].0.ends_with("bad.go"));
        assert!(matches!(report.errors[0].1, Error::Parse { .. }));
        assert_eq!(report.keys.len(), 1);
    }

    #[test]
    fn test_duplicate_load_reported() {
        let ws = workspace(&[("src/example.com/shapes/a.go", "package shapes\n")]);
        let mut loader = loader(&ws, false);
        loader.load("example.com/shapes", None).unwrap();
        let report = loader.load("example.com/shapes", None).unwrap();
        assert!(matches!(report.errors[0].1, Error::DuplicateUnit { .. }));
        assert_eq!(loader.registry().lookup(&PackageKey::new("example.com/shapes")).unwrap().len(), 1);
    }

    #[test]
    fn test_load_source_unnamed() {
        let ws = workspace(&[]);
        std::fs::create_dir_all(ws.path().join("src/example.com/shapes")).unwrap();
        let mut loader = loader(&ws, false);

        loader.load("example.com/shapes/", Some("package shapes\n")).unwrap();
        let report = loader.load("example.com/shapes/", Some("package shapes\n")).unwrap();
        assert!(report.is_clean());

        let key = PackageKey::new("example.com/shapes");
        let names: Vec<&str> = loader
            .registry()
            .lookup(&key)
            .unwrap()
            .units()
            .map(|u| u.file_name())
            .collect();
        assert_eq!(names, vec!["_0.go", "_1.go"]);
    }

    #[test]
    fn test_load_source_outside_roots() {
        let ws = workspace(&[]);
        let mut loader = loader(&ws, false);
        let report = loader.load("/tmp/elsewhere/x.go", Some("package x\n")).unwrap();
        assert!(matches!(report.errors[0].1, Error::UnresolvedPackagePath(_)));
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn test_load_missing_path() {
        let ws = workspace(&[]);
        let mut loader = loader(&ws, false);
        assert!(matches!(
            loader.load("example.com/missing", None),
            Err(Error::PathNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_tree_skips_unreadable_dir() {
        use std::os::unix::fs::PermissionsExt;

        let ws = workspace(&[
            ("src/example.com/a/a.go", "package a\n"),
            ("src/example.com/locked/l.go", "package locked\n"),
            ("src/example.com/z/z.go", "package z\n"),
        ]);
        let locked = ws.path().join("src/example.com/locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let readable = std::fs::read_dir(&locked).is_ok();

        let mut loader = loader(&ws, false);
        let root = ws.path().join("src");
        let report = loader.load_tree(root.to_str().unwrap());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let report = report.unwrap();
        let keys: Vec<String> = report.keys.iter().map(|k| k.to_string()).collect();
        assert!(keys.contains(&"example.com/a".to_string()));
        assert!(keys.contains(&"example.com/z".to_string()));

        // permission bits do not bind a privileged user
        if !readable {
            assert_eq!(keys.len(), 2);
            assert_eq!(report.errors.len(), 1);
            assert_eq!(report.errors[0].0, locked);
        }
    }

    #[test]
    fn test_load_tree() {
        let ws = workspace(&[
            ("src/example.com/shapes/a.go", "package shapes\n"),
            ("src/example.com/shapes/round/c.go", "package round\n"),
            ("src/example.com/shapes/testdata/t.go", "package fixture\n"),
        ]);
        let mut loader = loader(&ws, false);
        let root = ws.path().join("src");
        let report = loader.load_tree(root.to_str().unwrap()).unwrap();
        let keys: Vec<String> = report.keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["example.com/shapes", "example.com/shapes/round"]);
    }
}
