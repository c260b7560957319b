// Path resolution against configured search roots
//
// Each root holds packages under `<root>/src/<import path>`. Roots come from
// configuration; nothing here reads the environment.

use crate::config::RootsConfig;
use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Language root followed by workspace roots
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
    roots: Vec<PathBuf>,
}

impl SearchRoots {
    pub fn new(config: &RootsConfig) -> Self {
        let roots = config
            .lang_root
            .iter()
            .chain(config.workspace_roots.iter())
            .cloned()
            .collect();
        Self { roots }
    }

    /// Roots in search order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Absolute form of `path`.
    ///
    /// Absolute paths are returned as-is, `.`-prefixed paths are resolved when
    /// they exist, anything else is looked up as `<root>/src/<path>`. Falls back
    /// to `path` itself.
    pub fn abs(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if path.is_empty() || candidate.is_absolute() {
            return candidate.to_path_buf();
        }

        if path.starts_with('.') {
            if let Ok(abs) = candidate.canonicalize() {
                return abs;
            }
        }

        for root in &self.roots {
            let abs = root.join("src").join(path);
            if abs.exists() {
                return abs;
            }
        }

        candidate.to_path_buf()
    }

    /// Import path of a package directory: its location below the first
    /// `<root>/src` that contains it.
    pub fn import_path(&self, dir: &Path) -> Result<String> {
        for root in &self.roots {
            let Ok(rel) = dir.strip_prefix(root.join("src")) else {
                continue;
            };
            let parts: Vec<String> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if !parts.is_empty() {
                return Ok(parts.join("/"));
            }
        }
        Err(Error::UnresolvedPackagePath(dir.to_path_buf()))
    }
}

/// Check whether a directory name can hold a package
pub fn is_package_dir_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('_')
        && !name.starts_with('.')
        && name != "testdata"
        && name != "vendor"
}

/// Visit `root` and every package directory below it.
///
/// A `src` directory is descended into but not visited itself. When `root` is
/// not a directory it is visited as-is. Entries that cannot be read go to
/// `skipped` and the walk continues.
pub fn walk_packages<F, S>(root: &Path, mut visit: F, mut skipped: S) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
    S: FnMut(PathBuf, Error),
{
    if !root.is_dir() {
        return visit(root);
    }

    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                skipped(path, err.into());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name == "src" {
            continue;
        }
        if entry.depth() > 0 && !is_package_dir_name(&name) {
            walker.skip_current_dir();
            continue;
        }
        visit(entry.path())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn roots(lang: Option<&Path>, workspaces: &[&Path]) -> SearchRoots {
        SearchRoots::new(&RootsConfig {
            lang_root: lang.map(Path::to_path_buf),
            workspace_roots: workspaces.iter().map(|p| p.to_path_buf()).collect(),
        })
    }

    #[test]
    fn test_import_path() {
        let search = roots(Some(Path::new("/usr/local/go")), &[Path::new("/home/dev/go")]);
        assert_eq!(
            search.import_path(Path::new("/usr/local/go/src/encoding/json")).unwrap(),
            "encoding/json"
        );
        assert_eq!(
            search.import_path(Path::new("/home/dev/go/src/example.com/shapes")).unwrap(),
            "example.com/shapes"
        );
    }

    #[test]
    fn test_import_path_unresolved() {
        let search = roots(None, &[Path::new("/home/dev/go")]);
        let result = search.import_path(Path::new("/tmp/loose"));
        assert!(matches!(result, Err(Error::UnresolvedPackagePath(_))));
        // the src directory itself is not a package
        assert!(search.import_path(Path::new("/home/dev/go/src")).is_err());
    }

    #[test]
    fn test_abs_searches_roots() {
        let lang = TempDir::new().unwrap();
        let ws = TempDir::new().unwrap();
        std::fs::create_dir_all(ws.path().join("src/example.com/shapes")).unwrap();
        std::fs::create_dir_all(lang.path().join("src/fmt")).unwrap();

        let search = roots(Some(lang.path()), &[ws.path()]);
        assert_eq!(search.abs("fmt"), lang.path().join("src/fmt"));
        assert_eq!(
            search.abs("example.com/shapes"),
            ws.path().join("src/example.com/shapes")
        );
        assert_eq!(search.abs("missing/pkg"), PathBuf::from("missing/pkg"));
        assert_eq!(search.abs("/already/abs"), PathBuf::from("/already/abs"));
        assert_eq!(search.abs(""), PathBuf::new());
    }

    #[test]
    fn test_is_package_dir_name() {
        assert!(is_package_dir_name("shapes"));
        assert!(!is_package_dir_name("_old"));
        assert!(!is_package_dir_name(".git"));
        assert!(!is_package_dir_name("testdata"));
        assert!(!is_package_dir_name("vendor"));
    }

    #[test]
    fn test_walk_packages() {
        let ws = TempDir::new().unwrap();
        for dir in [
            "src/example.com/shapes/internal",
            "src/example.com/shapes/testdata/golden",
            "src/example.com/shapes/vendor/dep",
            "src/example.com/.cache",
        ] {
            std::fs::create_dir_all(ws.path().join(dir)).unwrap();
        }

        let mut visited = Vec::new();
        walk_packages(
            &ws.path().join("src"),
            |dir| {
                visited.push(dir.strip_prefix(ws.path()).unwrap().to_path_buf());
                Ok(())
            },
            |path, err| panic!("unexpected walk error at {}: {}", path.display(), err),
        )
        .unwrap();

        assert_eq!(
            visited,
            vec![
                PathBuf::from("src/example.com"),
                PathBuf::from("src/example.com/shapes"),
                PathBuf::from("src/example.com/shapes/internal"),
            ]
        );
    }

    #[test]
    fn test_walk_single_file() {
        let mut visited = Vec::new();
        walk_packages(
            Path::new("/no/such/file.go"),
            |p| {
                visited.push(p.to_path_buf());
                Ok(())
            },
            |_, _| {},
        )
        .unwrap();
        assert_eq!(visited, vec![PathBuf::from("/no/such/file.go")]);
    }
}
