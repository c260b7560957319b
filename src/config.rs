use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub roots: RootsConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Search roots used to resolve import paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootsConfig {
    /// Language installation root (its `src` holds the standard library)
    pub lang_root: Option<PathBuf>,
    /// Workspace roots, each with a `src` directory of packages
    pub workspace_roots: Vec<PathBuf>,
}

/// Which files and declarations make it into the output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Accept `_test.go` files and test packages
    pub include_tests: bool,
    /// Glob patterns matched against file names
    pub exclude: Vec<String>,
    /// Reduce packages to their exported API
    pub exported_only: bool,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_tests: false,
            exclude: Vec::new(),
            exported_only: true,
        }
    }
}

impl RootsConfig {
    /// Read `GOROOT` and `GOPATH` from the process environment.
    ///
    /// Only the binary calls this, once at startup.
    pub fn from_env() -> Self {
        let lang_root = std::env::var_os("GOROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let workspace_roots = std::env::var_os("GOPATH")
            .map(|v| std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        Self {
            lang_root,
            workspace_roots,
        }
    }

    /// Fill unset roots from `other`
    pub fn or(mut self, other: RootsConfig) -> Self {
        if self.lang_root.is_none() {
            self.lang_root = other.lang_root;
        }
        if self.workspace_roots.is_empty() {
            self.workspace_roots = other.workspace_roots;
        }
        self
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        roots: Vec<PathBuf>,
        lang_root: Option<PathBuf>,
        include_tests: bool,
        all: bool,
        format: Option<String>,
    ) {
        if !roots.is_empty() {
            self.roots.workspace_roots = roots;
        }

        if let Some(root) = lang_root {
            self.roots.lang_root = Some(root);
        }

        if include_tests {
            self.filter.include_tests = true;
        }

        if all {
            self.filter.exported_only = false;
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.filter.exclude {
            glob::Pattern::new(pattern)?;
        }

        let empty_root = self
            .roots
            .lang_root
            .iter()
            .chain(self.roots.workspace_roots.iter())
            .any(|root| root.as_os_str().is_empty());
        if empty_root {
            return Err(Error::config_validation("search roots cannot be empty paths"));
        }

        Ok(())
    }
}
