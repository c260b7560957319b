//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Merge Go package files and print their exported API
#[derive(Parser, Debug)]
#[command(name = "pkgdoc")]
#[command(about = "Merge Go package files and print their exported API")]
#[command(version)]
pub struct Args {
    /// Package directories, files or import paths
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Workspace root holding a `src` directory (can be repeated)
    #[arg(long = "root")]
    pub roots: Vec<PathBuf>,

    /// Language installation root
    #[arg(long)]
    pub lang_root: Option<PathBuf>,

    /// Load every package below each path
    #[arg(short, long)]
    pub recursive: bool,

    /// Include test files and test packages
    #[arg(long)]
    pub tests: bool,

    /// Keep unexported declarations
    #[arg(long)]
    pub all: bool,

    /// Output format (text, json)
    #[arg(long, value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
