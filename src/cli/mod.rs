//! CLI module for pkgdoc

mod args;

pub use args::Args;

use crate::config::{Config, OutputFormat, RootsConfig};
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::output::{document_all, to_json, write_text};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `--verbose`
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

pub fn execute(args: Args) -> Result<()> {
    let mut cfg = match &args.config {
        Some(config_path) => Config::load(config_path)?,
        None => Config::load_or_default(Path::new("pkgdoc.toml")),
    };

    // CLI takes precedence, the environment fills what is still unset
    cfg.merge_cli(args.roots, args.lang_root, args.tests, args.all, args.format);
    cfg.roots = cfg.roots.clone().or(RootsConfig::from_env());
    cfg.validate()?;

    let mut loader = Loader::new(&cfg)?.with_verbose(args.verbose);
    for path in &args.paths {
        let path = path.to_string_lossy();
        let result = if args.recursive {
            loader.load_tree(&path)
        } else {
            loader.load(&path, None)
        };

        match result {
            Ok(report) => {
                for (file, err) in &report.errors {
                    eprintln!("{}: {}", file.display(), err);
                }
                info!(path = %path, packages = report.keys.len(), "loaded");
            }
            Err(e) => eprintln!("{}: {}", path, e),
        }
    }

    let registry = loader.into_registry();
    let docs = document_all(&registry, cfg.filter.exported_only);
    if docs.is_empty() {
        return Err(Error::other("no documented packages"));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cfg.output.format {
        OutputFormat::Text => write_text(&docs, &mut out)?,
        OutputFormat::Json => writeln!(out, "{}", to_json(&docs)?)?,
    }

    Ok(())
}
