use std::process::ExitCode;

fn main() -> ExitCode {
    pkgdoc::cli::run()
}
