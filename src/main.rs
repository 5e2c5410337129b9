use std::process::ExitCode;

use clap::Parser;
use sidestep::{acquire_for_host, find_repo_root, launch, Diagnostics};
use tracing_subscriber::EnvFilter;

const INDENT: &str = "   ";

/// Fetch or update sidestepper, then run it in the enclosing repository.
#[derive(Parser)]
#[command(about)]
struct Cli {
    /// Print debug diagnostics while resolving the binary
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("warn,sidestep=debug")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: could not determine working directory: {e}");
            return ExitCode::from(1);
        }
    };
    let Some(root) = find_repo_root(&cwd) else {
        eprintln!("error: could not find a git repository in the working or parent directories");
        return ExitCode::from(1);
    };

    let mut diag = Diagnostics::new();
    let binary = match acquire_for_host(Some(&root), &mut diag) {
        Ok(acquired) => acquired,
        Err(e) => {
            eprintln!("error: {e}");
            if cli.verbose {
                eprint!("{}", diag.render(INDENT));
            }
            return ExitCode::from(e.exit_code());
        }
    };
    tracing::debug!("sidestepper binary is '{}'", binary.path().display());

    match launch(binary.path(), &root) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(3)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn verbose_is_the_only_flag() {
        assert!(!Cli::try_parse_from(["sidestep"]).unwrap().verbose);
        assert!(Cli::try_parse_from(["sidestep", "-v"]).unwrap().verbose);
        assert!(Cli::try_parse_from(["sidestep", "--verbose"]).unwrap().verbose);
        assert!(Cli::try_parse_from(["sidestep", "--version"]).is_err());
        assert!(Cli::try_parse_from(["sidestep", "-V"]).is_err());
        assert!(Cli::try_parse_from(["sidestep", "install"]).is_err());
    }
}
