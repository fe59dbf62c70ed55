use clap::Parser;
use codex_core::cli::{self, Cli};
use codex_core::exit::CodexExit;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> CodexExit {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd, cli.verbose)
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(CodexExit::Success)
    };

    CodexExit::from(result)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,codex_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
