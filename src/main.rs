use clap::Parser;
use trendscout::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    // stdout carries the JSON reports; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}
