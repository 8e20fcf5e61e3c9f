use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use trending_digest::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // .env.local first: dotenvy never overrides a variable that is already set.
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    match run(cli).await {
        Ok(()) => {
            tracing::info!("CLI completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            if verbose {
                eprintln!("Error: {e:?}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(1)
        }
    }
}
