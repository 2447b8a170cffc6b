//! pulse CLI entrypoint

use clap::Parser;

use pulse::cli::Cli;

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = cli.execute().await {
        // Once logging is up the command has already logged it
        if !tracing::dispatcher::has_been_set() {
            eprintln!("Fatal error: {:#}", e);
        }
        std::process::exit(1);
    }
}
