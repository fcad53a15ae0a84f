//! viprctl - Main entry point

use clap::Parser;
use log::{debug, info};

use viprctl::{run_command, Cli, ViprError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("Starting viprctl v{}", env!("CARGO_PKG_VERSION"));
    debug!("CLI command: {:?}", cli.command);

    // Dropping the command future on Ctrl-C abandons in-flight requests;
    // the session file is only ever replaced atomically
    let result = tokio::select! {
        result = run_command(&cli) => result,
        _ = tokio::signal::ctrl_c() => Err(ViprError::Cancelled),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
