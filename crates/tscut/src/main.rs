//! `tscut` binary.

use clap::Parser;
use tracing::{debug, error};

use tscut::{logging, Cli, TscutConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing();

    let config = TscutConfig::from_env();
    debug!(?config, "Loaded configuration");

    if let Err(e) = tscut::run(cli, &config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
