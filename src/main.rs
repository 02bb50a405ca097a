//! blobscout - Azure Storage account explorer

use blobscout::cli::Cli;
use blobscout::config::{self, Config};
use blobscout::error::Result;
use blobscout::utils::format::DisplayUtils;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Configuration decides the log level, so it loads before logging starts
    let config = match config::load_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(cli.debug || config.debug);
    let display = DisplayUtils::new(cli.no_color || config.no_color);

    if let Err(e) = run(cli, config).await {
        error!("Error: {}", e);
        display.print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    info!("Starting blobscout for account {}", cli.account_name);
    cli.execute(config).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "blobscout=debug"
    } else {
        "blobscout=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
