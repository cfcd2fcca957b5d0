use clap::Parser;
use oi_snapshot::cli::Cli;
use oi_snapshot::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::bundled()?
        }
    };

    // Initialize telemetry
    let _telemetry = oi_snapshot::telemetry::init_telemetry(&config.telemetry)?;

    cli.command.execute(&config).await
}
