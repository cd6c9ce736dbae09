use clap::Parser;
use rust_comanda::api::ApiServer;
use rust_comanda::cli::{self, Cli, Commands};
use rust_comanda::config::AppConfig;
use rust_comanda::resource::Catalog;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        service: None,
    }) {
        Commands::Serve { port, service } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(kind) = service {
                config.service.kind = kind;
            }
            tracing::info!(
                "🍽️  Starting {} service (config: {}, data: {})",
                config.service.kind,
                cli.config,
                config.server.data_dir
            );
            let server = ApiServer::new(&config).await?;
            server.start().await?;
        }
        Commands::Account { cmd } => {
            cli::account::handle_account_command(cmd, &config).await?;
        }
        Commands::Menu => {
            println!("{}", serde_json::to_string_pretty(&Catalog::standard())?);
        }
    }

    Ok(())
}
