use anyhow::Context;
use clap::{Parser, Subcommand};
use registry_dashboard::config::AppConfig;
use registry_dashboard::pages::{Dashboard, Page, WidgetQuery};
use registry_dashboard::server;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard pages over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render a single page as JSON
    Page {
        /// Page name, e.g. "analysis" or "Data Overview"
        name: String,
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[command(flatten)]
        widgets: WidgetQuery,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            info!(config = ?config, "Serving dashboard");
            let app_config = AppConfig::load_from_file(&config)?;
            let dashboard = Dashboard::from_config(&app_config);

            // Without data no page can render, so load up front.
            let dataset = dashboard.dataset().context("Failed to load registry")?;
            info!(records = dataset.len(), "Registry ready");

            server::start_server(app_config, dashboard).await?;
        }
        Commands::Page { name, config, widgets } => {
            let page: Page = name.parse()?;
            let app_config = AppConfig::load_from_file(&config)?;
            let dashboard = Dashboard::from_config(&app_config);

            let view = dashboard
                .render(page, &widgets)
                .context("Failed to load registry")?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
