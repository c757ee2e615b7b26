use stunting_dashboard::config::DashboardConfig;
use stunting_dashboard::dashboard::{AppState, Dashboard};
use stunting_dashboard::render::render_page;
use stunting_dashboard::selection::Selection;
use stunting_dashboard::server::{self, ServerState};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stunting-dashboard")]
#[command(about = "Predicted child-stunting rates for Sub-Saharan Africa, by country")]
#[command(version)]
struct Args {
    /// Folder holding the CSV files (default: next to the executable)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Predictions file name (default: predictions_2026.csv)
    #[arg(long, global = true)]
    predictions_file: Option<String>,

    /// Driver attribution file name (default: country_shap_nowcast.csv)
    #[arg(long, global = true)]
    drivers_file: Option<String>,

    /// Number of drivers listed per country (default: 7)
    #[arg(long, global = true)]
    top_drivers: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard over HTTP (default)
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8501
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Render the page for one selection as static HTML
    Render {
        /// Dropdown value
        #[arg(long)]
        country: Option<String>,

        /// Map click, wins over the dropdown
        #[arg(long)]
        click: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the detail view for a country as JSON
    Detail {
        country: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    match args.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => run_server(config, bind).await,
        Commands::Render { country, click, output } => render_static(config, country, click, output),
        Commands::Detail { country } => print_detail(config, &country),
    }
}

fn build_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = DashboardConfig::from_env().context("Failed to read configuration")?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(name) = &args.predictions_file {
        config.predictions_file = name.clone();
    }
    if let Some(name) = &args.drivers_file {
        config.drivers_file = name.clone();
    }
    if let Some(n) = args.top_drivers {
        anyhow::ensure!(n > 0, "--top-drivers must be at least 1");
        config.top_drivers = n;
    }
    Ok(config)
}

async fn run_server(mut config: DashboardConfig, bind: Option<String>) -> Result<()> {
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }
    let bind_addr = config.bind_addr.clone();
    info!("Data directory: {}", config.data_dir.display());

    let app = AppState::from_load(Dashboard::load(config))?;
    if let AppState::Unavailable { message } = &app {
        error!("{}", message);
        error!("Serving the error page only");
    }

    let state = Arc::new(ServerState::new(app));
    server::serve(state, &bind_addr)
        .await
        .with_context(|| format!("Server on {} stopped", bind_addr))
}

fn render_static(
    config: DashboardConfig,
    country: Option<String>,
    click: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let dashboard = Dashboard::load(config)?;
    let cycle = dashboard.render_cycle(&Selection::new(click, country));
    let html = render_page(&dashboard, &cycle);

    match output {
        Some(path) => {
            std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

fn print_detail(config: DashboardConfig, country: &str) -> Result<()> {
    let dashboard = Dashboard::load(config)?;
    let view = dashboard.detail(country);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
