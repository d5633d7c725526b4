mod app;
mod cart;
mod catalog;
mod config;
mod controller;
mod debounce;
mod event;
mod logging;
mod query;
mod routing;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prodcat")]
#[command(about = "Browse a product catalog and keep a cart from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./prodcat.yaml, then $XDG_CONFIG_HOME/prodcat/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog API base URL, overrides config and PRODCAT_API_URL
  #[arg(long)]
  api_url: Option<String>,

  /// Initial location, e.g. /page/3
  #[arg(short, long, default_value = "/")]
  route: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override the API URL if specified on command line
  if let Some(url) = args.api_url {
    config.catalog.base_url = url;
  }

  let _log_guard = logging::init(&config)?;

  // Initialize and run the app
  let mut app = app::App::new(&config, &args.route)?;
  app.run().await?;

  Ok(())
}
