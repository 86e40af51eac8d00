//! `crm-server`: serves the CRM JSON API over HTTP.
//!
//! Settings come from `config.toml` (see `--config`) with `CRM_*`
//! environment overrides. Run with `--hash-password` to produce the value
//! for `auth_password_hash`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use crm_server::{ServerConfig, auth::hash_password};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "CRM JSON API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = prompt("Password: ")?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let config = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
  let app = crm_server::app(&config)
    .await
    .with_context(|| format!("failed to open store at {}", config.store_path().display()))?;

  let address = config.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(%address, "listening");

  axum::serve(listener, app).await.context("server error")
}

fn prompt(label: &str) -> anyhow::Result<String> {
  use std::io::{BufRead as _, Write as _};
  print!("{label}");
  std::io::stdout().flush()?;
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}
