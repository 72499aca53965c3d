mod auth;
mod config;
mod entity;
mod error;
mod grid;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "partners=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Partners Admin v{}", env!("CARGO_PKG_VERSION"));

  if config.admins.is_empty() {
    warn!("No admins configured, every admin route will answer 401");
  }

  let app = Arc::new(AppState::new(config).await?);

  let failed =
    plugins::App::new().register(plugins::server::Plugin).run(app).await;
  if !failed.is_empty() {
    anyhow::bail!("Plugins failed to start: {}", failed.join(", "));
  }

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
