pub mod server;

use std::sync::Arc;

use crate::state::AppState;

/// A long-lived part of the service started once at boot.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str;

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Starts plugins in registration order and returns the names of those
  /// that failed. A failure does not stop the rest from starting.
  pub async fn run(self, app: Arc<AppState>) -> Vec<&'static str> {
    let mut failed = Vec::new();
    for plugin in self.plugins {
      let name = plugin.name();
      tracing::info!("Starting `{name}`");

      match plugin.start(app.clone()).await {
        Ok(()) => tracing::debug!("`{name}` started"),
        Err(err) => {
          tracing::error!("`{name}` failed to start: {err:#}");
          failed.push(name);
        }
      }
    }
    failed
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{config::Config, sv::test_utils::test_db};

  struct Counting(&'static str, Arc<AtomicUsize>, bool);

  #[async_trait::async_trait]
  impl Plugin for Counting {
    fn name(&self) -> &'static str {
      self.0
    }

    async fn start(&self, _: Arc<AppState>) -> anyhow::Result<()> {
      self.1.fetch_add(1, Ordering::SeqCst);
      if self.2 {
        anyhow::bail!("{} refused to start", self.0);
      }
      Ok(())
    }
  }

  #[tokio::test]
  async fn test_run_reports_failed_plugins() {
    let config = Config {
      database_url: "sqlite::memory:".into(),
      port: 0,
      admins: Vec::new(),
      settings: Default::default(),
      rate_per_second: 1,
      rate_burst: 1,
    };
    let app = Arc::new(AppState::with_db(test_db::setup().await, config));
    let started = Arc::new(AtomicUsize::new(0));

    let failed = App::new()
      .register(Counting("first", started.clone(), true))
      .register(Counting("second", started.clone(), false))
      .register(Counting("third", started.clone(), true))
      .run(app)
      .await;

    assert_eq!(failed, ["first", "third"]);
    assert_eq!(started.load(Ordering::SeqCst), 3);
  }
}
