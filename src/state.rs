use crate::{
  auth::{AdminSession, Claims, Flash},
  config::{Config, Settings},
  prelude::*,
  sv,
};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  /// Admin sessions keyed by bearer token.
  pub sessions: DashMap<String, AdminSession>,
}

pub struct Services<'a> {
  pub partner: sv::Partner<'a>,
  pub user: sv::User<'a>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    info!("Database ready at {}", config.database_url);

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    let sessions = DashMap::new();
    for entry in &config.admins {
      sessions.insert(entry.token.clone(), AdminSession::new(entry));
    }
    info!("Loaded {} admin session(s)", sessions.len());

    Self { db, config, sessions }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      partner: sv::Partner::new(&self.db),
      user: sv::User::new(&self.db),
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.config.settings
  }

  pub fn put_flash(&self, claims: &Claims, flash: Flash) {
    if let Some(mut session) = self.sessions.get_mut(&claims.token) {
      session.flash = Some(flash);
    }
  }

  pub fn take_flash(&self, claims: &Claims) -> Option<Flash> {
    self.sessions.get_mut(&claims.token)?.flash.take()
  }
}
