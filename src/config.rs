use std::{collections::HashSet, env};

use anyhow::{Context, bail};

/// System-wide values the partner pages read but never write.
#[derive(Debug, Clone)]
pub struct Settings {
  /// Default referral commission, used when a partner has no override.
  pub referral_percentage: i32,
  /// Locale handed to the client-side grid.
  pub datatables_locale: String,
}

impl Default for Settings {
  fn default() -> Self {
    Self { referral_percentage: 10, datatables_locale: "en-gb".into() }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminEntry {
  pub admin_id: i64,
  pub token: String,
  pub permissions: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admins: Vec<AdminEntry>,
  pub settings: Settings,
  pub rate_per_second: u64,
  pub rate_burst: u32,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let admins = env::var("ADMINS").context("ADMINS not set")?;
    let admins = parse_admins(&admins)?;

    let defaults = Settings::default();
    let settings = Settings {
      referral_percentage: parse_var("REFERRAL_PERCENTAGE")?
        .unwrap_or(defaults.referral_percentage),
      datatables_locale: env::var("DATATABLES_LOCALE")
        .unwrap_or(defaults.datatables_locale),
    };

    Ok(Self {
      database_url: env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:partners.db?mode=rwc".into()),
      port: parse_var("PORT")?.unwrap_or(3000),
      admins,
      settings,
      rate_per_second: parse_var("RATE_PER_SECOND")?.unwrap_or(2),
      rate_burst: parse_var("RATE_BURST")?.unwrap_or(100),
    })
  }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
  match env::var(name) {
    Ok(value) => value
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| anyhow::anyhow!("Invalid value for {name}: `{value}`")),
    Err(_) => Ok(None),
  }
}

/// Parses `id:token:perm|perm,id:token:perm` into admin entries.
pub fn parse_admins(input: &str) -> anyhow::Result<Vec<AdminEntry>> {
  let mut admins = Vec::new();
  let mut tokens = HashSet::new();

  for entry in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
    let mut parts = entry.splitn(3, ':');
    let (Some(id), Some(token), Some(permissions)) =
      (parts.next(), parts.next(), parts.next())
    else {
      bail!("Invalid admin entry `{entry}`, expected `id:token:permissions`");
    };

    let admin_id = id
      .trim()
      .parse()
      .with_context(|| format!("Invalid admin id `{id}`"))?;
    let token = token.trim();
    if token.is_empty() {
      bail!("Empty token for admin {admin_id}");
    }
    if !tokens.insert(token.to_string()) {
      bail!("Duplicate token for admin {admin_id}");
    }

    let permissions = permissions
      .split('|')
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(String::from)
      .collect();

    admins.push(AdminEntry { admin_id, token: token.to_string(), permissions });
  }

  Ok(admins)
}
