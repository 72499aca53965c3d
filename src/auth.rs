use std::{collections::HashSet, sync::Arc};

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{config::AdminEntry, prelude::*, state::AppState};

pub const READ_PERMISSION: &str = "admin.partners.read";
pub const WRITE_PERMISSION: &str = "admin.partners.write";

const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
  Success,
  Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
  pub level: FlashLevel,
  pub message: String,
}

impl Flash {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Error, message: message.into() }
  }
}

/// Server side state of a configured admin token.
#[derive(Debug)]
pub struct AdminSession {
  pub admin_id: i64,
  pub permissions: Arc<HashSet<String>>,
  pub csrf_token: String,
  pub flash: Option<Flash>,
}

impl AdminSession {
  pub fn new(entry: &AdminEntry) -> Self {
    Self {
      admin_id: entry.admin_id,
      permissions: Arc::new(entry.permissions.clone()),
      csrf_token: Uuid::new_v4().simple().to_string(),
      flash: None,
    }
  }
}

/// What the acting admin may do. Every partner operation takes one and
/// checks it before touching storage.
#[derive(Debug, Clone)]
pub struct Claims {
  pub admin_id: i64,
  pub token: String,
  pub csrf_token: String,
  permissions: Arc<HashSet<String>>,
}

impl Claims {
  #[allow(dead_code)]
  pub fn new(
    admin_id: i64,
    token: impl Into<String>,
    csrf_token: impl Into<String>,
    permissions: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      admin_id,
      token: token.into(),
      csrf_token: csrf_token.into(),
      permissions: Arc::new(permissions.into_iter().map(Into::into).collect()),
    }
  }

  fn from_session(token: &str, session: &AdminSession) -> Self {
    Self {
      admin_id: session.admin_id,
      token: token.to_string(),
      csrf_token: session.csrf_token.clone(),
      permissions: session.permissions.clone(),
    }
  }

  pub fn can(&self, permission: &str) -> bool {
    self.permissions.contains(WILDCARD) || self.permissions.contains(permission)
  }

  pub fn require(&self, permission: &str) -> Result<()> {
    if self.can(permission) {
      Ok(())
    } else {
      debug!("Admin {} lacks `{}`", self.admin_id, permission);
      Err(Error::Forbidden(permission.to_string()))
    }
  }

  pub fn require_any(&self, permissions: &[&str]) -> Result<()> {
    if permissions.iter().any(|p| self.can(p)) {
      Ok(())
    } else {
      debug!("Admin {} lacks any of {:?}", self.admin_id, permissions);
      Err(Error::Forbidden(permissions.join("|")))
    }
  }

  pub fn verify_csrf(&self, token: Option<&str>) -> Result<()> {
    match token {
      Some(token) if token == self.csrf_token => Ok(()),
      _ => Err(Error::CsrfMismatch),
    }
  }
}

fn bearer(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

impl FromRequestParts<Arc<AppState>> for Claims {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer(parts).ok_or(Error::Unauthenticated)?;
    let session = app.sessions.get(token).ok_or(Error::Unauthenticated)?;
    Ok(Claims::from_session(token, &session))
  }
}
