use axum::{
  http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};

use super::route;
use crate::{
  auth::{Claims, Flash, FlashLevel},
  state::AppState,
};

pub const FLASH_SUCCESS: HeaderName = HeaderName::from_static("x-flash-success");
pub const FLASH_ERROR: HeaderName = HeaderName::from_static("x-flash-error");

/// Outcome of a write action: where to send the admin and what to tell them.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
  pub to: String,
  pub flash: Option<Flash>,
}

fn is_local_path(target: &str) -> bool {
  target.starts_with('/')
    && !target.starts_with("//")
    && !target.starts_with("/\\")
}

impl Redirect {
  pub fn to(to: impl Into<String>) -> Self {
    Self { to: to.into(), flash: None }
  }

  /// Back to the page the request came from, or the partner list.
  /// Only same-site paths are followed.
  pub fn back(headers: &HeaderMap) -> Self {
    let referer = headers
      .get(header::REFERER)
      .and_then(|value| value.to_str().ok())
      .filter(|value| is_local_path(value));
    Self::to(referer.unwrap_or(route::PARTNERS))
  }

  pub fn with(mut self, flash: Flash) -> Self {
    self.flash = Some(flash);
    self
  }

  /// Stores the flash in the admin's session and answers `303 See Other`.
  pub fn render(self, app: &AppState, claims: &Claims) -> Response {
    let mut headers = HeaderMap::new();

    match HeaderValue::from_str(&self.to) {
      Ok(location) => {
        headers.insert(header::LOCATION, location);
      }
      Err(_) => {
        headers.insert(header::LOCATION, HeaderValue::from_static(route::PARTNERS));
      }
    }

    if let Some(flash) = self.flash {
      let name = match flash.level {
        FlashLevel::Success => FLASH_SUCCESS,
        FlashLevel::Error => FLASH_ERROR,
      };
      if let Ok(value) = HeaderValue::from_str(&flash.message) {
        headers.insert(name, value);
      }
      app.put_flash(claims, flash);
    }

    (StatusCode::SEE_OTHER, headers).into_response()
  }
}
