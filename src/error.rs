use std::collections::BTreeMap;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::ValidationErrors;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Db(#[from] sea_orm::DbErr),
  #[error("Partner not found")]
  PartnerNotFound,
  #[error("The given data was invalid")]
  Validation(FieldErrors),
  #[error("Unauthenticated")]
  Unauthenticated,
  #[error("Missing permission `{0}`")]
  Forbidden(String),
  #[error("CSRF token mismatch")]
  CsrfMismatch,
  #[error("{0}")]
  InvalidArgs(String),
}

impl Error {
  /// Text safe to show to an admin, without storage internals.
  pub fn user_message(&self) -> String {
    match self {
      Error::Db(_) => "Internal error, please try again later".into(),
      other => other.to_string(),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::PartnerNotFound => StatusCode::NOT_FOUND,
      Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::Unauthenticated => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) | Error::CsrfMismatch => StatusCode::FORBIDDEN,
      Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
    }
  }
}

/// Validation messages keyed by form field.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[allow(dead_code)]
  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  pub fn merge(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }
}

impl From<ValidationErrors> for FieldErrors {
  fn from(errors: ValidationErrors) -> Self {
    let mut fields = FieldErrors::default();
    for (field, errs) in errors.field_errors() {
      for err in errs.iter() {
        let message = match &err.message {
          Some(message) => message.to_string(),
          None => format!("The {field} field is invalid."),
        };
        fields.add(field.to_string(), message);
      }
    }
    fields
  }
}

#[derive(Serialize)]
struct ErrorBody {
  message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  errors: Option<FieldErrors>,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("Request failed: {self}");
    }

    let message = self.user_message();
    let errors = match self {
      Error::Validation(fields) => Some(fields),
      _ => None,
    };

    (status, Json(ErrorBody { message, errors })).into_response()
  }
}
