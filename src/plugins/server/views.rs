use serde::Serialize;

use crate::{
  auth::Flash,
  entity::{partner_discount, user},
};

#[derive(Debug, Serialize)]
pub struct IndexView {
  pub locale_datatables: String,
  pub datatable_url: &'static str,
  pub create_url: &'static str,
  pub csrf_token: String,
  pub flash: Option<Flash>,
}

/// Create and edit forms; `partner` is only set when editing.
#[derive(Debug, Serialize)]
pub struct FormView {
  pub action: String,
  pub method: &'static str,
  pub csrf_token: String,
  pub partners: Vec<partner_discount::Model>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub partner: Option<partner_discount::Model>,
  pub users: Vec<user::Model>,
}
