use serde::Serialize;

use super::route;
use crate::{
  config::Settings,
  entity::{partner_discount, user},
  prelude::*,
  utils::{diff_for_humans, escape_html},
};

/// One rendered grid row. `actions` and `user` are HTML fragments.
#[derive(Debug, Serialize)]
pub struct PartnerRow {
  pub id: i32,
  pub user_id: i64,
  pub actions: String,
  pub user: String,
  pub created_at: String,
  pub partner_discount: String,
  pub registered_user_discount: String,
  pub referral_system_commission: String,
}

pub struct RowContext<'a> {
  pub settings: &'a Settings,
  pub csrf_token: &'a str,
  pub now: DateTime,
}

impl RowContext<'_> {
  pub fn row(
    &self,
    partner: partner_discount::Model,
    user: Option<user::Model>,
  ) -> PartnerRow {
    PartnerRow {
      id: partner.id,
      user_id: partner.user_id,
      actions: actions(partner.id, self.csrf_token),
      user: user_link(partner.user_id, user.as_ref()),
      created_at: diff_for_humans(partner.created_at, self.now),
      partner_discount: percent(partner.partner_discount),
      registered_user_discount: percent(partner.registered_user_discount),
      referral_system_commission: commission(&partner, self.settings),
    }
  }
}

fn actions(id: i32, csrf_token: &str) -> String {
  format!(
    r#"<a data-content="Edit" data-toggle="popover" data-trigger="hover" data-placement="top" href="{edit}" class="mr-1 btn btn-sm btn-info"><i class="fas fa-pen"></i></a>
<form class="d-inline" onsubmit="return submitResult();" method="post" action="{destroy}">
<input type="hidden" name="_token" value="{token}">
<input type="hidden" name="_method" value="DELETE">
<button data-content="Delete" data-toggle="popover" data-trigger="hover" data-placement="top" class="mr-1 btn btn-sm btn-danger"><i class="fas fa-trash"></i></button>
</form>"#,
    edit = route::partner_edit(id),
    destroy = route::partner(id),
    token = escape_html(csrf_token),
  )
}

fn user_link(user_id: i64, user: Option<&user::Model>) -> String {
  match user {
    Some(user) => format!(
      r#"<a href="{}">{}</a>"#,
      route::user_show(user_id),
      escape_html(&user.name)
    ),
    None => "Unknown user".into(),
  }
}

fn percent(value: i32) -> String {
  format!("{value}%")
}

fn commission(partner: &partner_discount::Model, settings: &Settings) -> String {
  match partner.commission_override() {
    Some(rate) => percent(rate),
    None => format!("Default ({})", percent(settings.referral_percentage)),
  }
}
