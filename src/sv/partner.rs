use sea_orm::sea_query::{Expr, LikeExpr};
use serde::Deserialize;
use validator::Validate;

use crate::{
  auth::{Claims, READ_PERMISSION, WRITE_PERMISSION},
  entity::{partner_discount, user},
  error::FieldErrors,
  grid::{GridPage, GridQuery},
  prelude::*,
};

/// A partner record together with the user it belongs to, if that user
/// still exists.
pub type PartnerWithUser = (partner_discount::Model, Option<user::Model>);

/// Raw form submission, as posted by the admin pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerForm {
  pub user_id: Option<String>,
  pub partner_discount: Option<String>,
  pub registered_user_discount: Option<String>,
  pub referral_system_commission: Option<String>,
  #[serde(rename = "_token")]
  pub token: Option<String>,
  #[serde(rename = "_method")]
  pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PartnerInput {
  #[validate(range(min = 0, message = "The user id must be at least 0."))]
  pub user_id: i64,
  #[validate(range(
    min = 0,
    max = 100,
    message = "The partner discount must be between 0 and 100."
  ))]
  pub partner_discount: i32,
  #[validate(range(
    min = 0,
    max = 100,
    message = "The registered user discount must be between 0 and 100."
  ))]
  pub registered_user_discount: i32,
  /// Outer `None`: field not submitted, keep what is stored.
  /// `Some(None)`: submitted blank, fall back to the referral settings.
  pub referral_system_commission: Option<Option<i32>>,
}

fn label(field: &str) -> String {
  field.replace('_', " ")
}

fn blank(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_int<T: std::str::FromStr>(
  errors: &mut FieldErrors,
  field: &str,
  value: Option<&str>,
) -> Option<T> {
  let Some(value) = blank(value) else {
    errors.add(field, format!("The {} field is required.", label(field)));
    return None;
  };

  let parsed = value.parse().ok();
  if parsed.is_none() {
    errors.add(field, format!("The {} must be an integer.", label(field)));
  }
  parsed
}

impl PartnerForm {
  pub fn parse(&self) -> Result<PartnerInput> {
    let mut errors = FieldErrors::default();

    let user_id = required_int(&mut errors, "user_id", self.user_id.as_deref());
    let partner_discount = required_int(
      &mut errors,
      "partner_discount",
      self.partner_discount.as_deref(),
    );
    let registered_user_discount = required_int(
      &mut errors,
      "registered_user_discount",
      self.registered_user_discount.as_deref(),
    );

    let field = "referral_system_commission";
    let referral_system_commission = match &self.referral_system_commission {
      None => None,
      Some(raw) => match blank(Some(raw.as_str())) {
        None => Some(None),
        Some(value) => match value.parse::<i32>() {
          Ok(rate) if rate > 100 => {
            errors.add(
              field,
              "The referral system commission must not be greater than 100.",
            );
            None
          }
          Ok(rate) => Some(Some(rate)),
          Err(_) => {
            errors.add(field, format!("The {} must be an integer.", label(field)));
            None
          }
        },
      },
    };

    let input = match (user_id, partner_discount, registered_user_discount) {
      (Some(user_id), Some(partner_discount), Some(registered_user_discount)) => {
        PartnerInput {
          user_id,
          partner_discount,
          registered_user_discount,
          referral_system_commission,
        }
      }
      _ => return Err(Error::Validation(errors)),
    };

    if let Err(invalid) = input.validate() {
      errors.merge(invalid.into());
    }
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }

    Ok(input)
  }
}

#[derive(Debug)]
pub enum Stored {
  Created(partner_discount::Model),
  /// The user already has a partner record; nothing was written.
  AlreadyExists,
}

pub struct Partner<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Partner<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<partner_discount::Model>> {
    let partners = partner_discount::Entity::find()
      .order_by_asc(partner_discount::Column::Id)
      .all(self.db)
      .await?;
    Ok(partners)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<partner_discount::Model>> {
    let partner = partner_discount::Entity::find_by_id(id).one(self.db).await?;
    Ok(partner)
  }

  pub async fn find(&self, id: i32) -> Result<partner_discount::Model> {
    self.by_id(id).await?.ok_or(Error::PartnerNotFound)
  }

  pub async fn exists_for_user(&self, user_id: i64) -> Result<bool> {
    let count = partner_discount::Entity::find()
      .filter(partner_discount::Column::UserId.eq(user_id))
      .count(self.db)
      .await?;
    Ok(count > 0)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(partner_discount::Entity::find().count(self.db).await?)
  }

  /// Creates a partner record unless the user already has one.
  ///
  /// The existence check and the insert are not atomic: two concurrent
  /// submissions for the same user can both pass the check.
  pub async fn store(&self, claims: &Claims, form: &PartnerForm) -> Result<Stored> {
    claims.require(WRITE_PERMISSION)?;
    let input = form.parse()?;

    if self.exists_for_user(input.user_id).await? {
      warn!(
        "Admin {} tried to add a second partner record for user {}",
        claims.admin_id, input.user_id
      );
      return Ok(Stored::AlreadyExists);
    }

    let now = Utc::now().naive_utc();
    let partner = partner_discount::ActiveModel {
      id: sea_orm::NotSet,
      user_id: Set(input.user_id),
      partner_discount: Set(input.partner_discount),
      registered_user_discount: Set(input.registered_user_discount),
      referral_system_commission: Set(input.referral_system_commission.flatten()),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!(
      "Admin {} created partner {} for user {}",
      claims.admin_id, partner.id, partner.user_id
    );
    Ok(Stored::Created(partner))
  }

  pub async fn update(
    &self,
    claims: &Claims,
    id: i32,
    form: &PartnerForm,
  ) -> Result<partner_discount::Model> {
    claims.require(WRITE_PERMISSION)?;
    let partner = self.find(id).await?;
    let input = form.parse()?;

    let mut active: partner_discount::ActiveModel = partner.into();
    active.user_id = Set(input.user_id);
    active.partner_discount = Set(input.partner_discount);
    active.registered_user_discount = Set(input.registered_user_discount);
    if let Some(commission) = input.referral_system_commission {
      active.referral_system_commission = Set(commission);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let partner = active.update(self.db).await?;

    info!("Admin {} updated partner {}", claims.admin_id, partner.id);
    Ok(partner)
  }

  pub async fn destroy(&self, claims: &Claims, id: i32) -> Result<()> {
    claims.require(WRITE_PERMISSION)?;
    let partner = self.find(id).await?;

    partner_discount::Entity::delete_by_id(partner.id).exec(self.db).await?;

    info!(
      "Admin {} removed partner {} (user {})",
      claims.admin_id, partner.id, partner.user_id
    );
    Ok(())
  }

  /// One page of partner records for the admin grid, joined with their users.
  pub async fn grid(
    &self,
    claims: &Claims,
    query: &GridQuery,
  ) -> Result<GridPage<PartnerWithUser>> {
    claims.require_any(&[WRITE_PERMISSION, READ_PERMISSION])?;

    let records_total = self.count().await?;

    let mut select =
      partner_discount::Entity::find().find_also_related(user::Entity);
    if let Some(term) = query.search_term() {
      select = select.filter(search_condition(term));
    }

    let records_filtered = select.clone().count(self.db).await?;

    let data = select
      .order_by(sort_column(query.order_by.as_deref()), query.order_dir.into())
      .order_by_asc(partner_discount::Column::Id)
      .offset(query.start)
      .limit(query.limit())
      .all(self.db)
      .await?;

    Ok(GridPage { draw: query.draw, records_total, records_filtered, data })
  }
}

/// Maps a grid column name to what it is ordered by. The `user` column is
/// ordered by the foreign key rather than by the rendered name.
fn sort_column(column: Option<&str>) -> partner_discount::Column {
  use partner_discount::Column;

  match column {
    Some("user") | Some("user_id") => Column::UserId,
    Some("partner_discount") => Column::PartnerDiscount,
    Some("registered_user_discount") => Column::RegisteredUserDiscount,
    Some("referral_system_commission") => Column::ReferralSystemCommission,
    Some("created_at") => Column::CreatedAt,
    _ => Column::Id,
  }
}

/// `%term%` with LIKE metacharacters in `term` matched literally.
fn like_pattern(term: &str) -> LikeExpr {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for ch in term.chars() {
    if matches!(ch, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(ch);
  }
  pattern.push('%');
  LikeExpr::new(pattern).escape('\\')
}

fn search_condition(term: &str) -> Condition {
  use partner_discount::Column;

  let mut condition = Condition::any()
    .add(Expr::col((user::Entity, user::Column::Name)).like(like_pattern(term)))
    .add(Expr::col((user::Entity, user::Column::Email)).like(like_pattern(term)));

  if let Ok(number) = term.parse::<i64>() {
    condition = condition
      .add(Column::Id.eq(number))
      .add(Column::UserId.eq(number))
      .add(Column::PartnerDiscount.eq(number))
      .add(Column::RegisteredUserDiscount.eq(number))
      .add(Column::ReferralSystemCommission.eq(number));
  }

  condition
}
