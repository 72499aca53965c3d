use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partner_discounts")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i64,
  pub partner_discount: i32,
  pub registered_user_discount: i32,
  /// `None` or a negative value falls back to the referral settings.
  pub referral_system_commission: Option<i32>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  pub fn commission_override(&self) -> Option<i32> {
    self.referral_system_commission.filter(|rate| *rate >= 0)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
