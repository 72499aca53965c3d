use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::partner_discount;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  pub name: String,
  pub email: String,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "partner_discount::Entity")]
  PartnerDiscounts,
}

impl Related<partner_discount::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::PartnerDiscounts.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
