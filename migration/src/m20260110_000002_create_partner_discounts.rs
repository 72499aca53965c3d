use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(PartnerDiscounts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PartnerDiscounts::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::UserId).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::PartnerDiscount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::RegisteredUserDiscount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::ReferralSystemCommission)
              .integer()
              .null(),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::CreatedAt).date_time().not_null(),
          )
          .col(
            ColumnDef::new(PartnerDiscounts::UpdatedAt).date_time().not_null(),
          )
          .to_owned(),
      )
      .await?;

    // Lookup index only: one-record-per-user is checked by the service.
    manager
      .create_index(
        Index::create()
          .name("idx_partner_discounts_user")
          .table(PartnerDiscounts::Table)
          .col(PartnerDiscounts::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PartnerDiscounts::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum PartnerDiscounts {
  Table,
  Id,
  UserId,
  PartnerDiscount,
  RegisteredUserDiscount,
  ReferralSystemCommission,
  CreatedAt,
  UpdatedAt,
}
