#[cfg(test)]
pub mod test_db {
  use crate::prelude::*;

  /// In-memory SQLite brought up by the same migrations production runs,
  /// so tests see the real `partner_discounts` schema (no foreign key on
  /// `user_id`).
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
  }
}
