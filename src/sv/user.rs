use crate::{entity::user, prelude::*};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Users are owned by the main application; this exists for seeding.
  #[allow(dead_code)]
  pub async fn create(
    &self,
    id: i64,
    name: &str,
    email: &str,
  ) -> Result<user::Model> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::InvalidArgs("User name must not be empty".into()));
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: Set(id),
      name: Set(name.to_string()),
      email: Set(email.trim().to_string()),
      created_at: Set(now),
    };

    Ok(user.insert(self.db).await?)
  }

  /// Users for the partner selection list.
  pub async fn all_by_name(&self) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .order_by_asc(user::Column::Name)
      .order_by_asc(user::Column::Id)
      .all(self.db)
      .await?;
    Ok(users)
  }

  #[allow(dead_code)]
  pub async fn count(&self) -> Result<u64> {
    Ok(user::Entity::find().count(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_all_by_name_sorted() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    sv.create(3, "carol", "carol@example.com").await.unwrap();
    sv.create(1, "alice", "alice@example.com").await.unwrap();
    sv.create(2, "bob", "bob@example.com").await.unwrap();

    let names: Vec<_> =
      sv.all_by_name().await.unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(names, ["alice", "bob", "carol"]);
  }

  #[tokio::test]
  async fn test_create_rejects_blank_name() {
    let db = test_db::setup().await;
    let result = User::new(&db).create(1, "  ", "x@example.com").await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
    assert_eq!(User::new(&db).count().await.unwrap(), 0);
  }
}
