//! Server side paging protocol for the admin data tables.
//!
//! Requests arrive as flat query strings
//! (`?draw=3&start=20&length=10&search=bob&order_by=user&order_dir=desc`) and
//! are answered with the `draw`/`recordsTotal`/`recordsFiltered`/`data` shape
//! the client-side grid expects.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
  #[default]
  Asc,
  Desc,
}

impl From<SortDir> for sea_orm::Order {
  fn from(dir: SortDir) -> Self {
    match dir {
      SortDir::Asc => sea_orm::Order::Asc,
      SortDir::Desc => sea_orm::Order::Desc,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridQuery {
  #[serde(default)]
  pub draw: u64,
  #[serde(default)]
  pub start: u64,
  /// Page size; `-1` asks for every row.
  pub length: Option<i64>,
  pub search: Option<String>,
  pub order_by: Option<String>,
  #[serde(default)]
  pub order_dir: SortDir,
}

impl GridQuery {
  /// Rows to fetch, `None` meaning no limit.
  pub fn limit(&self) -> Option<u64> {
    match self.length {
      None => Some(DEFAULT_PAGE_SIZE),
      Some(-1) => None,
      Some(len) if len <= 0 => Some(DEFAULT_PAGE_SIZE),
      Some(len) => Some((len as u64).min(MAX_PAGE_SIZE)),
    }
  }

  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPage<T> {
  pub draw: u64,
  pub records_total: u64,
  pub records_filtered: u64,
  pub data: Vec<T>,
}

impl<T> GridPage<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> GridPage<U> {
    GridPage {
      draw: self.draw,
      records_total: self.records_total,
      records_filtered: self.records_filtered,
      data: self.data.into_iter().map(f).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn query(length: Option<i64>) -> GridQuery {
    GridQuery { length, ..Default::default() }
  }

  #[test]
  fn test_limit() {
    assert_eq!(query(None).limit(), Some(DEFAULT_PAGE_SIZE));
    assert_eq!(query(Some(25)).limit(), Some(25));
    assert_eq!(query(Some(5000)).limit(), Some(MAX_PAGE_SIZE));
    assert_eq!(query(Some(-1)).limit(), None);
    assert_eq!(query(Some(0)).limit(), Some(DEFAULT_PAGE_SIZE));
  }

  #[test]
  fn test_search_term_blank() {
    let mut q = GridQuery { search: Some("   ".into()), ..Default::default() };
    assert_eq!(q.search_term(), None);
    q.search = Some(" bob ".into());
    assert_eq!(q.search_term(), Some("bob"));
  }

  #[test]
  fn test_page_serializes_camel_case() {
    let page =
      GridPage { draw: 2, records_total: 5, records_filtered: 1, data: vec![7] };
    let value = json::to_value(&page).unwrap();
    assert_eq!(
      value,
      json::json!({ "draw": 2, "recordsTotal": 5, "recordsFiltered": 1, "data": [7] })
    );
  }
}
