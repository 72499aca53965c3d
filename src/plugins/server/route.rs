//! Paths of the admin pages, shared by the router and the rendered links.

pub const PARTNERS: &str = "/admin/partners";
pub const PARTNERS_CREATE: &str = "/admin/partners/create";
pub const PARTNERS_DATATABLE: &str = "/admin/partners/datatable";

pub fn partner(id: i32) -> String {
  format!("{PARTNERS}/{id}")
}

pub fn partner_edit(id: i32) -> String {
  format!("{PARTNERS}/{id}/edit")
}

pub fn user_show(id: i64) -> String {
  format!("/admin/users/{id}")
}
