use axum::{
  Form, Json,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderName},
  response::Response,
};

use super::{
  datatable::{PartnerRow, RowContext},
  response::Redirect,
  route,
  views::{FormView, IndexView},
};
use crate::{
  auth::{Claims, Flash, READ_PERMISSION, WRITE_PERMISSION},
  grid::{GridPage, GridQuery},
  prelude::*,
  state::AppState,
  sv::partner::{PartnerForm, Stored},
};

const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// CSRF token from the `_token` form field, else the `x-csrf-token` header.
fn csrf_token<'a>(headers: &'a HeaderMap, form: Option<&'a str>) -> Option<&'a str> {
  form.or_else(|| headers.get(CSRF_HEADER)?.to_str().ok())
}

pub async fn health() -> &'static str {
  "OK"
}

pub async fn index(
  State(app): State<Arc<AppState>>,
  claims: Claims,
) -> Result<Json<IndexView>> {
  claims.require_any(&[WRITE_PERMISSION, READ_PERMISSION])?;

  Ok(Json(IndexView {
    locale_datatables: app.settings().datatables_locale.clone(),
    datatable_url: route::PARTNERS_DATATABLE,
    create_url: route::PARTNERS_CREATE,
    csrf_token: claims.csrf_token.clone(),
    flash: app.take_flash(&claims),
  }))
}

pub async fn create(
  State(app): State<Arc<AppState>>,
  claims: Claims,
) -> Result<Json<FormView>> {
  claims.require(WRITE_PERMISSION)?;
  let sv = app.sv();

  Ok(Json(FormView {
    action: route::PARTNERS.into(),
    method: "POST",
    csrf_token: claims.csrf_token.clone(),
    partners: sv.partner.all().await?,
    partner: None,
    users: sv.user.all_by_name().await?,
  }))
}

pub async fn store(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  headers: HeaderMap,
  Form(form): Form<PartnerForm>,
) -> Result<Response> {
  claims.require(WRITE_PERMISSION)?;
  claims.verify_csrf(csrf_token(&headers, form.token.as_deref()))?;

  let redirect = match app.sv().partner.store(&claims, &form).await? {
    Stored::Created(_) => Redirect::to(route::PARTNERS)
      .with(Flash::success("partner has been created!")),
    Stored::AlreadyExists => {
      Redirect::to(route::PARTNERS).with(Flash::error("Partner already exists"))
    }
  };

  Ok(redirect.render(&app, &claims))
}

pub async fn edit(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  Path(id): Path<i32>,
) -> Result<Json<FormView>> {
  claims.require(WRITE_PERMISSION)?;
  let sv = app.sv();
  let partner = sv.partner.find(id).await?;

  Ok(Json(FormView {
    action: route::partner(partner.id),
    method: "PUT",
    csrf_token: claims.csrf_token.clone(),
    partners: sv.partner.all().await?,
    partner: Some(partner),
    users: sv.user.all_by_name().await?,
  }))
}

pub async fn update(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  Path(id): Path<i32>,
  headers: HeaderMap,
  Form(form): Form<PartnerForm>,
) -> Result<Response> {
  apply_update(&app, &claims, id, &headers, &form).await
}

pub async fn destroy(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  Path(id): Path<i32>,
  headers: HeaderMap,
) -> Result<Response> {
  apply_destroy(&app, &claims, id, &headers, None).await
}

/// HTML forms can only POST; `_method` picks the action they stand for.
pub async fn method_override(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  Path(id): Path<i32>,
  headers: HeaderMap,
  Form(form): Form<PartnerForm>,
) -> Result<Response> {
  claims.require(WRITE_PERMISSION)?;

  let method = form.method.as_deref().unwrap_or_default().to_ascii_uppercase();
  match method.as_str() {
    "PUT" | "PATCH" => apply_update(&app, &claims, id, &headers, &form).await,
    "DELETE" => {
      apply_destroy(&app, &claims, id, &headers, form.token.as_deref()).await
    }
    _ => Err(Error::InvalidArgs(format!("Unsupported method `{method}`"))),
  }
}

async fn apply_update(
  app: &AppState,
  claims: &Claims,
  id: i32,
  headers: &HeaderMap,
  form: &PartnerForm,
) -> Result<Response> {
  claims.require(WRITE_PERMISSION)?;
  claims.verify_csrf(csrf_token(headers, form.token.as_deref()))?;

  app.sv().partner.update(claims, id, form).await?;

  Ok(
    Redirect::to(route::PARTNERS)
      .with(Flash::success("partner has been updated!"))
      .render(app, claims),
  )
}

async fn apply_destroy(
  app: &AppState,
  claims: &Claims,
  id: i32,
  headers: &HeaderMap,
  token: Option<&str>,
) -> Result<Response> {
  claims.require(WRITE_PERMISSION)?;
  claims.verify_csrf(csrf_token(headers, token))?;

  app.sv().partner.destroy(claims, id).await?;

  Ok(
    Redirect::back(headers)
      .with(Flash::success("partner has been removed!"))
      .render(app, claims),
  )
}

pub async fn datatable(
  State(app): State<Arc<AppState>>,
  claims: Claims,
  Query(query): Query<GridQuery>,
) -> Result<Json<GridPage<PartnerRow>>> {
  let page = app.sv().partner.grid(&claims, &query).await?;

  let ctx = RowContext {
    settings: app.settings(),
    csrf_token: &claims.csrf_token,
    now: Utc::now().naive_utc(),
  };
  Ok(Json(page.map(|(partner, user)| ctx.row(partner, user))))
}
