mod datatable;
mod handlers;
pub mod response;
pub mod route;
mod views;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

/// Admin routes without the per-peer rate limiter, which needs the
/// connection info only a real listener provides.
pub fn router(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route(route::PARTNERS, get(handlers::index).post(handlers::store))
    .route(route::PARTNERS_CREATE, get(handlers::create))
    .route(route::PARTNERS_DATATABLE, get(handlers::datatable))
    .route(
      "/admin/partners/{partner}",
      put(handlers::update)
        .patch(handlers::update)
        .delete(handlers::destroy)
        .post(handlers::method_override),
    )
    .route("/admin/partners/{partner}/edit", get(handlers::edit))
    .layer(TraceLayer::new_for_http())
    .with_state(app)
}

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "server"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(app.config.rate_per_second)
        .burst_size(app.config.rate_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let port = app.config.port;
    let service = router(app)
      .layer(
        ServiceBuilder::new().layer(GovernorLayer::new(governor_conf)).layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP Server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, service).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    auth::{READ_PERMISSION, WRITE_PERMISSION},
    config::{AdminEntry, Config, Settings},
    sv::{self, test_utils::test_db},
  };

  const WRITER: &str = "writer-token";
  const READER: &str = "reader-token";

  async fn app() -> Arc<AppState> {
    let db = test_db::setup().await;
    let admin = |admin_id, token: &str, permissions: &[&str]| AdminEntry {
      admin_id,
      token: token.into(),
      permissions: permissions.iter().map(|p| p.to_string()).collect(),
    };

    let config = Config {
      database_url: "sqlite::memory:".into(),
      port: 0,
      admins: vec![
        admin(1, WRITER, &[READ_PERMISSION, WRITE_PERMISSION]),
        admin(2, READER, &[READ_PERMISSION]),
      ],
      settings: Settings { referral_percentage: 15, ..Default::default() },
      rate_per_second: 2,
      rate_burst: 100,
    };

    Arc::new(AppState::with_db(db, config))
  }

  fn csrf(app: &AppState, token: &str) -> String {
    app.sessions.get(token).unwrap().csrf_token.clone()
  }

  fn get_req(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap()
  }

  fn form_req(method: &str, uri: &str, token: &str, body: String) -> Request<Body> {
    Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(body))
      .unwrap()
  }

  async fn send(app: &Arc<AppState>, req: Request<Body>) -> Response {
    router(app.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(res: Response) -> json::Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    json::from_slice(&bytes).unwrap()
  }

  fn header_str<'a>(res: &'a Response, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
  }

  fn store_body(app: &AppState, fields: &str) -> String {
    format!("{fields}&_token={}", csrf(app, WRITER))
  }

  #[tokio::test]
  async fn test_store_then_duplicate() {
    let app = app().await;
    let payload = "user_id=5&partner_discount=10&registered_user_discount=20";

    let res = send(
      &app,
      form_req("POST", route::PARTNERS, WRITER, store_body(&app, payload)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&res, "location"), Some(route::PARTNERS));
    assert_eq!(
      header_str(&res, "x-flash-success"),
      Some("partner has been created!")
    );
    assert_eq!(app.sv().partner.count().await.unwrap(), 1);

    let res = send(
      &app,
      form_req("POST", route::PARTNERS, WRITER, store_body(&app, payload)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&res, "x-flash-error"), Some("Partner already exists"));
    assert_eq!(app.sv().partner.count().await.unwrap(), 1);

    let view = body_json(send(&app, get_req(route::PARTNERS, WRITER)).await).await;
    assert_eq!(view["flash"]["level"], "error");
    assert_eq!(view["flash"]["message"], "Partner already exists");

    // shown once
    let view = body_json(send(&app, get_req(route::PARTNERS, WRITER)).await).await;
    assert!(view["flash"].is_null());
  }

  #[tokio::test]
  async fn test_store_validation_error() {
    let app = app().await;
    let body = store_body(
      &app,
      "user_id=5&partner_discount=101&registered_user_discount=20",
    );

    let res = send(&app, form_req("POST", route::PARTNERS, WRITER, body)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(res).await;
    assert!(body["errors"]["partner_discount"].is_array());
    assert_eq!(app.sv().partner.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_auth_failures() {
    let app = app().await;

    let res = send(
      &app,
      Request::get(route::PARTNERS).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, get_req(route::PARTNERS, "nope")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, get_req(route::PARTNERS, READER)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app, get_req(route::PARTNERS_CREATE, READER)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = format!(
      "user_id=5&partner_discount=1&registered_user_discount=1&_token={}",
      csrf(&app, READER)
    );
    let res = send(&app, form_req("POST", route::PARTNERS, READER, body)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body =
      "user_id=5&partner_discount=1&registered_user_discount=1&_token=bad".into();
    let res = send(&app, form_req("POST", route::PARTNERS, WRITER, body)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(app.sv().partner.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_method_override_checks_permission_first() {
    let app = app().await;
    let uri = route::partner(1);

    let body = format!("_method=FOO&_token={}", csrf(&app, READER));
    let res = send(&app, form_req("POST", &uri, READER, body)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(&app, form_req("POST", &uri, READER, "_method=FOO".into())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = format!("_method=FOO&_token={}", csrf(&app, WRITER));
    let res = send(&app, form_req("POST", &uri, WRITER, body)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_edit_update_and_destroy() {
    let app = app().await;
    for user in ["1", "2"] {
      let payload = format!(
        "user_id={user}&partner_discount=10&registered_user_discount=20"
      );
      send(
        &app,
        form_req("POST", route::PARTNERS, WRITER, store_body(&app, &payload)),
      )
      .await;
    }
    let partners = app.sv().partner.all().await.unwrap();
    let (first, second) = (&partners[0], &partners[1]);

    let res = send(&app, get_req(&route::partner_edit(999), WRITER)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let view =
      body_json(send(&app, get_req(&route::partner_edit(first.id), WRITER)).await)
        .await;
    assert_eq!(view["partner"]["id"], first.id);
    assert_eq!(view["method"], "PUT");

    let body = store_body(
      &app,
      "user_id=1&partner_discount=33&registered_user_discount=44",
    );
    let res =
      send(&app, form_req("PUT", &route::partner(first.id), WRITER, body)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      header_str(&res, "x-flash-success"),
      Some("partner has been updated!")
    );
    let updated = app.sv().partner.find(first.id).await.unwrap();
    assert_eq!(updated.partner_discount, 33);
    assert_eq!(&app.sv().partner.find(second.id).await.unwrap(), second);

    let mut req = form_req(
      "POST",
      &route::partner(second.id),
      WRITER,
      store_body(&app, "_method=DELETE"),
    );
    req
      .headers_mut()
      .insert(header::REFERER, "/admin/partners?page=2".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&res, "location"), Some("/admin/partners?page=2"));
    assert_eq!(
      header_str(&res, "x-flash-success"),
      Some("partner has been removed!")
    );

    let ids: Vec<_> =
      app.sv().partner.all().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, [first.id]);
  }

  #[tokio::test]
  async fn test_destroy_with_header_token() {
    let app = app().await;
    send(
      &app,
      form_req(
        "POST",
        route::PARTNERS,
        WRITER,
        store_body(&app, "user_id=9&partner_discount=1&registered_user_discount=1"),
      ),
    )
    .await;
    let partner = &app.sv().partner.all().await.unwrap()[0];

    let req = Request::delete(route::partner(partner.id))
      .header(header::AUTHORIZATION, format!("Bearer {WRITER}"))
      .header("x-csrf-token", csrf(&app, WRITER))
      .body(Body::empty())
      .unwrap();
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&res, "location"), Some(route::PARTNERS));
    assert_eq!(app.sv().partner.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_datatable_default_commission() {
    let app = app().await;
    sv::User::new(&app.db).create(5, "Bob", "bob@example.com").await.unwrap();
    send(
      &app,
      form_req(
        "POST",
        route::PARTNERS,
        WRITER,
        store_body(&app, "user_id=5&partner_discount=10&registered_user_discount=0"),
      ),
    )
    .await;

    let uri = format!("{}?draw=3&order_by=user&order_dir=desc", route::PARTNERS_DATATABLE);
    let res = send(&app, get_req(&uri, READER)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let page = body_json(res).await;
    assert_eq!(page["draw"], 3);
    assert_eq!(page["recordsTotal"], 1);
    let row = &page["data"][0];
    assert_eq!(row["referral_system_commission"], "Default (15%)");
    assert_eq!(row["partner_discount"], "10%");
    assert_eq!(row["registered_user_discount"], "0%");
    assert_eq!(row["user"], r#"<a href="/admin/users/5">Bob</a>"#);
  }

  #[tokio::test]
  async fn test_health() {
    let app = app().await;
    let res = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
  }
}
