//! HTTP server wiring for the CRM store.
//!
//! Mounts [`crm_api::api_router`] behind a Basic-auth gate and request
//! tracing. [`ServerConfig::load`] and [`app`] do everything the binary needs
//! short of binding a socket.

pub mod auth;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware};
use crm_core::store::CrmStore;
use crm_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CRM_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  /// Read `path` if it exists, then let `CRM_*` variables override it.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CRM"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// [`ServerConfig::store_path`] with `~/` resolved against `$HOME`.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState<S: CrmStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full axum [`Router`]: the JSON API, every route authenticated,
/// every request traced.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CrmStore + 'static,
{
  crm_api::api_router(state.store)
    .layer(middleware::from_fn_with_state(state.auth, require_auth))
    .layer(TraceLayer::new_for_http())
}

/// Open the configured SQLite store and build the authenticated router
/// over it.
pub async fn app(config: &ServerConfig) -> Result<Router, crm_store_sqlite::Error> {
  let path = config.store_path();
  let store = SqliteStore::open(&path).await?;
  tracing::info!(path = %path.display(), "opened store");

  Ok(router(AppState {
    store: Arc::new(store),
    auth:  Arc::new(config.auth()),
  }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use crm_store_sqlite::SqliteStore;
  use serde_json::json;
  use tower::ServiceExt as _;

  use super::*;
  use crate::auth::{
    hash_password,
    tests::{auth_config, basic},
  };

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store: Arc::new(store),
      auth:  Arc::new(auth_config(password)),
    }
  }

  fn create_contact(authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
      .method("POST")
      .uri("/contacts")
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let body = json!({ "first_name": "Jo", "last_name": "Lee" });
    builder.body(Body::from(body.to_string())).unwrap()
  }

  #[tokio::test]
  async fn unauthenticated_request_is_rejected() {
    let state = make_state("secret").await;
    let store = state.store.clone();

    let resp = router(state).oneshot(create_contact(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(store.list::<crm_core::Contact>().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let state = make_state("secret").await;
    let resp = router(state)
      .oneshot(create_contact(Some(basic("admin", "guess"))))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_request_reaches_the_api() {
    let state = make_state("secret").await;
    let app = router(state);

    let resp = app
      .clone()
      .oneshot(create_contact(Some(basic("admin", "secret"))))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
      .uri("/contacts/1")
      .header(header::AUTHORIZATION, basic("admin", "secret"))
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ETAG], "\"1\"");
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/crm/data.db")),
      PathBuf::from(home).join("crm/data.db")
    );
    assert_eq!(expand_tilde(Path::new("/var/crm.db")), PathBuf::from("/var/crm.db"));
  }

  #[tokio::test]
  async fn configured_app_serves_from_the_store_file() {
    let dir = std::env::temp_dir().join(format!("crm-server-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let db = dir.join("crm.db");
    let config_path = dir.join("config.toml");
    std::fs::write(
      &config_path,
      format!(
        "host = \"127.0.0.1\"\nport = 8080\nstore_path = {:?}\nauth_username = \"admin\"\nauth_password_hash = {:?}\n",
        db.display().to_string(),
        hash_password("secret").unwrap(),
      ),
    )
    .unwrap();

    let config = ServerConfig::load(&config_path).unwrap();
    assert_eq!(config.address(), "127.0.0.1:8080");
    assert_eq!(config.store_path(), db);

    let resp = app(&config)
      .await
      .unwrap()
      .oneshot(create_contact(Some(basic("admin", "secret"))))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(db.exists());

    std::fs::remove_dir_all(&dir).ok();
  }
}
