//! HTTP Basic-auth gate in front of every API route.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use thiserror::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Rejection for a missing or wrong `Authorization` header. It never says
/// which part was wrong.
#[derive(Debug, Error)]
#[error("unauthorized")]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
  fn into_response(self) -> Response {
    let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    res.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"crm\""),
    );
    res
  }
}

/// Hash `password` with a fresh salt into the PHC string stored as
/// `auth_password_hash`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Unauthorized> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Unauthorized)?;

  if username != config.username {
    return Err(Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash).map_err(|_| Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Unauthorized)
}

/// Middleware: reject the request with 401 unless it carries valid
/// credentials.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Unauthorized> {
  if let Err(e) = verify_auth(req.headers(), &auth) {
    tracing::warn!(method = %req.method(), path = req.uri().path(), "rejected unauthenticated request");
    return Err(e);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn auth_config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "admin".to_string(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  pub(crate) fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value.parse().unwrap());
    headers
  }

  #[test]
  fn correct_credentials() {
    let config = auth_config("secret");
    assert!(verify_auth(&headers(&basic("admin", "secret")), &config).is_ok());
  }

  #[test]
  fn wrong_password() {
    let config = auth_config("secret");
    assert!(verify_auth(&headers(&basic("admin", "wrong")), &config).is_err());
  }

  #[test]
  fn wrong_username() {
    let config = auth_config("secret");
    assert!(verify_auth(&headers(&basic("root", "secret")), &config).is_err());
  }

  #[test]
  fn missing_header() {
    let config = auth_config("secret");
    assert!(verify_auth(&HeaderMap::new(), &config).is_err());
  }

  #[test]
  fn invalid_base64() {
    let config = auth_config("secret");
    assert!(verify_auth(&headers("Basic !!!not-base64!!!"), &config).is_err());
  }

  #[test]
  fn each_hash_gets_its_own_salt() {
    let first = hash_password("secret").unwrap();
    let second = hash_password("secret").unwrap();
    assert_ne!(first, second);
    let config = AuthConfig { username: "admin".into(), password_hash: second };
    assert!(verify_auth(&headers(&basic("admin", "secret")), &config).is_ok());
  }

  #[test]
  fn rejection_asks_for_basic_auth() {
    let res = Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Basic realm=\"crm\"");
  }
}
