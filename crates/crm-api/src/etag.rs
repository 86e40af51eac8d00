//! Version tokens over HTTP.
//!
//! A record's `version` is sent as a strong `ETag` (`"3"`). A `PUT` carrying
//! `If-Match` is applied only if the stored version still matches.

use axum::http::{HeaderMap, header};
use crm_core::Version;

use crate::error::ApiError;

pub fn etag(version: Version) -> String { format!("\"{version}\"") }

/// The version a conditional request expects, if it names one.
///
/// Both quoted and bare tokens are accepted, as is a weak `W/` prefix.
/// `If-Match: *` matches any existing record and yields `None`.
pub fn expected_version(headers: &HeaderMap) -> Result<Option<Version>, ApiError> {
  let Some(raw) = headers.get(header::IF_MATCH) else {
    return Ok(None);
  };
  let raw = raw
    .to_str()
    .map_err(|_| ApiError::BadRequest("If-Match is not valid ASCII".into()))?
    .trim();
  if raw == "*" {
    return Ok(None);
  }
  let token = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');
  token
    .parse()
    .map(Some)
    .map_err(|_| ApiError::BadRequest(format!("If-Match {raw:?} is not a version tag")))
}
