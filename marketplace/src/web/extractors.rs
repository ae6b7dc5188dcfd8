// marketplace/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller identity attached by the upstream auth provider.
///
/// `X-User-ID` must be a positive integer; `X-User-Role: admin` grants admin
/// rights. Anything else is rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub user_id: i64,
  pub is_admin: bool,
}

impl AuthenticatedUser {
  /// Whether this caller may act on a resource owned by `owner_id`.
  pub fn can_access(&self, owner_id: i64) -> bool {
    self.is_admin || self.user_id == owner_id
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse::<i64>().ok())
      .filter(|id| *id > 0);

    let Some(user_id) = user_id else {
      warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
      return ready(Err(AppError::Auth("Authentication required.".to_string())));
    };

    let is_admin = req
      .headers()
      .get(USER_ROLE_HEADER)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));

    ready(Ok(AuthenticatedUser { user_id, is_admin }))
  }
}
