//! Request extractors
//!
//! Body, path and query extractors that report malformed input through
//! [`ApiError`] so every failure uses the same JSON envelope, and the
//! [`CurrentUser`] extractor for creator attribution.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use rentbook_core::model::Principal;

/// Header carrying the authenticated caller's identity
pub const USER_HEADER: &str = "x-user-email";

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Caller identity, taken from `X-User-Email`
///
/// Identity is established upstream; requests without the header are
/// attributed to the system principal.
pub struct CurrentUser(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Self(Principal::system()));
        };
        let identity = value
            .to_str()
            .map(str::trim)
            .map_err(|_| ApiError::BadRequest(format!("{} header is not valid text", USER_HEADER)))?;
        if identity.is_empty() {
            return Ok(Self(Principal::system()));
        }
        Ok(Self(Principal::new(identity)))
    }
}
