//! Opting a response out of body encryption.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Response extension that tells the sealer to leave the body alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipEncryption;

/// Mark a response so it goes out as plain JSON on a protected route.
pub fn skip_response_encryption(response: &mut Response) {
    response.extensions_mut().insert(SkipEncryption);
}

pub fn is_skipped(response: &Response) -> bool {
    response.extensions().get::<SkipEncryption>().is_some()
}

/// JSON response that is never sealed.
///
/// ```ignore
/// async fn public_key() -> Unsealed<serde_json::Value> {
///     Unsealed(serde_json::json!({ "kid": "k1" }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Unsealed<T>(pub T);

impl<T: Serialize> IntoResponse for Unsealed<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        skip_response_encryption(&mut response);
        response
    }
}
