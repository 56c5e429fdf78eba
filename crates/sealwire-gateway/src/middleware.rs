//! The protection layer: classify, verify, open the request body, run the
//! handler, seal the response.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::Utc;
use futures::FutureExt;
use tower::ServiceBuilder;
use tracing::{debug, error, info, info_span, Instrument};

use crate::error::GatewayError;
use crate::protection::{Classification, Protection, Session};
use crate::request_id::RequestId;
use crate::sealer::strip_skip_flag;

/// Wrap `router` so every route goes through the protection layer.
pub fn protect<S>(router: Router<S>, protection: Arc<Protection>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(ServiceBuilder::new().layer(middleware::from_fn_with_state(protection, protect_request)))
}

/// Middleware entry point. Panics below this point become a 500 `MIDDLEWARE_ERROR`.
pub async fn protect_request(
    State(protection): State<Arc<Protection>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = RequestId::generate();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(handle(&protection, request_id.clone(), request, next))
            .catch_unwind()
            .await;

        let (mut response, user_id) = match outcome {
            Ok(done) => done,
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "request pipeline panicked");
                (GatewayError::internal("panic").into_response(), None)
            }
        };
        request_id.apply(&mut response);

        info!(
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            user_id = user_id.as_deref().unwrap_or("-"),
            "request completed"
        );
        response
    }
    .instrument(span)
    .await
}

async fn handle(
    protection: &Protection,
    request_id: RequestId,
    mut request: Request,
    next: Next,
) -> (Response, Option<String>) {
    request.extensions_mut().insert(request_id);

    if protection.classify(request.uri().path()) == Classification::Unprotected {
        info!("unprotected route accessed");
        return (next.run(request).await, None);
    }
    info!("protected route accessed");

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let session = match protection.authenticate(authorization) {
        Ok(session) => session,
        Err(err) => return (err.into_response(), None),
    };
    info!(
        user_id = %session.claims.user_id,
        role = %session.claims.role,
        verified = session.verified,
        "caller authenticated"
    );
    let user_id = Some(session.claims.user_id.clone());

    match run_protected(protection, session, request, next).await {
        Ok(response) => (response, user_id),
        Err(err) => (err.into_response(), user_id),
    }
}

async fn run_protected(
    protection: &Protection,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !protection.settings().encryption_enabled {
        debug!("encryption disabled; passing bodies through");
    }

    let mut request = open_request(protection, &session, request).await?;
    request.extensions_mut().insert(session.clone());

    let response = next.run(request).await;

    if !protection.encrypts(&session) {
        return strip_skip_flag(response).await;
    }
    protection
        .sealer(&session)
        .seal_response(response, Utc::now().timestamp_millis())
        .await
}

async fn open_request(
    protection: &Protection,
    session: &Session,
    request: Request,
) -> Result<Request, GatewayError> {
    if !protection.decrypts(request.method(), session) {
        return Ok(request);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, protection.settings().body_limit)
        .await
        .map_err(|e| GatewayError::MalformedPayload {
            detail: format!("reading request body: {}", e),
        })?;

    let body = match protection.open_body(session, &bytes, Utc::now().timestamp_millis())? {
        Some(plaintext) => {
            info!(plain_len = plaintext.len(), "request body decrypted");
            parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(plaintext.len()));
            Body::from(plaintext)
        }
        None => Body::from(bytes),
    };
    Ok(Request::from_parts(parts, body))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
