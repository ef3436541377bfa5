//! Admin API identity middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_auth::AuthBearer;

use crate::state::AppState;

/// Resolves the caller through the configured identity provider and stores
/// the resulting [`User`](crate::domain::entities::User) as a request
/// extension for the handlers.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// A missing or malformed header is passed to the provider as `None`; the
/// token provider rejects it, the development provider ignores it.
///
/// # Errors
///
/// Responds `401 Unauthorized` with `WWW-Authenticate: Bearer` (RFC 6750)
/// when the provider cannot identify the caller.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/api/smartlinks", get(list_smartlinks))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let token = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthBearer(token)| token);

    let user = match st.identity.identify(token.as_deref()).await {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(provider = st.identity.name(), "Request rejected by identity provider");
            let mut response = err.into_response();
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            return response;
        }
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user);

    next.run(req).await
}
