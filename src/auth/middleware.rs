//! Authorization gate
//!
//! Router groups declare their role by the layers they carry:
//!
//! ```ignore
//! Router::new()
//!     .route("/admin/user/add", post(admin::add_user))
//!     .route_layer(middleware::from_fn(require_admin))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! `require_auth` runs first (outermost), resolves the token once and stores a
//! [`CurrentUser`] in the request extensions; `require_admin` only reads it.

use crate::{
    api::AppState,
    auth::{ClientIp, CurrentUser, JwtService},
    core::user,
    errors::Error,
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Requires a valid bearer token for an existing user.
///
/// Stamps the user's last action (route, time, caller IP) before the handler
/// runs. Stamping is best effort: a failed write is logged and the request
/// proceeds.
///
/// # Errors
/// [`Error::Unauthorized`] when the header is missing or malformed, the token
/// does not validate, or its subject no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_from_header)
        .ok_or_else(|| {
            debug!("Missing or malformed authorization header on {}", req.uri());
            Error::Unauthorized
        })?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        warn!("Rejected token on {}: {}", req.uri(), e);
        Error::Unauthorized
    })?;

    let Some(account) = user::find_user_by_uuid(&state.db, &claims.sub).await? else {
        warn!("Token subject {} no longer exists", claims.sub);
        return Err(Error::Unauthorized);
    };

    let ClientIp(ip) = ClientIp::from_extensions(req.extensions());
    if let Err(e) = user::record_action(&state.db, &account, req.uri().path(), ip).await {
        warn!("Failed to record activity for {}: {}", account.username, e);
    }

    req.extensions_mut().insert(CurrentUser::from(&account));
    Ok(next.run(req).await)
}

/// Requires the user resolved by [`require_auth`] to be an administrator.
///
/// # Errors
/// [`Error::Unauthorized`] when no user was resolved, [`Error::Forbidden`] for
/// non-admins.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Error> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(Error::Unauthorized)?;

    if !current.admin {
        warn!(
            "User {} denied access to {}",
            current.username,
            req.uri().path()
        );
        return Err(Error::Forbidden);
    }

    Ok(next.run(req).await)
}
