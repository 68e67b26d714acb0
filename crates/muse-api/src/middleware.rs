use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use muse_types::api::Claims;

use crate::auth::validate_token;
use crate::error::{ApiError, AuthError};
use crate::{AppState, run_db};

/// Extract and validate the bearer token, attaching its `Claims` to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AuthError::Missing)?;

    let claims =
        validate_token(&state.jwt_secret, bearer.token()).map_err(|_| AuthError::Invalid)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Must run after `require_auth`. Re-reads the user so a demoted or
/// missing account is refused even with a still-valid token.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let username = claims.sub.clone();
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(AuthError::NotFound)?;

    if !user.is_admin {
        return Err(ApiError::Forbidden("admin privileges required".into()));
    }

    Ok(next.run(req).await)
}
