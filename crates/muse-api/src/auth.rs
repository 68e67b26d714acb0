use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use muse_db::models::AdminInitOutcome;
use muse_types::api::{AdminInitRequest, AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::{ApiError, AuthError};
use crate::{AppState, run_db};

const MAX_USERNAME_LEN: usize = 32;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = validate_credentials(&req.username, &req.password)?;

    let password = req.password;
    let name = username.clone();
    let user = run_db(&state, move |db| {
        let hash = hash_password(&password)?;
        db.create_user(&name, &hash)
    })
    .await?
    .ok_or_else(|| ApiError::Conflict(format!("username '{}' is already taken", username)))?;

    info!("Registered user {}", user.username);

    let token = issue_token(&state.jwt_secret, &user.username, state.token_ttl)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "registered".into(),
            token,
            username: user.username,
            is_admin: user.is_admin,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = validate_credentials(&req.username, &req.password)?;

    let password = req.password;
    let user = run_db(&state, move |db| {
        let user = db.get_user_by_username(&username)?;
        // Verify inside the blocking task; argon2 is deliberately slow
        Ok(user.filter(|u| verify_password(&password, &u.password)))
    })
    .await?
    .ok_or(ApiError::InvalidCredentials)?;

    let token = issue_token(&state.jwt_secret, &user.username, state.token_ttl)?;
    Ok(Json(AuthResponse {
        message: "logged in".into(),
        token,
        username: user.username,
        is_admin: user.is_admin,
    }))
}

/// One-time bootstrap of the first admin, gated by `ADMIN_INIT_SECRET`.
pub async fn admin_init(
    State(state): State<AppState>,
    payload: Result<Json<AdminInitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(expected) = state.admin_init_secret.as_deref() else {
        warn!("Rejected admin init: ADMIN_INIT_SECRET is not configured");
        return Err(ApiError::Forbidden("admin initialization is disabled".into()));
    };
    if req.secret_key != expected {
        warn!("Rejected admin init for {}: wrong secret key", req.username);
        return Err(ApiError::Forbidden("invalid secret key".into()));
    }

    let username = validate_credentials(&req.username, &req.password)?;
    let password = req.password;
    let outcome = run_db(&state, move |db| {
        // Cheap pre-check so repeated calls do not pay for hashing
        if db.admin_exists()? {
            return Ok(AdminInitOutcome::AdminExists);
        }
        let hash = hash_password(&password)?;
        db.init_admin(&username, &hash, |stored| verify_password(&password, stored))
    })
    .await?;

    let (user, message) = match outcome {
        AdminInitOutcome::Created(user) => (user, "admin created"),
        AdminInitOutcome::Promoted(user) => (user, "existing user promoted to admin"),
        AdminInitOutcome::AdminExists => {
            warn!("Rejected admin init: an admin already exists");
            return Err(ApiError::Forbidden("an admin already exists".into()));
        }
        AdminInitOutcome::WrongPassword => return Err(ApiError::InvalidCredentials),
    };

    info!("Admin initialized: {}", user.username);

    let token = issue_token(&state.jwt_secret, &user.username, state.token_ttl)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: message.into(),
            token,
            username: user.username,
            is_admin: true,
        }),
    ))
}

/// Returns the trimmed username.
fn validate_credentials(username: &str, password: &str) -> Result<String, ApiError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("username and password are required".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Sign an HS256 token carrying the username and an expiry.
pub fn issue_token(secret: &str, username: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let expires = now
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {} is out of range", ttl))?;
    let claims = Claims {
        sub: username.to_string(),
        iat: now.timestamp() as usize,
        exp: expires.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Decode and verify a token, returning the claims. Bad signatures, expired
/// tokens and garbage all come back as `Malformed`.
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::Malformed)
}
