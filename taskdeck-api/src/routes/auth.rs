/// Authentication endpoints
///
/// Each successful signup or login opens a session and returns a bearer token
/// bound to it; logout revokes the session behind the presented token.
///
/// # Endpoints
///
/// - `POST /signup` - Create an account and get a token
/// - `POST /login` - Get a token for an existing account
/// - `POST /logout` - Revoke the current token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    routes::{required_text, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        session::Session,
        user::{CreateUser, User},
    },
};
use tracing::{info, warn};
use validator::Validate;

const BAD_CREDENTIALS: &str = "Provided email address or password is incorrect.";

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    /// Email address, unique case-insensitively
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    /// Plaintext password (strength checked separately)
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Signup and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The authenticated user
    pub user: User,

    /// Bearer token for subsequent requests
    pub token: String,
}

/// Opens a session for `user` and signs a token for it
async fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let session = Session::create(&state.db, user.id).await?;
    let claims = jwt::Claims::new(user.id, session.id, state.token_ttl());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /signup
/// Content-Type: application/json
///
/// { "name": "Ada", "email": "ada@example.com", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed or email already taken
/// - `409 Conflict`: email taken by a concurrent signup
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let name = required_text("name", &req.name)?;
    let email = req.email.trim().to_string();

    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::validation("password", message))?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::validation("email", "The email has already been taken."));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name,
            email,
            password_hash,
        },
    )
    .await?;

    let token = issue_token(&state, &user).await?;

    info!(user_id = user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Login endpoint
///
/// # Errors
///
/// - `422 Unprocessable Entity`: malformed email
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = match User::find_by_email(&state.db, req.email.trim()).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = issue_token(&state, &user).await?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse { user, token }))
}

/// Logout endpoint
///
/// Revokes the session of the presented token; other sessions stay valid.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    Session::revoke(&state.db, auth.session_id).await?;

    info!(user_id = auth.user_id, session_id = %auth.session_id, "User logged out");

    Ok(Json(MessageResponse::new("Logged out successfully")))
}
