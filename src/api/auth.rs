//! Registration, login and password reset.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, with_state};
use crate::auth::{create_access_token, hash_password, random_token, verify_password};
use crate::common::constants::{REFRESH_TOKEN_BYTES, RESET_TOKEN_BYTES, RESET_TOKEN_EXPIRE_MINUTES};
use crate::engine::types::ValidationError;
use crate::engine::Validate;
use crate::error::{ApiError, EMAIL_TAKEN_MESSAGE};
use crate::state::AppState;
use crate::store::{ResetToken, SubscriptionTier, User, UserSettings};

const RESET_REQUESTED_MESSAGE: &str = "If your email is registered, you will receive a password reset link.";

pub(crate) fn validate_email(field: &str, email: &str) -> Result<(), ValidationError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(field, "Value is not a valid email address"))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "Field must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)?;
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("token", &self.token)?;
        require_non_empty("new_password", &self.new_password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn issue_tokens(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let lifetime = Duration::minutes(state.config.auth.access_token_expire_minutes);
    let access_token = create_access_token(&state.config.auth.jwt_secret, &user.id, &user.email, lifetime)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(TokenResponse {
        access_token,
        refresh_token: random_token(REFRESH_TOKEN_BYTES),
        token_type: "bearer".to_string(),
    })
}

async fn register(body: RegisterRequest, state: AppState) -> Result<Response, Rejection> {
    if state.store.get_user_by_email(&body.email).await.map_err(ApiError::from)?.is_some() {
        return Err(ApiError::BadRequest(EMAIL_TAKEN_MESSAGE.to_string()).into());
    }

    let user = User {
        id: format!("user_{}", uuid::Uuid::new_v4()),
        email: body.email,
        username: body.username,
        hashed_password: hash_password(&body.password).map_err(ApiError::from)?,
        tier: SubscriptionTier::Free,
        created_at: Utc::now(),
        avatar_url: None,
        bio: None,
        settings: UserSettings::default(),
    };
    state.store.put_user(user.clone()).await.map_err(ApiError::user_write)?;

    info!("👤 Registered user {} ({})", user.id, user.username);
    Ok(json_reply(&issue_tokens(&state, &user)?))
}

async fn login(body: LoginRequest, state: AppState) -> Result<Response, Rejection> {
    let user = state.store.get_user_by_email(&body.email).await.map_err(ApiError::from)?;
    match user {
        Some(user) if verify_password(&body.password, &user.hashed_password) => {
            info!("🔑 User {} logged in", user.id);
            Ok(json_reply(&issue_tokens(&state, &user)?))
        }
        _ => Err(ApiError::Unauthenticated("Incorrect email or password".to_string()).into()),
    }
}

async fn forgot_password(body: ForgotPasswordRequest, state: AppState) -> Result<Response, Rejection> {
    if let Some(user) = state.store.get_user_by_email(&body.email).await.map_err(ApiError::from)? {
        let token = ResetToken {
            token: random_token(RESET_TOKEN_BYTES),
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_EXPIRE_MINUTES),
        };
        let shown: String = token.token.chars().take(10).collect();
        state.store.put_reset_token(token).await.map_err(ApiError::from)?;
        info!("📧 Password reset token {}... issued for user {}", shown, user.id);
    }
    Ok(json_reply(&MessageResponse {
        message: RESET_REQUESTED_MESSAGE,
    }))
}

async fn reset_password(body: ResetPasswordRequest, state: AppState) -> Result<Response, Rejection> {
    let invalid = || ApiError::BadRequest("Invalid reset token".to_string());

    let token = state
        .store
        .take_reset_token(&body.token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(invalid)?;
    if token.is_expired(Utc::now()) {
        return Err(invalid().into());
    }

    let mut user = state
        .store
        .get_user(&token.user_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(invalid)?;
    user.hashed_password = hash_password(&body.new_password).map_err(ApiError::from)?;
    state.store.put_user(user.clone()).await.map_err(ApiError::from)?;

    info!("🔐 Password reset for user {}", user.id);
    Ok(json_reply(&MessageResponse {
        message: "Password has been reset successfully.",
    }))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let base = warp::path("api").and(warp::path("auth"));

    let register_route = base
        .clone()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<RegisterRequest>())
        .and(with_state(state.clone()))
        .and_then(register);

    let login_route = base
        .clone()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<LoginRequest>())
        .and(with_state(state.clone()))
        .and_then(login);

    let forgot_route = base
        .clone()
        .and(warp::path("forgot-password"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<ForgotPasswordRequest>())
        .and(with_state(state.clone()))
        .and_then(forgot_password);

    let reset_route = base
        .and(warp::path("reset-password"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<ResetPasswordRequest>())
        .and(with_state(state))
        .and_then(reset_password);

    register_route
        .or(login_route)
        .unify()
        .or(forgot_route)
        .unify()
        .or(reset_route)
        .unify()
        .boxed()
}
