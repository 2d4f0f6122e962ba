//! Reusable warp filters: shared state, authentication and validated JSON bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::auth::{check_api_key, check_client_credentials, verify_access_token, ClientIdentity};
use crate::common::constants::{API_KEY_HEADER, CLIENT_ID_HEADER, CLIENT_SECRET_HEADER};
use crate::engine::Validate;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::User;

/// Upper bound on accepted request bodies
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Resolve the bearer token to a stored user
pub fn with_user(state: AppState) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(authenticate_user)
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

async fn authenticate_user(header: Option<String>, state: AppState) -> Result<User, Rejection> {
    let token = header.as_deref().and_then(bearer_token).ok_or_else(ApiError::credentials)?;
    let claims = verify_access_token(&state.config.auth.jwt_secret, token).map_err(ApiError::from)?;
    let user = state.store.get_user(&claims.sub).await.map_err(ApiError::from)?;
    Ok(user.ok_or_else(ApiError::credentials)?)
}

/// Require an `X-API-Key` from the configured allow-list
pub fn with_api_key(state: AppState) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>(API_KEY_HEADER)
        .and(with_state(state))
        .and_then(|key: Option<String>, state: AppState| async move {
            check_api_key(key.as_deref(), &state.config.auth.api_keys).map_err(ApiError::from)?;
            Ok::<(), Rejection>(())
        })
        .untuple_one()
}

/// Require desktop client credentials headers
pub fn with_client() -> impl Filter<Extract = (ClientIdentity,), Error = Rejection> + Clone {
    warp::header::optional::<String>(CLIENT_ID_HEADER)
        .and(warp::header::optional::<String>(CLIENT_SECRET_HEADER))
        .and_then(|id: Option<String>, secret: Option<String>| async move {
            let identity = check_client_credentials(id.as_deref(), secret.as_deref()).map_err(ApiError::from)?;
            Ok::<ClientIdentity, Rejection>(identity)
        })
}

/// Deserialize a JSON body and run its validation before any handler logic
pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    warp::body::content_length_limit(MAX_BODY_BYTES)
        .and(warp::body::json())
        .and_then(|body: T| async move {
            body.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
            Ok::<T, Rejection>(body)
        })
}

pub fn json_reply<T: Serialize>(value: &T) -> Response {
    warp::reply::json(value).into_response()
}

pub fn json_reply_with_status<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer  token "), Some("token"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
