//! HTTP-facing error taxonomy and the warp rejection handler.

use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::auth::AuthError;
use crate::engine::EngineError;
use crate::store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";
pub(crate) const EMAIL_TAKEN_MESSAGE: &str = "Email already registered";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Logged in full, returned as a generic message
    #[error("{0}")]
    Internal(String),

    /// Operation-level failure whose message is safe to return
    #[error("{0}")]
    OperationFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `detail` field of the response body
    pub fn detail(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn credentials() -> Self {
        ApiError::Unauthenticated("Could not validate credentials".to_string())
    }

    /// Failure of a user write; an email owned by another account is a client error
    pub fn user_write(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => ApiError::BadRequest(EMAIL_TAKEN_MESSAGE.to_string()),
            other => ApiError::from(other),
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Unavailable(msg) => ApiError::UpstreamUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hashing(msg) => ApiError::Internal(msg),
            AuthError::InvalidApiKey | AuthError::InvalidClientCredentials => {
                ApiError::Unauthenticated(err.to_string())
            }
            _ => ApiError::credentials(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AllBranchesFailed => ApiError::OperationFailed(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn error_reply(status: StatusCode, detail: String) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody { detail }), status)
}

/// Convert every rejection into a `{"detail": ...}` JSON body
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    if rejection.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not Found".to_string()));
    }

    if let Some(api_error) = rejection.find::<ApiError>() {
        let status = api_error.status();
        if status.is_server_error() {
            error!("❌ Request failed with {}: {}", status, api_error);
        } else {
            warn!("⚠️ Request rejected with {}: {}", status, api_error);
        }
        return Ok(error_reply(status, api_error.detail()));
    }

    if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }
    if let Some(e) = rejection.find::<warp::reject::InvalidQuery>() {
        return Ok(error_reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }
    if let Some(e) = rejection.find::<warp::reject::MissingHeader>() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }
    if rejection.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(error_reply(StatusCode::LENGTH_REQUIRED, "Request body required".to_string()));
    }
    if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string()));
    }
    if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_reply(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type".to_string()));
    }
    if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string()));
    }

    error!("❌ Unhandled rejection: {:?}", rejection);
    Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detail_is_generic() {
        let err = ApiError::Internal("LMDB error: MDB_MAP_FULL".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn test_store_error_mapping() {
        let err: ApiError = StoreError::Duplicate("Email already registered".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Email already registered");

        let err: ApiError = StoreError::Unavailable("mailbox closed".to_string()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_user_write_duplicate_email() {
        let err = ApiError::user_write(StoreError::Duplicate("email a@example.com already registered".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Email already registered");

        let err = ApiError::user_write(StoreError::Unavailable("mailbox closed".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_custom_rejection_keeps_status() {
        let rejection: Rejection = ApiError::not_found("Game").into();
        let response = handle_rejection(rejection).await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle_rejection(warp::reject::not_found()).await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: ApiError = AuthError::Expired.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.detail(), "Could not validate credentials");

        let err: ApiError = AuthError::InvalidApiKey.into();
        assert_eq!(err.detail(), "Invalid API Key");
    }

    #[test]
    fn test_all_branches_failed_keeps_message() {
        let err: ApiError = EngineError::AllBranchesFailed.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "All optimization attempts failed");
    }
}
