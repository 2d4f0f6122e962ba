//! HS256 JSON Web Tokens and opaque refresh tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

const JWT_ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as unix seconds
    pub exp: i64,
}

fn sign(secret: &str, signing_input: &str) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidSecret)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("{} is not base64url: {}", what, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(format!("{} is not valid JSON: {}", what, e)))
}

/// Mint an access token for `user_id` valid for `lifetime`
pub fn create_access_token(
    secret: &str,
    user_id: &str,
    email: &str,
    lifetime: Duration,
) -> Result<String, AuthError> {
    let header = Header {
        alg: JWT_ALGORITHM.to_string(),
        typ: Some("JWT".to_string()),
    };
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        exp: (Utc::now() + lifetime).timestamp(),
    };

    let header_json = serde_json::to_vec(&header).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    let claims_json = serde_json::to_vec(&claims).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    let signing_input = format!("{}.{}", URL_SAFE_NO_PAD.encode(header_json), URL_SAFE_NO_PAD.encode(claims_json));

    let signature = sign(secret, &signing_input)?.finalize().into_bytes();
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify structure, algorithm, signature and expiry, in that order
pub fn verify_access_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err(AuthError::MalformedToken("expected three segments".to_string())),
    };

    let header: Header = decode_segment(header_b64, "header")?;
    if header.alg != JWT_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(header.alg));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| AuthError::MalformedToken(format!("signature is not base64url: {}", e)))?;
    sign(secret, &format!("{}.{}", header_b64, claims_b64))?
        .verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    let claims: Claims = decode_segment(claims_b64, "claims")?;
    if claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// `n` random bytes as URL-safe base64
pub fn random_token(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
