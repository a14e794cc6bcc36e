use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// JWT Claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse()
            .map_err(|_| anyhow!("subject '{}' is not a user id", self.sub))
    }
}

/// A freshly signed access token.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

fn algorithm(cfg: &AuthConfig) -> Result<Algorithm> {
    let alg = Algorithm::from_str(cfg.jwt_algorithm.trim())
        .map_err(|_| anyhow!("unknown JWT algorithm '{}'", cfg.jwt_algorithm))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => bail!("JWT algorithm {other:?} needs a key pair; only HMAC is supported"),
    }
}

/// Sign an access token for `user_id` issued at `now`.
pub fn sign_at(user_id: i32, cfg: &AuthConfig, now: DateTime<Utc>) -> Result<IssuedToken> {
    let lifetime = Duration::minutes(cfg.access_token_expire_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    };

    let token = encode(
        &Header::new(algorithm(cfg)?),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )?;

    Ok(IssuedToken {
        token,
        expires_in: lifetime.num_seconds(),
    })
}

/// Sign an access token for `user_id` valid from now.
pub fn sign(user_id: i32, cfg: &AuthConfig) -> Result<IssuedToken> {
    sign_at(user_id, cfg, Utc::now())
}

/// Verify signature and expiry against the clock reading `now`.
///
/// A token is expired once `now >= exp`; no leeway is applied.
pub fn verify_at(token: &str, cfg: &AuthConfig, now: DateTime<Utc>) -> Result<Claims> {
    let mut validation = Validation::new(algorithm(cfg)?);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &validation,
    )?
    .claims;

    if now.timestamp() >= claims.exp {
        bail!("token expired");
    }
    Ok(claims)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, cfg: &AuthConfig) -> Result<Claims> {
    verify_at(token, cfg, Utc::now())
}
