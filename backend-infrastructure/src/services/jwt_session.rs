//! Bearer-token sessions.
//!
//! Tokens are HS256 JWTs carrying the user id, role and optional admin
//! sub-role. A token that fails signature or expiry checks resolves to no
//! session rather than an error.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use backend_domain::ports::SessionProvider;
use backend_domain::{Role, Session, SubRole};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_role: Option<String>,
    pub exp: i64,
}

pub struct JwtSessionProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSessionProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for the session, valid for `ttl`.
    pub fn issue(&self, session: &Session, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: session.user_id.clone(),
            role: session.role.as_str().to_string(),
            sub_role: session.sub_role.map(|sub_role| sub_role.as_str().to_string()),
            exp: (Utc::now() + ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    fn decode_session(&self, token: &str) -> Option<Session> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => {
                let claims = data.claims;
                if claims.sub.trim().is_empty() {
                    return None;
                }
                Some(Session {
                    user_id: claims.sub,
                    role: Role::from(claims.role.as_str()),
                    sub_role: claims.sub_role.as_deref().and_then(SubRole::parse),
                })
            }
            Err(err) => {
                debug!("rejected bearer token: {}", err);
                None
            }
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        Ok(self.decode_session(token.trim()))
    }
}
