use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::{Role, User};

const TOKEN_TTL_HOURS: i64 = 24;

/// Identity claims embedded in a credential. The shape mirrors the login
/// profile minus display-only fields; department is resolved from the store
/// when a view needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub student_no: Option<String>,
    pub exp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Invalid,
    Expired,
}

/// Issues and checks credentials of the form
/// `hex(claims_json) "." hex(sha256(secret || claims_json))`.
///
/// The tag keeps forged or edited claims out; it is a keyed hash, not a full
/// HMAC, which is adequate for a single-workspace demo secret that never
/// signs attacker-chosen key material.
pub struct TokenSigner {
    secret: [u8; 32],
}

impl TokenSigner {
    pub fn generate() -> TokenSigner {
        TokenSigner {
            secret: thread_rng().gen(),
        }
    }

    pub fn from_hex(raw: &str) -> Option<TokenSigner> {
        let bytes = hex::decode(raw).ok()?;
        let secret: [u8; 32] = bytes.try_into().ok()?;
        Some(TokenSigner { secret })
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret)
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            student_no: user.student_no.clone(),
            exp: now + Duration::hours(TOKEN_TTL_HOURS),
        };
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &Claims) -> anyhow::Result<String> {
        let payload = serde_json::to_vec(claims)?;
        Ok(format!("{}.{}", hex::encode(&payload), self.tag(&payload)))
    }

    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let Some((payload_hex, tag_hex)) = token.split_once('.') else {
            return Err(TokenError::Invalid);
        };
        let payload = hex::decode(payload_hex).map_err(|_| TokenError::Invalid)?;
        if self.tag(&payload) != tag_hex {
            return Err(TokenError::Invalid);
        }
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Invalid)?;
        if now > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn tag(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }
}
