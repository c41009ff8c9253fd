//! Token Service
//!
//! Issues and verifies signed, self-contained session tokens. A token is
//! three dot-separated base64url segments (header, claims, signature),
//! signed with HMAC-SHA256 — structurally the common signed-token layout,
//! but verified only against this service's own secrets.
//!
//! Access and refresh tokens use *independent* secrets: a compromised
//! access secret cannot forge refresh tokens, and a refresh token can
//! never pass as an access token even if its `type` claim is rewritten.
//!
//! The service is stateless and safe to share across all verification
//! calls. Access tokens carry no server-side revocation state (short
//! expiry substitutes for it); refresh tokens are revoked by deleting
//! their stored hash at the owning credential record.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use platform::crypto::{constant_time_eq, from_base64url, sha256_hex, to_base64url};

use crate::domain::value_object::{Email, UserId, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Token kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Signed token claims
///
/// Deserialization is the schema validator: a missing or ill-typed field
/// (including an unknown role code) fails decoding and therefore
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject account id
    pub sub: UserId,
    /// Subject email
    pub email: Email,
    /// Subject role
    pub role: UserRole,
    /// Access or refresh
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expires-at, epoch seconds
    pub exp: i64,
    /// Per-token random identifier for traceability
    pub jti: String,
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds
    pub expires_in_secs: u64,
}

/// Token service configuration
///
/// Secrets and TTLs are fixed for the process lifetime; there is no
/// runtime rotation.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"[SECRET]")
            .field("refresh_secret", &"[SECRET]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Stateless token issuer/verifier
#[derive(Debug, Clone)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue an access/refresh pair for a subject
    ///
    /// The two tokens differ only in `type`, expiry horizon and `jti`;
    /// each is signed with its own secret.
    pub fn generate_token_pair(&self, user_id: UserId, email: &Email, role: UserRole) -> TokenPair {
        let now = Utc::now();

        let access_claims = self.claims(user_id, email, role, TokenType::Access, now);
        let refresh_claims = self.claims(user_id, email, role, TokenType::Refresh, now);

        TokenPair {
            access_token: sign(&access_claims, &self.config.access_secret),
            refresh_token: sign(&refresh_claims, &self.config.refresh_secret),
            expires_in_secs: self.config.access_ttl.as_secs(),
        }
    }

    /// Verify an access token, returning its claims or `None`
    pub fn verify_access_token(&self, token: &str) -> Option<TokenClaims> {
        self.verify_at(token, TokenType::Access, Utc::now())
    }

    /// Verify a refresh token, returning its claims or `None`
    ///
    /// Signature/type/expiry only — the caller still has to match the
    /// token's hash against the stored slot.
    pub fn verify_refresh_token(&self, token: &str) -> Option<TokenClaims> {
        self.verify_at(token, TokenType::Refresh, Utc::now())
    }

    /// One-way SHA-256 hex digest of a token
    ///
    /// The raw refresh token is never stored at rest — only this digest,
    /// enabling revocation-by-deletion.
    pub fn hash_token(&self, token: &str) -> String {
        sha256_hex(token.as_bytes())
    }

    /// Decode claims without any trust guarantee
    ///
    /// Introspection only; never use the result for authorization.
    pub fn decode_without_verify(token: &str) -> Option<TokenClaims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let payload = from_base64url(parts[1]).ok()?;
        serde_json::from_slice(&payload).ok()
    }

    fn claims(
        &self,
        user_id: UserId,
        email: &Email,
        role: UserRole,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> TokenClaims {
        let ttl = match token_type {
            TokenType::Access => self.config.access_ttl,
            TokenType::Refresh => self.config.refresh_ttl,
        };
        TokenClaims {
            sub: user_id,
            email: email.clone(),
            role,
            token_type,
            iat: now.timestamp(),
            exp: now.timestamp() + ttl.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Full verification with an explicit clock, shared by both public
    /// entry points
    ///
    /// Rejects: wrong segment count, bad signature (constant-time
    /// compare with the type-appropriate secret), undecodable claims,
    /// type mismatch, and `exp` at or before `now`. Every failure mode
    /// collapses to `None`.
    fn verify_at(
        &self,
        token: &str,
        expected_type: TokenType,
        now: DateTime<Utc>,
    ) -> Option<TokenClaims> {
        let secret = match expected_type {
            TokenType::Access => &self.config.access_secret,
            TokenType::Refresh => &self.config.refresh_secret,
        };

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let mut mac =
            HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let computed = mac.finalize().into_bytes();

        let presented = from_base64url(parts[2]).ok()?;
        if !constant_time_eq(&computed, &presented) {
            return None;
        }

        let payload = from_base64url(parts[1]).ok()?;
        let claims: TokenClaims = serde_json::from_slice(&payload).ok()?;

        if claims.token_type != expected_type {
            return None;
        }
        if now.timestamp() >= claims.exp {
            return None;
        }

        Some(claims)
    }
}

fn sign(claims: &TokenClaims, secret: &[u8]) -> String {
    let header = serde_json::to_vec(&HEADER).expect("static header serializes");
    let payload = serde_json::to_vec(claims).expect("claims serialize");

    let signing_input = format!("{}.{}", to_base64url(&header), to_base64url(&payload));
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    format!("{}.{}", signing_input, to_base64url(&signature))
}
