//! Password Hashing and Verification
//!
//! Credential hashing with:
//! - PBKDF2-HMAC-SHA512 key derivation (iteration-hardened)
//! - Per-password random salt, stored as `saltHex:derivedKeyHex`
//! - Zeroization of clear-text material
//! - Constant-time comparison
//! - A strength policy that reports every violated rule, not just the first
//!
//! ## Security Features
//! - Verification fails closed: malformed stored hashes verify as `false`,
//!   they never surface as a distinguishable error
//! - Hashing is infallible and salted, so repeated hashes of the same
//!   password never collide

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use sha2::Sha512;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::constant_time_eq;

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// Derived key length in bytes
pub const DERIVED_KEY_LENGTH: usize = 64;

/// Default PBKDF2 iteration count
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Punctuation accepted as the "symbol" character class
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

/// Substrings that disqualify a password regardless of added complexity
const WEAK_SUBSTRINGS: &[&str] = &[
    "password",
    "123456",
    "qwerty",
    "letmein",
    "welcome",
    "admin",
    "iloveyou",
    "abc123",
    "monkey",
    "dragon",
];

// ============================================================================
// Strength Policy
// ============================================================================

/// Password policy violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Missing a lowercase letter
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    /// Missing an uppercase letter
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    /// Missing a digit
    #[error("Password must contain at least one number")]
    MissingDigit,

    /// Missing a symbol
    #[error("Password must contain at least one symbol")]
    MissingSymbol,

    /// Contains a known-weak substring
    #[error("Password contains a commonly used phrase")]
    WeakSubstring,
}

/// Outcome of a strength check, carrying every violated rule
///
/// Callers display the full list, so the check never stops at the first
/// failing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthReport {
    pub violations: Vec<PasswordPolicyError>,
}

impl StrengthReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable messages for every violation
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

/// Check a password against the strength policy
///
/// Collects all violations: length 12..=128 (Unicode code points),
/// at least one lowercase / uppercase / digit / symbol, and no
/// case-insensitive match against the weak-substring deny list.
pub fn check_strength(password: &str) -> StrengthReport {
    let mut violations = Vec::new();

    let char_count = password.chars().count();
    if char_count < MIN_PASSWORD_LENGTH {
        violations.push(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual: char_count,
        });
    }
    if char_count > MAX_PASSWORD_LENGTH {
        violations.push(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordPolicyError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        violations.push(PasswordPolicyError::MissingSymbol);
    }

    let lower = password.to_lowercase();
    if WEAK_SUBSTRINGS.iter().any(|weak| lower.contains(weak)) {
        violations.push(PasswordPolicyError::WeakSubstring);
    }

    StrengthReport { violations }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Input is NFKC-normalized on construction. Construction never fails:
/// the login path must be able to derive a key from any candidate, so
/// policy enforcement lives in [`check_strength`], not here.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a clear text password, normalizing Unicode with NFKC
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Check this password against the strength policy
    pub fn strength(&self) -> StrengthReport {
        check_strength(&self.0)
    }

    /// Get the password as bytes for key derivation
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Stored password hash in `saltHex:derivedKeyHex` form
///
/// The encoding is opaque to callers; only [`PasswordHasher`] interprets it.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap an encoded hash loaded from storage
    ///
    /// No validation happens here: a corrupted value simply fails
    /// verification later.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Get the encoded string for storage
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Password Hasher
// ============================================================================

/// PBKDF2-HMAC-SHA512 password hasher
///
/// The iteration count is fixed for the process lifetime; verification
/// re-derives with the same count, so changing it invalidates stored
/// hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Hash a password with a fresh random salt
    ///
    /// Infallible: there is no user-controlled error path. Two calls with
    /// the same password yield different encodings (salt freshness).
    pub fn hash(&self, password: &ClearTextPassword) -> HashedPassword {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let mut derived = [0u8; DERIVED_KEY_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, self.iterations, &mut derived);

        HashedPassword(format!("{}:{}", hex::encode(salt), hex::encode(derived)))
    }

    /// Verify a candidate password against a stored hash
    ///
    /// Fails closed: any malformed encoding (missing separator, bad hex,
    /// wrong key length) verifies as `false`. The final comparison is
    /// constant-time.
    pub fn verify(&self, password: &ClearTextPassword, stored: &HashedPassword) -> bool {
        let Some((salt_hex, key_hex)) = stored.as_str().split_once(':') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let Ok(expected) = hex::decode(key_hex) else {
            return false;
        };

        let mut derived = [0u8; DERIVED_KEY_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, self.iterations, &mut derived);

        constant_time_eq(&derived, &expected)
    }
}

// ============================================================================
// Tests
// ============================================================================
