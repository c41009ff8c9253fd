//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the shared technical foundations of the security
//! core:
//! - Cryptographic utilities (SHA-256, base64url, constant-time compare)
//! - Password hashing (PBKDF2-HMAC-SHA512) and the password-strength policy
//! - Fixed-window rate limiting infrastructure

pub mod crypto;
pub mod password;
pub mod rate_limit;
