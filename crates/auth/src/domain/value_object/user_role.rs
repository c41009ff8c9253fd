//! User Role Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an account in the order-management backend
///
/// Serialized by its string code, which is also the form carried in the
/// token `role` claim. Unknown codes fail deserialization, so a tampered
/// role claim fails token verification instead of defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Customer = 0,
    Staff = 1,
    Admin = 2,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Customer => "customer",
            Staff => "staff",
            Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_staff_or_higher(&self) -> bool {
        use UserRole::*;
        matches!(self, Staff | Admin)
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Parse a stable string code; unknown codes fail closed
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "customer" => Some(Customer),
            "staff" => Some(Staff),
            "admin" => Some(Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
