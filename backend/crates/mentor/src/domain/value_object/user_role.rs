use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserRole {
    /// Applicant being mentored
    Student = 0,
    Mentor = 1,
    /// Wildcard role: bypasses the permission table and ownership checks
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
            Student => "student",
            Mentor => "mentor",
            Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(Student),
            1 => Some(Mentor),
            2 => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "student" => Some(Student),
            "mentor" => Some(Mentor),
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
