use serde::{Deserialize, Serialize};

/// Access role attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Institute,
    Student,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Institute => "institute",
            Role::Student => "student",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "institute" => Some(Self::Institute),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

/// Stored account. Only the argon2 hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub institute_name: Option<String>,
    pub password_hash: String,
}

/// Insert payload for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub role: Role,
    pub institute_name: Option<String>,
    pub password_hash: String,
}
