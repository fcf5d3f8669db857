use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Principal = 2,
    Teacher = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Principal),
            3 => Some(Role::Teacher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Principal => "PRINCIPAL",
            Role::Teacher => "TEACHER",
        }
    }
}

/// Account row as stored. Auth is a collaborator here; only login and
/// token verification touch it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub role_id: u8,
    /// Present only if this user is linked to a teacher record
    pub teacher_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
    /// Present only if this user is linked to a teacher record
    pub teacher_id: Option<u64>,
}
