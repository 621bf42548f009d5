// Role value objects

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Organizer,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Organizer => "ORGANIZER",
            Role::User => "USER",
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "ORGANIZER" => Role::Organizer,
            _ => Role::User,
        }
    }
}

/// Permission tier inside the ADMIN role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubRole {
    Staff,
    SuperAdmin,
}

impl SubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubRole::Staff => "STAFF",
            SubRole::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STAFF" => Some(SubRole::Staff),
            "SUPER_ADMIN" => Some(SubRole::SuperAdmin),
            _ => None,
        }
    }
}
