// Authenticated session as supplied by the identity collaborator

use serde::{Deserialize, Serialize};

use crate::value_objects::{Role, SubRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub sub_role: Option<SubRole>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
