//! Role Entity
//!
//! Static reference data. Roles are totally ordered by `level`; a higher
//! level dominates every permission of a lower one.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub i16);

impl RoleId {
    pub const USER: RoleId = RoleId(1);
    pub const MODERATOR: RoleId = RoleId(2);
    pub const ADMIN: RoleId = RoleId(3);

    #[inline]
    pub const fn id(&self) -> i16 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub level: i32,
}

impl Role {
    pub const USER: &'static str = "user";
    pub const MODERATOR: &'static str = "moderator";
    pub const ADMIN: &'static str = "admin";

    pub fn new(id: RoleId, name: impl Into<String>, level: i32) -> Self {
        Self {
            id,
            name: name.into(),
            level,
        }
    }

    /// The seeded role table
    pub fn defaults() -> Vec<Role> {
        vec![
            Role::new(RoleId::USER, Role::USER, 1),
            Role::new(RoleId::MODERATOR, Role::MODERATOR, 2),
            Role::new(RoleId::ADMIN, Role::ADMIN, 3),
        ]
    }
}
