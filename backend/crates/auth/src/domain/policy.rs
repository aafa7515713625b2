//! Access Decision Table
//!
//! | owner match | level vs required | decision        |
//! |-------------|-------------------|-----------------|
//! | yes         | any               | allow (owner)   |
//! | no          | less              | deny            |
//! | no          | equal or greater  | allow (role)    |

use std::cmp::Ordering;

/// Why access was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    Owner,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(AccessGrant),
    Deny,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow(_))
    }
}

/// `level_cmp` is the principal's level compared to the required level
pub fn decide(owner_match: bool, level_cmp: Ordering) -> AccessDecision {
    match (owner_match, level_cmp) {
        (true, _) => AccessDecision::Allow(AccessGrant::Owner),
        (false, Ordering::Less) => AccessDecision::Deny,
        (false, Ordering::Equal | Ordering::Greater) => AccessDecision::Allow(AccessGrant::Role),
    }
}
