//! Fixtures shared by unit tests

use platform::password::HashedPassword;

use crate::domain::entity::role::RoleId;
use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_name::UserName};

// Well-formed PHC string; tests that check a password hash their own
const FIXTURE_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG";

pub fn user(name: &str, email: &str) -> User {
    User::new(
        UserName::new(name).unwrap(),
        Email::new(email).unwrap(),
        HashedPassword::from_phc_string(FIXTURE_HASH).unwrap(),
    )
}

pub fn active_user(name: &str, email: &str) -> User {
    let mut u = user(name, email);
    u.is_active = true;
    u
}

pub fn active_with_role(name: &str, role_id: RoleId) -> User {
    let mut u = active_user(name, &format!("{}@example.com", name.to_lowercase()));
    u.role_id = role_id;
    u
}
