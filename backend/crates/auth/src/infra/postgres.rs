//! PostgreSQL Repository Implementations

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::error::conversions::unique_violation;
use kernel::id::UserId;
use platform::deadline::{STORE_DEADLINE, with_deadline};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    invitation::Invitation,
    role::{Role, RoleId},
    user::User,
};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult, DuplicateField};

/// PostgreSQL-backed auth repository
///
/// Every call runs under the store deadline and is abandoned, not retried,
/// when it expires.
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
    deadline: Duration,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            deadline: STORE_DEADLINE,
        }
    }

    async fn timed<T>(&self, call: impl Future<Output = AuthResult<T>>) -> AuthResult<T> {
        with_deadline(self.deadline, call).await?
    }

    /// Delete invitations past their expiry
    pub async fn cleanup_expired_invitations(&self) -> AuthResult<u64> {
        let deleted = self
            .timed(async {
                Ok(sqlx::query("DELETE FROM user_invitations WHERE expires_at <= NOW()")
                    .execute(&self.pool)
                    .await?
                    .rows_affected())
            })
            .await?;

        tracing::info!(invitations_deleted = deleted, "cleaned up expired invitations");
        Ok(deleted)
    }
}

/// Unique violations on the users table become field-qualified conflicts
fn registration_error(err: sqlx::Error) -> AuthError {
    match unique_violation(&err).and_then(DuplicateField::from_constraint) {
        Some(field) => AuthError::DuplicateConflict(field),
        None => AuthError::Database(err),
    }
}

const USER_COLUMNS: &str =
    "user_id, username, email, password_hash, role_id, is_active, created_at";

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn register(&self, user: &User, invitation: &Invitation) -> AuthResult<()> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO users (
                    user_id,
                    username,
                    email,
                    password_hash,
                    role_id,
                    is_active,
                    created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(user.user_id.as_uuid())
            .bind(user.user_name.as_str())
            .bind(user.email.as_str())
            .bind(user.password_hash.as_phc_string())
            .bind(user.role_id.id())
            .bind(user.is_active)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(registration_error)?;

            sqlx::query(
                r#"
                INSERT INTO user_invitations (token_hash, user_id, expires_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&invitation.token_hash)
            .bind(invitation.user_id.as_uuid())
            .bind(invitation.expires_at)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.timed(async {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
            ))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn find_active_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.timed(async {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1 AND is_active"
            ))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn find_active_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.timed(async {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active"
            ))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn activate(&self, token_hash: &str, now: DateTime<Utc>) -> AuthResult<Option<UserId>> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let user_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT user_id FROM user_invitations
                WHERE token_hash = $1 AND expires_at > $2
                FOR UPDATE
                "#,
            )
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(user_id) = user_id else {
                return Ok(None);
            };

            sqlx::query("UPDATE users SET is_active = TRUE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM user_invitations WHERE token_hash = $1")
                .bind(token_hash)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(Some(UserId::from_uuid(user_id)))
        })
        .await
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        self.timed(async {
            // user_invitations rows go with it (ON DELETE CASCADE)
            let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgAuthRepository {
    async fn find_role_by_id(&self, role_id: RoleId) -> AuthResult<Option<Role>> {
        self.timed(async {
            let row =
                sqlx::query_as::<_, RoleRow>("SELECT id, name, level FROM roles WHERE id = $1")
                    .bind(role_id.id())
                    .fetch_optional(&self.pool)
                    .await?;

            Ok(row.map(RoleRow::into_role))
        })
        .await
    }

    async fn find_role_by_name(&self, name: &str) -> AuthResult<Option<Role>> {
        self.timed(async {
            let row =
                sqlx::query_as::<_, RoleRow>("SELECT id, name, level FROM roles WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?;

            Ok(row.map(RoleRow::into_role))
        })
        .await
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role_id: i16,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("invalid password hash: {e}")))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_db(self.username),
            email: Email::from_db(self.email),
            password_hash,
            role_id: RoleId(self.role_id),
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i16,
    name: String,
    level: i32,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role::new(RoleId(self.id), self.name, self.level)
    }
}
