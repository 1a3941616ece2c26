//! User records
//!
//! Users are keyed by a unique email and carry one of the four role labels.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::WriteContext;
use crate::access::Role;
use crate::{Error, Result};

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub time_created: i64,
    pub time_updated: i64,
}

impl User {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let role: String = row.try_get("role_id")?;
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            role: role
                .parse()
                .map_err(|_| Error::Internal(format!("stored role '{}' is not valid", role)))?,
            time_created: row.try_get("time_created")?,
            time_updated: row.try_get("time_updated")?,
        })
    }
}

/// Minimal email shape check: `local@domain`, both parts non-empty
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(Error::invalid(format!("'{}' is not a valid email", email))),
    }
}

/// Validated, trimmed and lowercased form under which emails are stored
pub fn normalize_email(email: &str) -> Result<String> {
    validate_email(email)?;
    Ok(email.trim().to_lowercase())
}

/// Create a user with an explicit role
pub async fn create_user(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    email: &str,
    role: Role,
) -> Result<User> {
    let email = normalize_email(email)?;

    let user = User {
        id: ctx.ids.next_id(),
        email: email.clone(),
        role,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, role_id, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(user.time_created)
    .bind(user.time_updated)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::invalid(format!("a user with email {} already exists", email)),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Load user by id
pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<User> {
    let row = sqlx::query(
        "SELECT id, email, role_id, time_created, time_updated FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("User", user_id))?;

    User::from_row(&row)
}

/// Load user by email
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, role_id, time_created, time_updated FROM users WHERE email = ?",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(User::from_row).transpose()
}

/// Change a user's role
pub async fn update_user_role(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    user_id: &str,
    role: Role,
) -> Result<User> {
    let result = sqlx::query("UPDATE users SET role_id = ?, time_updated = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(ctx.now)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("User", user_id));
    }

    get_user(pool, user_id).await
}

/// Make `email` an owner, creating the user if needed
///
/// Used at startup so a fresh deployment has someone who can manage users.
pub async fn grant_owner(pool: &SqlitePool, ctx: WriteContext<'_>, email: &str) -> Result<User> {
    match find_user_by_email(pool, email).await? {
        Some(user) if user.role == Role::Owner => Ok(user),
        Some(user) => update_user_role(pool, ctx, &user.id, Role::Owner).await,
        None => create_user(pool, ctx, email, Role::Owner).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::ids::SequentialIds;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("pilot@example.com").is_ok());
        assert!(validate_email("  pilot@example.com ").is_ok());
        for bad in ["", "pilot", "@example.com", "pilot@", "a@b@c", "pi lot@example.com"] {
            assert!(validate_email(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_normalize_email_lowercases() {
        assert_eq!(
            normalize_email(" Pilot@Example.COM ").unwrap(),
            "pilot@example.com"
        );
        assert!(normalize_email("Pilot").is_err());
    }

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("u-");
        let ctx = WriteContext::new(&ids, 1_000);

        let user = create_user(&pool, ctx, "Pilot@Example.com", Role::Owner)
            .await
            .unwrap();
        assert_eq!(user.email, "pilot@example.com");

        let found = find_user_by_email(&pool, "PILOT@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let err = create_user(&pool, ctx, "pilot@EXAMPLE.com", Role::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("u-");
        let ctx = WriteContext::new(&ids, 1_000);

        let user = create_user(&pool, ctx, "pilot@example.com", Role::Reporter)
            .await
            .unwrap();
        assert_eq!(user.id, "u-000000000001");

        let loaded = get_user(&pool, &user.id).await.unwrap();
        assert_eq!(loaded, user);

        let by_email = find_user_by_email(&pool, "pilot@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_invalid_input() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("u-");
        let ctx = WriteContext::new(&ids, 1_000);

        create_user(&pool, ctx, "pilot@example.com", Role::Viewer)
            .await
            .unwrap();
        let err = create_user(&pool, ctx, "pilot@example.com", Role::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_role() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("u-");

        let user = create_user(&pool, WriteContext::new(&ids, 1_000), "a@b.c", Role::Viewer)
            .await
            .unwrap();
        let updated = update_user_role(&pool, WriteContext::new(&ids, 2_000), &user.id, Role::Editor)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert_eq!(updated.time_updated, 2_000);
        assert_eq!(updated.time_created, 1_000);

        let missing = update_user_role(&pool, WriteContext::new(&ids, 2_000), "nope", Role::Owner).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_role_cannot_be_persisted() {
        let pool = init_memory_database().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO users (id, email, role_id, time_created, time_updated) VALUES ('x', 'x@y.z', 'admin', 0, 0)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_grant_owner_creates_or_promotes() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("u-");
        let ctx = WriteContext::new(&ids, 1_000);

        let created = grant_owner(&pool, ctx, "chief@example.com").await.unwrap();
        assert_eq!(created.role, Role::Owner);
        let again = grant_owner(&pool, ctx, "chief@example.com").await.unwrap();
        assert_eq!(again, created);

        let viewer = create_user(&pool, ctx, "crew@example.com", Role::Viewer).await.unwrap();
        let promoted = grant_owner(&pool, ctx, "crew@example.com").await.unwrap();
        assert_eq!(promoted.id, viewer.id);
        assert_eq!(promoted.role, Role::Owner);
    }
}
