//! Sessions and magic-link challenges
//!
//! Login is a two-step exchange:
//! 1. [`create_session`] stores a digest of a random token and hands the
//!    plaintext token to a [`ChallengeSender`] for out-of-band delivery.
//! 2. [`verify_session`] consumes the token, provisions the user on first
//!    contact, and opens a session valid for [`SESSION_TTL_SECS`].
//!
//! A session is valid only while `now < expiry`. Expired rows are never
//! swept; they simply stop resolving.

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::users::{find_user_by_email, normalize_email, User};
use super::WriteContext;
use crate::access::Role;
use crate::{Error, Result};

/// Session lifetime: 24 hours
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Length of the emailed login token
const CHALLENGE_TOKEN_LEN: usize = 48;

/// Role given to users provisioned at first login
pub const DEFAULT_ROLE: Role = Role::Viewer;

/// Session record; its id is the bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expiry: i64,
    pub time_created: i64,
    pub time_updated: i64,
}

/// Delivery of login challenges (email, chat, ...)
pub trait ChallengeSender: Send + Sync {
    fn send_challenge(&self, email: &str, token: &str) -> Result<()>;
}

/// Sender that writes the magic link to the log
#[derive(Debug, Clone)]
pub struct LogChallengeSender {
    pub verify_url: String,
}

impl ChallengeSender for LogChallengeSender {
    fn send_challenge(&self, email: &str, token: &str) -> Result<()> {
        info!("Magic link for {}: {}?token={}", email, self.verify_url, token);
        Ok(())
    }
}

/// SHA-256 hex digest of a challenge token
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CHALLENGE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Issue a login challenge for `email`
pub async fn create_session(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    sender: &dyn ChallengeSender,
    email: &str,
    challenge_ttl_secs: i64,
) -> Result<()> {
    let email = normalize_email(email)?;

    sqlx::query("DELETE FROM login_challenges WHERE expiry <= ?")
        .bind(ctx.now)
        .execute(pool)
        .await?;

    let token = generate_token();
    sqlx::query(
        r#"
        INSERT INTO login_challenges (token_hash, email, expiry, time_created)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(token_digest(&token))
    .bind(&email)
    .bind(ctx.now + challenge_ttl_secs)
    .bind(ctx.now)
    .execute(pool)
    .await?;

    sender.send_challenge(&email, &token)
}

/// Exchange a challenge token for a session
pub async fn verify_session(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    token: &str,
) -> Result<Session> {
    if token.trim().is_empty() {
        return Err(Error::invalid("Token is required"));
    }

    // Single statement: a token can be consumed once
    let email: Option<String> = sqlx::query_scalar(
        "DELETE FROM login_challenges WHERE token_hash = ? AND expiry > ? RETURNING email",
    )
    .bind(token_digest(token.trim()))
    .bind(ctx.now)
    .fetch_optional(pool)
    .await?;

    let email = email.ok_or_else(|| {
        Error::Unauthenticated("verification token is unknown or expired".to_string())
    })?;

    let user = provision_user(pool, ctx, &email).await?;
    let session = open_session(pool, ctx, &user.id).await?;
    info!("Session opened for user {}", user.id);

    Ok(session)
}

/// Find the user for `email`, creating a viewer on first contact
async fn provision_user(pool: &SqlitePool, ctx: WriteContext<'_>, email: &str) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, role_id, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(email) DO NOTHING
        "#,
    )
    .bind(ctx.ids.next_id())
    .bind(email)
    .bind(DEFAULT_ROLE.as_str())
    .bind(ctx.now)
    .bind(ctx.now)
    .execute(pool)
    .await?;

    find_user_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::Internal(format!("user {} vanished during provisioning", email)))
}

/// Open a session for an existing user
pub async fn open_session(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    user_id: &str,
) -> Result<Session> {
    let session = Session {
        id: ctx.ids.next_id(),
        user_id: user_id.to_string(),
        expiry: ctx.now + SESSION_TTL_SECS,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, expiry, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.expiry)
    .bind(session.time_created)
    .bind(session.time_updated)
    .execute(pool)
    .await?;

    Ok(session)
}

/// Resolve a bearer session id to its user
///
/// `None` for unknown and expired sessions alike.
pub async fn resolve_session(
    pool: &SqlitePool,
    session_id: &str,
    now: i64,
) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.email, u.role_id, u.time_created, u.time_updated
        FROM users u
        JOIN sessions s ON u.id = s.user_id
        WHERE s.id = ? AND s.expiry > ?
        "#,
    )
    .bind(session_id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(User::from_row).transpose()
}

/// Delete a session; deleting an unknown session is not an error
pub async fn delete_session(pool: &SqlitePool, session_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!("Session {} deleted", session_id);
    }
    Ok(())
}

/// Count live challenges for an email
pub async fn pending_challenges(pool: &SqlitePool, email: &str, now: i64) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS n FROM login_challenges WHERE email = ? AND expiry > ?",
    )
    .bind(email.trim().to_lowercase())
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row.try_get("n")?)
}
