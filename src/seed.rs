//! Demo accounts for local development and tests.

use chrono::Utc;
use sqlx::PgPool;

use crate::auth::password::{hash_password, hash_password_with_cost};
use crate::auth::AuthError;
use crate::models::UserCredentials;
use crate::store::StoreError;

/// (username, password, email)
pub const SEED_USERS: &[(&str, &str, &str)] = &[
    ("alex", "password123", "alex@example.com"),
    ("maria", "secret456", "maria@example.com"),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Hash(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inserts the seed users, leaving existing usernames untouched.
pub async fn seed_users(pool: &PgPool) -> Result<(), SeedError> {
    for &(username, password, email) in SEED_USERS {
        let hash = hash_password(password)?;
        sqlx::query(
            "INSERT INTO users (username, password_hash, email) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(&hash)
        .bind(email)
        .execute(pool)
        .await
        .map_err(StoreError::from_sqlx)?;
    }

    log::info!("seeded {} users", SEED_USERS.len());
    Ok(())
}

/// The seed users as in-memory credentials with ids 1, 2, ...
pub fn credentials(cost: u32) -> Result<Vec<UserCredentials>, AuthError> {
    let now = Utc::now();
    SEED_USERS
        .iter()
        .zip(1..)
        .map(|((username, password, email), id)| {
            Ok(UserCredentials {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: hash_password_with_cost(password, cost)?,
                created_at: now,
            })
        })
        .collect()
}
