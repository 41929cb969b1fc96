use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use super::model::UserRow;
use crate::error::{Error, Result};
use crate::model::Identity;

const COLUMNS: &str = "id, name, nickname, email, birth_date, roles";

#[instrument(skip_all)]
pub async fn fetch_identity(pool: &SqlitePool, id: &str) -> Result<Option<Identity>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Into::into))
}

#[instrument(skip_all)]
pub async fn list_identities(pool: &SqlitePool) -> Result<Vec<Identity>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users ORDER BY name ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Register a team member. A second user with the same email is a conflict.
#[instrument(skip_all)]
pub async fn insert(pool: &SqlitePool, who: &Identity) -> Result<()> {
    let roles: Vec<&str> = who.roles.iter().map(|r| r.as_str()).collect();
    let res = sqlx::query(
        "INSERT INTO users (id, name, nickname, email, birth_date, roles, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&who.id)
    .bind(&who.name)
    .bind(&who.nickname)
    .bind(&who.email)
    .bind(who.birth_date)
    .bind(roles.join(","))
    .bind(Utc::now())
    .execute(pool)
    .await;

    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(Error::Conflict(
            format!("a user with email {} already exists", who.email),
        )),
        Err(err) => Err(err.into()),
    }
}
