//! Row shapes decoded by the repositories.
//!
//! Keep these structs focused on what the queries return; conversion into the
//! domain types in `crate::model` happens here so callers never see raw rows.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{ArchiveEntry, Identity, PlaylistEntry, Role};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    pub minister: Option<String>,
    pub rank: i64,
    pub created_by: Option<String>,
}

impl From<PlaylistRow> for PlaylistEntry {
    fn from(row: PlaylistRow) -> Self {
        PlaylistEntry {
            id: row.id,
            name: row.name,
            link: row.link,
            letter: row.letter,
            cifra: row.cifra,
            spotify: row.spotify,
            minister: row.minister,
            rank: row.rank,
            created_by: row.created_by,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArchiveRow {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    pub minister: Option<String>,
    pub search_text: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ArchiveRow> for ArchiveEntry {
    fn from(row: ArchiveRow) -> Self {
        ArchiveEntry {
            id: row.id,
            name: row.name,
            link: row.link,
            letter: row.letter,
            cifra: row.cifra,
            spotify: row.spotify,
            minister: row.minister,
            search_tokens: row.search_text.split_whitespace().map(str::to_owned).collect(),
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    /// Comma separated role names.
    pub roles: String,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Identity {
            id: row.id,
            name: row.name,
            nickname: row.nickname,
            email: row.email,
            birth_date: row.birth_date,
            roles: row.roles.split(',').filter_map(Role::parse_role).collect(),
        }
    }
}
