use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A song on the current week's playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    pub minister: Option<String>,
    /// Dense 1-based display position, `order` on the wire.
    #[serde(rename = "order")]
    pub rank: i64,
    pub created_by: Option<String>,
}

/// A song as submitted for the playlist, before it has a rank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewPlaylistEntry {
    /// Caller-chosen id; generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    #[serde(alias = "ministeredBy")]
    pub minister: Option<String>,
    #[serde(skip_deserializing)]
    pub created_by: Option<String>,
}

/// Patch applied by a playlist update.
///
/// `name` is always required. For the optional text fields `None` keeps the
/// stored value, an empty string clears it and anything else replaces it.
/// `minister: None` keeps the stored minister; `rank: None` keeps the position.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistUpdate {
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    #[serde(alias = "ministeredBy")]
    pub minister: Option<String>,
    #[serde(alias = "order")]
    pub rank: Option<i64>,
}

/// A song recorded in the permanent history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    pub minister: Option<String>,
    pub search_tokens: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when curating the history directly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchiveDraft {
    pub name: String,
    pub link: Option<String>,
    pub letter: Option<String>,
    pub cifra: Option<String>,
    pub spotify: Option<String>,
    pub minister: Option<String>,
}

/// One page of history search results.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivePage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub results: Vec<ArchiveEntry>,
}

/// Team assignments keyed by function (e.g. `vocal`, `guitar`).
pub type Assignments = Map<String, Value>;

/// A scheduled worship service inside a month document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub assignments: Assignments,
}

/// What the schedule read hands back for the upcoming service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingSchedule {
    pub date: NaiveDate,
    pub assignments: Assignments,
    pub cleared_playlist: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Notification,
    Warning,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Notification => "notification",
            NoticeKind::Warning => "warning",
        }
    }
}

/// A banner shown on the front page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Leader,
    Minister,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Leader => "leader",
            Role::Minister => "minister",
            Role::Member => "member",
        }
    }

    pub fn parse_role(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "leader" => Some(Role::Leader),
            "minister" => Some(Role::Minister),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Team member as seen by the services: who they are and how to reach them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
