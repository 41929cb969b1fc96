use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;
use worship_board::db;
use worship_board::gate::{ResetOutcome, WeeklyResetGate};
use worship_board::jobs::Jobs;
use worship_board::mailer::{Mail, Mailer};
use worship_board::model::{Identity, NewPlaylistEntry, Role};
use worship_board::playlist::Playlist;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<Mail>>>,
    fail: bool,
}

impl RecordingMailer {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    async fn sent(&self) -> Vec<Mail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        if self.fail {
            return Err(anyhow!("relay down"));
        }
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}

fn brt() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn jobs_with(pool: &sqlx::SqlitePool, mailer: RecordingMailer) -> (Jobs, Playlist) {
    let playlist = Playlist::new(pool.clone());
    let gate = WeeklyResetGate::new(playlist.clone());
    (
        Jobs::new(playlist.clone(), gate, Arc::new(mailer), brt()),
        playlist,
    )
}

async fn add_user(pool: &sqlx::SqlitePool, id: &str, name: &str, birth: Option<NaiveDate>) {
    let who = Identity {
        id: id.into(),
        name: name.into(),
        nickname: None,
        email: format!("{id}@example.org"),
        birth_date: birth,
        roles: vec![Role::Member],
    };
    db::users::insert(pool, &who).await.unwrap();
}

async fn add_song(playlist: &Playlist, name: &str) {
    playlist
        .append(NewPlaylistEntry {
            name: name.into(),
            minister: Some("Ana".into()),
            ..Default::default()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn weekly_clear_follows_the_gate() {
    let pool = setup_pool().await;
    let (jobs, playlist) = jobs_with(&pool, RecordingMailer::default());
    add_song(&playlist, "A").await;

    // Monday after the 2024-06-09 service: upcoming is 2024-06-16.
    let monday = Utc.with_ymd_and_hms(2024, 6, 10, 3, 5, 0).unwrap();
    let first = jobs.run_weekly_playlist_clear(monday, false).await.unwrap();
    assert_eq!(first, ResetOutcome::Cleared { removed: 1 });

    add_song(&playlist, "B").await;
    let again = jobs.run_weekly_playlist_clear(monday, false).await.unwrap();
    assert_eq!(again, ResetOutcome::Unchanged);
    assert_eq!(playlist.list_ordered().await.unwrap().len(), 1);

    let forced = jobs.run_weekly_playlist_clear(monday, true).await.unwrap();
    assert_eq!(forced, ResetOutcome::Cleared { removed: 1 });
    assert!(playlist.list_ordered().await.unwrap().is_empty());
}

#[tokio::test]
async fn music_reminder_goes_to_everyone() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let (jobs, playlist) = jobs_with(&pool, mailer.clone());
    add_user(&pool, "ana", "Ana", None).await;
    add_user(&pool, "bia", "Bia", None).await;
    add_song(&playlist, "Aleluia").await;
    add_song(&playlist, "Santo").await;

    assert!(jobs.run_music_reminder().await.unwrap());
    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ana@example.org", "bia@example.org"]);
    assert!(sent[0].body.contains("1. Aleluia"));
    assert!(sent[0].body.contains("2. Santo"));
}

#[tokio::test]
async fn music_reminder_skips_without_songs() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let (jobs, _playlist) = jobs_with(&pool, mailer.clone());
    add_user(&pool, "ana", "Ana", None).await;

    assert!(!jobs.run_music_reminder().await.unwrap());
    assert!(mailer.sent().await.is_empty());
}

#[tokio::test]
async fn music_reminder_skips_without_recipients() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let (jobs, playlist) = jobs_with(&pool, mailer.clone());
    add_song(&playlist, "Aleluia").await;

    assert!(!jobs.run_music_reminder().await.unwrap());
    assert!(mailer.sent().await.is_empty());
}

#[tokio::test]
async fn music_reminder_surfaces_mail_failure() {
    let pool = setup_pool().await;
    let (jobs, playlist) = jobs_with(&pool, RecordingMailer::failing());
    add_user(&pool, "ana", "Ana", None).await;
    add_song(&playlist, "Aleluia").await;

    assert!(jobs.run_music_reminder().await.is_err());
}

#[tokio::test]
async fn birthday_greets_and_notifies_the_rest() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let (jobs, _playlist) = jobs_with(&pool, mailer.clone());
    add_user(&pool, "ana", "Ana", NaiveDate::from_ymd_opt(1990, 6, 12)).await;
    add_user(&pool, "bia", "Bia", NaiveDate::from_ymd_opt(1992, 1, 3)).await;
    add_user(&pool, "caio", "Caio", None).await;

    let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    assert_eq!(jobs.run_birthday_greetings(today).await.unwrap(), 1);

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 2);
    let greeting = sent.iter().find(|m| m.to == vec!["ana@example.org"]).unwrap();
    assert!(greeting.body.contains("Ana"));
    let notice = sent.iter().find(|m| m.to.len() == 2).unwrap();
    assert_eq!(notice.to, vec!["bia@example.org", "caio@example.org"]);
}

#[tokio::test]
async fn no_birthdays_sends_nothing() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let (jobs, _playlist) = jobs_with(&pool, mailer.clone());
    add_user(&pool, "bia", "Bia", NaiveDate::from_ymd_opt(1992, 1, 3)).await;

    let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    assert_eq!(jobs.run_birthday_greetings(today).await.unwrap(), 0);
    assert!(mailer.sent().await.is_empty());
}

#[tokio::test]
async fn today_uses_local_offset() {
    let pool = setup_pool().await;
    let (jobs, _playlist) = jobs_with(&pool, RecordingMailer::default());
    // 01:00 UTC is still the previous evening in UTC-3.
    let late = Utc.with_ymd_and_hms(2024, 6, 13, 1, 0, 0).unwrap();
    assert_eq!(jobs.today(late), NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
}
