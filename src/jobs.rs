//! Periodic jobs: weekly playlist reset, Saturday music reminder and the
//! daily birthday greeting.
//!
//! Each job runs on its own tokio task that sleeps until the next firing time
//! in the configured offset. The same entry points back the `/crons/*` routes.

use std::fmt::Write as _;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config;
use crate::db;
use crate::gate::{ResetOutcome, WeeklyResetGate};
use crate::mailer::{Mail, Mailer};
use crate::model::{Identity, PlaylistEntry};
use crate::playlist::Playlist;
use crate::schedule::upcoming_service_date;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimingError {
    #[error("expected HH:MM, got {0:?}")]
    Time(String),
    #[error("unknown weekday {0:?}")]
    Weekday(String),
}

/// When a job fires, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTiming {
    Daily { at: NaiveTime },
    Weekly { day: Weekday, at: NaiveTime },
}

fn parse_time(raw: &str) -> Result<NaiveTime, TimingError> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| TimingError::Time(raw.to_string()))
}

impl FromStr for JobTiming {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(char::is_whitespace) {
            Some((day, at)) => {
                let day = day
                    .parse::<Weekday>()
                    .map_err(|_| TimingError::Weekday(day.to_string()))?;
                Ok(JobTiming::Weekly {
                    day,
                    at: parse_time(at.trim())?,
                })
            }
            None => Ok(JobTiming::Daily { at: parse_time(s)? }),
        }
    }
}

impl JobTiming {
    /// First firing time strictly after `now`.
    pub fn next_after(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let local = now.naive_local();
        let today = local.date();
        let (at, step) = match *self {
            JobTiming::Daily { at } => (today.and_time(at), 1),
            JobTiming::Weekly { day, at } => {
                let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
                (
                    (today + Days::new(u64::from(ahead))).and_time(at),
                    7,
                )
            }
        };
        let next = if at <= local { at + Days::new(step) } else { at };
        let offset = *now.offset();
        let utc = next - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, offset)
    }
}

/// Everything the jobs need, cheap to clone into each task.
#[derive(Clone)]
pub struct Jobs {
    playlist: Playlist,
    gate: WeeklyResetGate,
    mailer: Arc<dyn Mailer>,
    offset: FixedOffset,
}

impl Jobs {
    pub fn new(
        playlist: Playlist,
        gate: WeeklyResetGate,
        mailer: Arc<dyn Mailer>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            playlist,
            gate,
            mailer,
            offset,
        }
    }

    /// Reset the playlist if the upcoming service moved on since the last
    /// observation. `force` clears regardless and records the date.
    #[instrument(skip(self))]
    pub async fn run_weekly_playlist_clear(
        &self,
        now: DateTime<Utc>,
        force: bool,
    ) -> Result<ResetOutcome> {
        let upcoming = upcoming_service_date(now, self.offset);
        let outcome = if force {
            let removed = self.gate.force(upcoming).await?;
            ResetOutcome::Cleared { removed }
        } else {
            self.gate.evaluate(upcoming).await?
        };
        info!(?outcome, %upcoming, "weekly playlist clear finished");
        Ok(outcome)
    }

    /// Mail this week's songs to the whole team. Returns whether a mail went out.
    #[instrument(skip_all)]
    pub async fn run_music_reminder(&self) -> Result<bool> {
        let songs = self.playlist.list_ordered().await?;
        if songs.is_empty() {
            info!("no songs for this week; reminder skipped");
            return Ok(false);
        }
        let to: Vec<String> = db::users::list_identities(self.playlist.pool())
            .await?
            .into_iter()
            .map(|u| u.email)
            .filter(|e| !e.trim().is_empty())
            .collect();
        if to.is_empty() {
            info!("no recipients; reminder skipped");
            return Ok(false);
        }

        let mail = Mail {
            to,
            subject: "Músicas da semana - Prepare-se para o culto!".into(),
            body: music_reminder_body(&songs),
        };
        self.mailer
            .send(&mail)
            .await
            .context("failed to send music reminder")?;
        info!(songs = songs.len(), recipients = mail.to.len(), "music reminder sent");
        Ok(true)
    }

    /// Greet everyone born on `today` and tell the rest of the team.
    /// Returns how many people were celebrated.
    #[instrument(skip(self))]
    pub async fn run_birthday_greetings(&self, today: NaiveDate) -> Result<usize> {
        let users = db::users::list_identities(self.playlist.pool()).await?;
        let celebrants = birthdays_on(&users, today);
        if celebrants.is_empty() {
            info!("no birthdays today");
            return Ok(0);
        }

        let mut mails = Vec::new();
        for person in &celebrants {
            mails.extend(birthday_mails(person, &users));
        }
        let results = join_all(mails.iter().map(|m| self.mailer.send(m))).await;
        let mut failed = 0;
        for (mail, res) in mails.iter().zip(results) {
            if let Err(err) = res {
                warn!(?err, subject = %mail.subject, "birthday mail failed");
                failed += 1;
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {} birthday mails failed", mails.len());
        }
        info!(celebrants = celebrants.len(), mails = mails.len(), "birthday mails sent");
        Ok(celebrants.len())
    }

    /// Today's date where the team lives.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }
}

pub fn birthdays_on(users: &[Identity], today: NaiveDate) -> Vec<&Identity> {
    users
        .iter()
        .filter(|u| {
            u.birth_date
                .map(|b| b.month() == today.month() && b.day() == today.day())
                .unwrap_or(false)
        })
        .collect()
}

fn birthday_mails(person: &Identity, team: &[Identity]) -> Vec<Mail> {
    let mut out = Vec::with_capacity(2);
    let shown = person.display_name();
    if !person.email.trim().is_empty() {
        out.push(Mail {
            to: vec![person.email.clone()],
            subject: "Feliz aniversário!".into(),
            body: format!(
                "Feliz aniversário, {shown}!\n\n\
                 Hoje celebramos a sua vida e agradecemos a Deus por você fazer parte do nosso ministério.\n\n\
                 Com carinho,\nMinistério de Louvor\n"
            ),
        });
    }
    let others: Vec<String> = team
        .iter()
        .filter(|u| u.id != person.id && !u.email.trim().is_empty())
        .map(|u| u.email.clone())
        .collect();
    if !others.is_empty() {
        out.push(Mail {
            to: others,
            subject: format!("Hoje é aniversário de {shown}!"),
            body: format!(
                "Hoje celebramos a vida de {}!\nMande uma mensagem de carinho!\n",
                person.name
            ),
        });
    }
    out
}

pub fn music_reminder_body(songs: &[PlaylistEntry]) -> String {
    let mut body = String::from(
        "Olá pessoal!\n\nEste é um lembrete semanal para estudarem as músicas do próximo culto:\n\n",
    );
    for song in songs {
        let _ = write!(body, "{}. {}", song.rank, song.name);
        if let Some(cifra) = &song.cifra {
            let _ = write!(body, " - Tom: {cifra}");
        }
        if let Some(minister) = &song.minister {
            let _ = write!(body, " ({minister})");
        }
        body.push('\n');
        if let Some(link) = &song.link {
            let _ = writeln!(body, "   {link}");
        }
    }
    body.push_str("\nNão esqueçam de verificar a escala antes do culto!\n\nCom carinho,\nMinistério de Louvor\n");
    body
}

fn spawn_job<F, Fut>(name: &'static str, timing: JobTiming, offset: FixedOffset, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now().with_timezone(&offset);
            let next = timing.next_after(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(job = name, next = %next, "job scheduled");
            tokio::time::sleep(wait).await;
            match run().await {
                Ok(()) => info!(job = name, "job finished"),
                Err(err) => error!(?err, job = name, "job failed"),
            }
        }
    })
}

/// Start one task per job. Timings were validated with the config, but a bad
/// value still surfaces here as an error.
pub fn spawn_all(jobs: Jobs, cfg: &config::Jobs) -> Result<Vec<JoinHandle<()>>> {
    let reset: JobTiming = cfg.playlist_reset.parse().context("jobs.playlist_reset")?;
    let reminder: JobTiming = cfg.music_reminder.parse().context("jobs.music_reminder")?;
    let birthday: JobTiming = cfg.birthday.parse().context("jobs.birthday")?;
    let offset = jobs.offset;

    let j = jobs.clone();
    let reset_task = spawn_job("playlist_reset", reset, offset, move || {
        let j = j.clone();
        async move { j.run_weekly_playlist_clear(Utc::now(), false).await.map(|_| ()) }
    });

    let j = jobs.clone();
    let reminder_task = spawn_job("music_reminder", reminder, offset, move || {
        let j = j.clone();
        async move { j.run_music_reminder().await.map(|_| ()) }
    });

    let j = jobs;
    let birthday_task = spawn_job("birthday", birthday, offset, move || {
        let j = j.clone();
        async move {
            let today = j.today(Utc::now());
            j.run_birthday_greetings(today).await.map(|_| ())
        }
    });

    Ok(vec![reset_task, reminder_task, birthday_task])
}
