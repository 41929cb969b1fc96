use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::config::Mail as MailConfig;

/// A plain-text message to one or more team members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<()>;
}

/// Posts messages as JSON to a transactional mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
    from: String,
}

impl fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMailer")
            .field("endpoint", &self.endpoint)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl HttpMailer {
    pub fn new(endpoint: Url, api_key: Option<String>, from: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("worship-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build mail http client")?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            from,
        })
    }

    pub fn build_request(&self, mail: &Mail) -> Result<reqwest::Request> {
        let body = json!({
            "from": self.from,
            "to": mail.to,
            "subject": mail.subject,
            "text": mail.body,
        });
        let mut req = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.build().context("failed to build mail request")
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        let req = self.build_request(mail)?;
        let resp = self
            .http
            .execute(req)
            .await
            .context("mail relay unreachable")?;
        resp.error_for_status()
            .context("mail relay rejected message")?;
        info!(recipients = mail.to.len(), subject = %mail.subject, "mail sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        info!(to = ?mail.to, subject = %mail.subject, body = %mail.body, "mail (not sent: no relay configured)");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> Result<Arc<dyn Mailer>> {
    match cfg.endpoint.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(endpoint) => {
            let url = Url::parse(endpoint).context("mail.endpoint is not a valid url")?;
            Ok(Arc::new(HttpMailer::new(url, cfg.api_key.clone(), cfg.from.clone())?))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}
