use async_trait::async_trait;
use serde::Serialize;

use super::{Email, Notifier};
use crate::config::MailerConfig;
use crate::error::{invalid_input_error, upstream_error, Error};

/// Sends emails through a transactional email HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailerConfig,
}

#[derive(Serialize)]
struct Payload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    #[tracing::instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: Email) -> Result<(), Error> {
        let url = format!("{}/emails", self.config.api_base.trim_end_matches('/'));

        let payload = Payload {
            from: &self.config.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            tracing::warn!(status_code, "mail provider rejected the email");
            return Err(invalid_input_error());
        } else if !res.status().is_success() {
            tracing::warn!(status_code, "mail provider failed");
            return Err(upstream_error());
        }

        Ok(())
    }
}
