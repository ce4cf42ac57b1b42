//! Outgoing mail through the Resend HTTP API

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::MailConfig;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    config: MailConfig,
    endpoint: String,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            endpoint: RESEND_API_URL.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.resend_api_key.is_some()
    }

    pub async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<(), MailError> {
        let Some(api_key) = self.config.resend_api_key.as_deref() else {
            tracing::info!(to, reset_link, "Email not configured, logging reset link");
            return Ok(());
        };

        let request = SendEmailRequest {
            from: &self.config.from_email,
            to: [to],
            subject: "Reset your password - Vessel Issue Reporting",
            html: password_reset_html(reset_link),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }
        tracing::info!(to, "Password reset email sent");
        Ok(())
    }
}

fn password_reset_html(reset_link: &str) -> String {
    format!(
        "<p>You requested a password reset for Vessel Issue Reporting.</p>\
         <p><a href=\"{}\">Reset your password</a></p>\
         <p>This link expires in 1 hour. If you didn't request this, ignore this email.</p>",
        reset_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mailer_only_logs() {
        let mailer = Mailer::new(MailConfig {
            resend_api_key: None,
            from_email: "noreply@example.com".to_string(),
        });
        assert!(!mailer.is_configured());
        mailer
            .send_password_reset("crew@vessel.com", "http://localhost/reset-password?token=abc")
            .await
            .unwrap();
    }

    #[test]
    fn reset_mail_links_the_token() {
        let html = password_reset_html("http://localhost/reset-password?token=abc");
        assert!(html.contains("href=\"http://localhost/reset-password?token=abc\""));
        assert!(html.contains("expires in 1 hour"));
    }
}
