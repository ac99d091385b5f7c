use anyhow::{Context, Result};
use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};

use crate::config::NotifySettings;

const DEFAULT_SMTP_PORT: u16 = 587;

/// Best-effort delivery of the authorization URL by email. Misconfiguration
/// or transport failure only costs the email channel; the console copy of
/// the URL is always printed by the caller.
pub struct Notifier {
    settings: NotifySettings,
}

impl Notifier {
    pub fn new(settings: NotifySettings) -> Self {
        Self { settings }
    }

    /// True when a destination address, an SMTP host, and SMTP credentials
    /// are all configured; anything less and delivery cannot succeed.
    pub fn is_configured(&self) -> bool {
        self.settings.email.is_some()
            && self.settings.smtp_host.is_some()
            && self.settings.smtp_username.is_some()
            && self.settings.smtp_password.is_some()
    }

    pub fn send_auth_url(&self, auth_url: &str) {
        if self.settings.email.is_none() {
            return;
        }
        if self.settings.smtp_username.is_none() || self.settings.smtp_password.is_none() {
            eprintln!("SMTP credentials not configured; skipping email notification.");
            return;
        }

        match self.try_send(auth_url) {
            Ok(to) => eprintln!("Authorization URL sent to {}", to),
            Err(e) => eprintln!("Failed to send email: {:#}", e),
        }
    }

    fn try_send(&self, auth_url: &str) -> Result<String> {
        let to = self.settings.email.as_deref().context("No destination address")?;
        let username = self
            .settings
            .smtp_username
            .as_deref()
            .context("No SMTP username")?;
        let password = self
            .settings
            .smtp_password
            .as_deref()
            .context("No SMTP password")?;
        let host = self.settings.smtp_host.as_deref().context("No SMTP host")?;
        let port = self.settings.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);

        let body = format!(
            "Your playlist downloader authorization URL is ready:\n\n\
             {}\n\n\
             Open the link above to authorize the application.\n",
            auth_url
        );

        let message = Message::builder()
            .from(username.parse().context("Invalid sender address")?)
            .to(to.parse().context("Invalid destination address")?)
            .subject("Playlist downloader authorization")
            .body(body)?;

        let mailer = SmtpTransport::starttls_relay(host)?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        mailer.send(&message)?;
        Ok(to.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_notifier_is_a_silent_noop() {
        let notifier = Notifier::new(NotifySettings::default());
        assert!(!notifier.is_configured());
        // Must return without attempting any network traffic.
        notifier.send_auth_url("https://example.com/auth");
    }

    #[test]
    fn destination_without_credentials_is_not_configured() {
        let notifier = Notifier::new(NotifySettings {
            email: Some("me@example.com".to_string()),
            ..NotifySettings::default()
        });
        assert!(!notifier.is_configured());
        notifier.send_auth_url("https://example.com/auth");
    }

    #[test]
    fn credentials_without_host_are_not_configured() {
        let notifier = Notifier::new(NotifySettings {
            email: Some("me@example.com".to_string()),
            smtp_username: Some("sender@example.com".to_string()),
            smtp_password: Some("hunter2".to_string()),
            ..NotifySettings::default()
        });
        assert!(!notifier.is_configured());
    }

    #[test]
    fn fully_configured_settings_report_configured() {
        let notifier = Notifier::new(NotifySettings {
            email: Some("me@example.com".to_string()),
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: Some(587),
            smtp_username: Some("sender@example.com".to_string()),
            smtp_password: Some("hunter2".to_string()),
        });
        assert!(notifier.is_configured());
    }
}
