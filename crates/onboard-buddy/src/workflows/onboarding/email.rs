use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

use super::domain::HireRecord;
use crate::config::{MailConfig, MailCredentials};

/// A fully composed plain-text message, independent of how it is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("unable to build message: {0}")]
    Message(#[from] lettre::error::Error),
    /// Relay connection, TLS, authentication or delivery failure.
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("mail relay credentials are not configured")]
    NotConfigured,
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(value: lettre::transport::smtp::Error) -> Self {
        Self::Smtp(Box::new(value))
    }
}

pub trait MailTransport {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Authenticated SMTP over implicit TLS, one session per message.
pub struct SmtpMailTransport {
    host: String,
    port: u16,
    credentials: Option<MailCredentials>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            host: config.relay_host.clone(),
            port: config.relay_port,
            credentials: config.sender.clone(),
        }
    }
}

impl MailTransport for SmtpMailTransport {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let credentials = self.credentials.as_ref().ok_or(MailError::NotConfigured)?;

        let message = Message::builder()
            .from(email.from.parse::<Mailbox>()?)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        let mailer = SmtpTransport::relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.address.clone(),
                credentials.app_password.clone(),
            ))
            .build();

        mailer.send(&message)?;
        Ok(())
    }
}

pub fn welcome_subject(hire: &HireRecord) -> String {
    format!("Welcome to the team, {}!", hire.name)
}

pub fn welcome_body(hire: &HireRecord) -> String {
    format!(
        "Hi {name},\n\n\
Welcome to the {department} team! Your start date is {start}.\n\
You'll report to {manager}. Before Day 1 you'll receive account setup, laptop, and schedule details.\n\n\
See you soon,\nHR Team",
        name = hire.name,
        department = hire.department,
        start = hire.start_date.format("%Y-%m-%d"),
        manager = hire.manager,
    )
}

/// Sends the welcome email when a sender is configured.
pub struct EmailNotifier {
    sender: Option<String>,
    transport: Box<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(sender: Option<String>, transport: Box<dyn MailTransport>) -> Self {
        Self { sender, transport }
    }

    pub fn from_config(config: &MailConfig) -> Self {
        let sender = config
            .sender
            .as_ref()
            .map(|credentials| credentials.address.clone());
        Self::new(sender, Box::new(SmtpMailTransport::from_config(config)))
    }

    /// `true` when the email went out or email is switched off; `false` on
    /// any delivery problem. Never aborts the run.
    pub fn notify(&self, hire: &HireRecord) -> bool {
        let Some(sender) = self.sender.as_deref() else {
            info!("mail sender not configured; skipping welcome email");
            return true;
        };

        let email = OutgoingEmail {
            from: sender.to_string(),
            to: hire.email.clone(),
            subject: welcome_subject(hire),
            body: welcome_body(hire),
        };

        match self.transport.deliver(&email) {
            Ok(()) => {
                info!(recipient = %hire.email, "welcome email sent");
                true
            }
            Err(err) => {
                error!(recipient = %hire.email, error = %err, "welcome email failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<OutgoingEmail>>>,
        fail: bool,
    }

    impl MailTransport for RecordingTransport {
        fn deliver(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.sent.lock().expect("mail mutex").push(email.clone());
            if self.fail {
                Err(relay_refused())
            } else {
                Ok(())
            }
        }
    }

    fn relay_refused() -> MailError {
        MailError::Smtp(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "relay refused connection",
        )))
    }

    fn hire() -> HireRecord {
        HireRecord {
            name: "Asha K".to_string(),
            email: "a@x.com".to_string(),
            department: "Engineering".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 21).expect("valid date"),
            manager: "R. Singh".to_string(),
        }
    }

    #[test]
    fn body_embeds_hire_details() {
        let body = welcome_body(&hire());
        assert_eq!(
            body,
            "Hi Asha K,\n\nWelcome to the Engineering team! Your start date is 2026-10-21.\n\
You'll report to R. Singh. Before Day 1 you'll receive account setup, laptop, and schedule details.\n\n\
See you soon,\nHR Team"
        );
        assert_eq!(welcome_subject(&hire()), "Welcome to the team, Asha K!");
    }

    #[test]
    fn unconfigured_sender_skips_without_sending() {
        let transport = RecordingTransport::default();
        let notifier = EmailNotifier::new(None, Box::new(transport.clone()));
        assert!(notifier.notify(&hire()));
        assert!(transport.sent.lock().expect("mail mutex").is_empty());
    }

    #[test]
    fn configured_sender_addresses_the_hire() {
        let transport = RecordingTransport::default();
        let notifier =
            EmailNotifier::new(Some("hr@example.com".to_string()), Box::new(transport.clone()));
        assert!(notifier.notify(&hire()));

        let sent = transport.sent.lock().expect("mail mutex");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "hr@example.com");
        assert_eq!(sent[0].to, "a@x.com");
    }

    #[test]
    fn transport_failure_reports_false() {
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let notifier =
            EmailNotifier::new(Some("hr@example.com".to_string()), Box::new(transport.clone()));
        assert!(!notifier.notify(&hire()));
        assert_eq!(transport.sent.lock().expect("mail mutex").len(), 1);
    }

    #[test]
    fn smtp_transport_rejects_bad_recipient_before_connecting() {
        let config = MailConfig {
            sender: Some(MailCredentials {
                address: "hr@example.com".to_string(),
                app_password: "app-pass".to_string(),
            }),
            relay_host: "smtp.invalid".to_string(),
            relay_port: 465,
        };
        let transport = SmtpMailTransport::from_config(&config);
        let email = OutgoingEmail {
            from: "hr@example.com".to_string(),
            to: "not an address".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(matches!(transport.deliver(&email), Err(MailError::Address(_))));
    }
}
