use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{error, info};

use super::domain::HireRecord;
use crate::config::ChatConfig;

/// Incoming-webhook payload: a single text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub text: String,
}

impl ChatMessage {
    pub fn announcing(hire: &HireRecord) -> Self {
        Self {
            text: format!(
                "🎉 New Team Member: {} starts {} in {} (Mgr: {})",
                hire.name,
                hire.start_date.format("%Y-%m-%d"),
                hire.department,
                hire.manager
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub trait WebhookTransport {
    fn post(&self, url: &str, message: &ChatMessage, timeout: Duration) -> Result<(), ChatError>;
}

/// JSON POST over reqwest, driven on a shared runtime.
pub struct HttpWebhookTransport {
    http: reqwest::Client,
    runtime: Arc<Runtime>,
}

impl HttpWebhookTransport {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            http: reqwest::Client::new(),
            runtime,
        }
    }
}

impl WebhookTransport for HttpWebhookTransport {
    fn post(&self, url: &str, message: &ChatMessage, timeout: Duration) -> Result<(), ChatError> {
        self.runtime.block_on(async {
            let response = self
                .http
                .post(url)
                .timeout(timeout)
                .json(message)
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(ChatError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        })
    }
}

/// Posts the team announcement when a webhook is configured.
pub struct ChatNotifier {
    webhook_url: Option<String>,
    timeout: Duration,
    transport: Box<dyn WebhookTransport>,
}

impl ChatNotifier {
    pub fn new(config: &ChatConfig, transport: Box<dyn WebhookTransport>) -> Self {
        Self {
            webhook_url: config.webhook_url.clone(),
            timeout: config.timeout,
            transport,
        }
    }

    /// Same contract as the email notifier: skipping counts as success,
    /// failures are logged and reported as `false`.
    pub fn notify(&self, hire: &HireRecord) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            info!("chat webhook not configured; skipping announcement");
            return true;
        };

        match self
            .transport
            .post(url, &ChatMessage::announcing(hire), self.timeout)
        {
            Ok(()) => {
                info!(hire = %hire.name, "team announcement posted");
                true
            }
            Err(err) => {
                error!(hire = %hire.name, error = %err, "team announcement failed");
                false
            }
        }
    }
}
