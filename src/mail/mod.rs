//! Outbound mail collaborator used for reminder emails.

pub mod console;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use console::ConsoleMailer;
pub use http::HttpMailer;

use crate::state::MailBackend;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("message has no recipients")]
    NoRecipients,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

pub fn mailer_from_backend(backend: &MailBackend) -> Arc<dyn Mailer> {
    match backend {
        MailBackend::Console => Arc::new(ConsoleMailer),
        MailBackend::Http { api_url, api_key } => {
            Arc::new(HttpMailer::new(api_url.clone(), api_key.clone()))
        }
    }
}
