use async_trait::async_trait;

use super::{MailError, Mailer, OutboundEmail};

/// Writes mail to the log instead of delivering it. Default for development.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if email.recipients.is_empty() {
            return Err(MailError::NoRecipients);
        }

        tracing::info!(
            from = %email.from,
            to = %email.recipients.join(", "),
            subject = %email.subject,
            "\n{}",
            email.body
        );
        Ok(())
    }
}
