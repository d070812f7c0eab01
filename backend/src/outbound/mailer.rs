//! Invite mailer that writes the accept link to the log.
//!
//! Stands in for a real email integration; operators copy the link from the
//! logs during development.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{InviteEmail, InviteMailer, InviteMailerError};

/// [`InviteMailer`] that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInviteMailer;

#[async_trait]
impl InviteMailer for LoggingInviteMailer {
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), InviteMailerError> {
        info!(
            to = %email.to,
            organization = %email.organization_name,
            link = %email.accept_link,
            "invite email queued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Email;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn logging_never_fails() {
        let email = InviteEmail {
            to: Email::new("bob@example.com").expect("valid email"),
            organization_name: "Acme".to_owned(),
            accept_link: "https://app.example.com/invite/abc".to_owned(),
        };

        assert!(LoggingInviteMailer.send_invite_email(&email).await.is_ok());
    }
}
