//! Driven port for delivering invite emails.

use async_trait::async_trait;

use crate::domain::Email;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mailer adapters.
    pub enum InviteMailerError {
        /// The message could not be handed to the transport.
        Delivery { message: String } =>
            "invite email delivery failed: {message}",
    }
}

/// Outgoing invite email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    /// Recipient.
    pub to: Email,
    /// Organization the recipient is invited to.
    pub organization_name: String,
    /// Absolute accept link carrying the token.
    pub accept_link: String,
}

/// Sends invite emails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteMailer: Send + Sync {
    /// Deliver `email`.
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), InviteMailerError>;
}
