//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`, [`LoginService`], [`PublicCampaigns`])
//! are what inbound adapters call. Driven ports (`*Repository`,
//! [`IdentityProvider`], [`InviteMailer`]) are what outbound adapters
//! implement.

mod macros;
pub(crate) use macros::define_port_error;

mod account;
mod campaign_repository;
mod campaigns;
mod identity_provider;
mod invite_mailer;
mod invite_repository;
mod invites;
mod login_service;
mod note_repository;
mod notes;
mod organization_repository;
mod organizations;

#[cfg(test)]
pub use account::MockAccountCommand;
pub use account::AccountCommand;
#[cfg(test)]
pub use campaign_repository::MockCampaignRepository;
pub use campaign_repository::{CampaignRepository, CampaignRepositoryError, SubmissionCounts};
#[cfg(test)]
pub use campaigns::{MockCampaignsCommand, MockCampaignsQuery, MockPublicCampaigns};
pub use campaigns::{CampaignsCommand, CampaignsQuery, PublicCampaigns};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use invite_mailer::MockInviteMailer;
pub use invite_mailer::{InviteEmail, InviteMailer, InviteMailerError};
#[cfg(test)]
pub use invite_repository::MockInviteRepository;
pub use invite_repository::{InviteRepository, InviteRepositoryError};
#[cfg(test)]
pub use invites::{MockInvitesCommand, MockInvitesQuery};
pub use invites::{InvitesCommand, InvitesQuery};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use note_repository::MockNoteRepository;
pub use note_repository::{NoteRepository, NoteRepositoryError};
#[cfg(test)]
pub use notes::{MockNotesCommand, MockNotesQuery};
pub use notes::{NotesCommand, NotesQuery};
#[cfg(test)]
pub use organization_repository::MockOrganizationRepository;
pub use organization_repository::{OrganizationRepository, OrganizationRepositoryError};
#[cfg(test)]
pub use organizations::{MockOrganizationsCommand, MockOrganizationsQuery};
pub use organizations::{OrganizationsCommand, OrganizationsQuery};
