//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle through `web::Data` and only see driving
//! ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, CampaignsCommand, CampaignsQuery, InvitesCommand, InvitesQuery, LoginService, NotesCommand,
    NotesQuery, OrganizationsCommand, OrganizationsQuery, PublicCampaigns,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Sign-in and the current user.
    pub login: Arc<dyn LoginService>,
    /// Account settings.
    pub account: Arc<dyn AccountCommand>,
    /// Organization and membership writes.
    pub organizations: Arc<dyn OrganizationsCommand>,
    /// Organization reads.
    pub organizations_query: Arc<dyn OrganizationsQuery>,
    /// Invite writes.
    pub invites: Arc<dyn InvitesCommand>,
    /// Invite reads.
    pub invites_query: Arc<dyn InvitesQuery>,
    /// Note and comment writes.
    pub notes: Arc<dyn NotesCommand>,
    /// Note reads.
    pub notes_query: Arc<dyn NotesQuery>,
    /// Campaign and field writes.
    pub campaigns: Arc<dyn CampaignsCommand>,
    /// Campaign reads.
    pub campaigns_query: Arc<dyn CampaignsQuery>,
    /// Unauthenticated form access.
    pub public_campaigns: Arc<dyn PublicCampaigns>,
}

/// Builder-style constructor input: one service may implement several ports.
pub struct HttpStatePorts<Org, Inv, Note, Camp> {
    /// Login service.
    pub login: Arc<dyn LoginService>,
    /// Account settings service.
    pub account: Arc<dyn AccountCommand>,
    /// Serves both organization ports.
    pub organizations: Arc<Org>,
    /// Serves both invite ports.
    pub invites: Arc<Inv>,
    /// Serves both note ports.
    pub notes: Arc<Note>,
    /// Serves the campaign ports and public forms.
    pub campaigns: Arc<Camp>,
}

impl<Org, Inv, Note, Camp> From<HttpStatePorts<Org, Inv, Note, Camp>> for HttpState
where
    Org: OrganizationsCommand + OrganizationsQuery + 'static,
    Inv: InvitesCommand + InvitesQuery + 'static,
    Note: NotesCommand + NotesQuery + 'static,
    Camp: CampaignsCommand + CampaignsQuery + PublicCampaigns + 'static,
{
    fn from(ports: HttpStatePorts<Org, Inv, Note, Camp>) -> Self {
        Self {
            login: ports.login,
            account: ports.account,
            organizations: ports.organizations.clone(),
            organizations_query: ports.organizations,
            invites: ports.invites.clone(),
            invites_query: ports.invites,
            notes: ports.notes.clone(),
            notes_query: ports.notes,
            campaigns: ports.campaigns.clone(),
            campaigns_query: ports.campaigns.clone(),
            public_campaigns: ports.campaigns,
        }
    }
}
