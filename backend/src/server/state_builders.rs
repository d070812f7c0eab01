//! Adapter selection and service wiring for the HTTP state.
//!
//! A database URL selects the Diesel repositories, otherwise the in-memory
//! store. An identity URL selects the HTTP auth client, otherwise the
//! in-memory provider. The in-memory choices are for development only.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use orgdesk::domain::ports::{
    CampaignRepository, IdentityProvider, InviteMailer, InviteRepository, NoteRepository,
    OrganizationRepository,
};
use orgdesk::domain::{
    AccountService, CampaignService, IdentityLoginService, InviteService, InviteServiceConfig,
    NoteService,
    OrganizationService,
};
use orgdesk::inbound::http::state::{HttpState, HttpStatePorts};
use orgdesk::outbound::identity::{HttpIdentityProvider, IdentityApiKeys, InMemoryIdentityProvider};
use orgdesk::outbound::mailer::LoggingInviteMailer;
use orgdesk::outbound::memory::MemoryStore;
use orgdesk::outbound::persistence::{
    DbPool, DieselCampaignRepository, DieselInviteRepository, DieselNoteRepository,
    DieselOrganizationRepository, PoolConfig, run_pending_migrations,
};

use super::config::AppSettings;

/// Where tenant data lives.
pub(crate) enum Storage {
    Postgres(DbPool),
    Memory(Arc<MemoryStore>),
}

/// Who authenticates users.
pub(crate) enum Identity {
    Remote(Arc<HttpIdentityProvider>),
    Local(Arc<InMemoryIdentityProvider>),
}

/// Connect to PostgreSQL when configured, applying migrations first.
///
/// # Errors
///
/// Propagates migration and pool failures as [`std::io::Error`].
pub(crate) async fn build_storage(settings: &AppSettings) -> std::io::Result<Storage> {
    let Some(url) = settings.database_url.as_deref() else {
        warn!("ORGDESK_DATABASE_URL not set; using the in-memory store (data is lost on restart)");
        return Ok(Storage::Memory(Arc::new(MemoryStore::new())));
    };
    if settings.skip_migrations {
        info!("skipping database migrations");
    } else {
        run_pending_migrations(url).await.map_err(std::io::Error::other)?;
    }
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_max_size()))
        .await
        .map_err(std::io::Error::other)?;
    Ok(Storage::Postgres(pool))
}

/// Build the identity adapter.
///
/// # Errors
///
/// Invalid identity settings or an HTTP client that cannot be constructed.
pub(crate) fn build_identity(settings: &AppSettings) -> std::io::Result<Identity> {
    let Some(identity) = settings.identity().map_err(std::io::Error::other)? else {
        warn!("ORGDESK_IDENTITY_URL not set; using the in-memory identity provider");
        return Ok(Identity::Local(Arc::new(InMemoryIdentityProvider::new())));
    };
    let provider = HttpIdentityProvider::new(
        identity.url,
        IdentityApiKeys {
            anon_key: identity.anon_key,
            service_key: identity.service_key,
        },
        identity.timeout,
    )
    .map_err(std::io::Error::other)?;
    Ok(Identity::Remote(Arc::new(provider)))
}

struct Repositories<O, V, N, C> {
    organizations: Arc<O>,
    invites: Arc<V>,
    notes: Arc<N>,
    campaigns: Arc<C>,
}

impl Repositories<MemoryStore, MemoryStore, MemoryStore, MemoryStore> {
    fn memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            organizations: Arc::clone(store),
            invites: Arc::clone(store),
            notes: Arc::clone(store),
            campaigns: Arc::clone(store),
        }
    }
}

impl
    Repositories<
        DieselOrganizationRepository,
        DieselInviteRepository,
        DieselNoteRepository,
        DieselCampaignRepository,
    >
{
    fn postgres(pool: &DbPool) -> Self {
        Self {
            organizations: Arc::new(DieselOrganizationRepository::new(pool.clone())),
            invites: Arc::new(DieselInviteRepository::new(pool.clone())),
            notes: Arc::new(DieselNoteRepository::new(pool.clone())),
            campaigns: Arc::new(DieselCampaignRepository::new(pool.clone())),
        }
    }
}

/// Services shared by every adapter combination.
struct Shared<M> {
    mailer: Arc<M>,
    clock: Arc<dyn Clock>,
    invites: InviteServiceConfig,
}

fn assemble<O, V, N, C, I, M>(
    repos: Repositories<O, V, N, C>,
    identity: Arc<I>,
    shared: Shared<M>,
) -> HttpState
where
    O: OrganizationRepository + 'static,
    V: InviteRepository + 'static,
    N: NoteRepository + 'static,
    C: CampaignRepository + 'static,
    I: IdentityProvider + 'static,
    M: InviteMailer + 'static,
{
    let Repositories {
        organizations,
        invites,
        notes,
        campaigns,
    } = repos;
    HttpState::from(HttpStatePorts {
        login: Arc::new(IdentityLoginService::new(Arc::clone(&identity))),
        account: Arc::new(AccountService::new(
            Arc::clone(&organizations),
            Arc::clone(&identity),
        )),
        organizations: Arc::new(OrganizationService::new(
            Arc::clone(&organizations),
            Arc::clone(&identity),
            Arc::clone(&shared.clock),
        )),
        invites: Arc::new(InviteService::new(
            invites,
            Arc::clone(&organizations),
            Arc::clone(&identity),
            shared.mailer,
            Arc::clone(&shared.clock),
            shared.invites,
        )),
        notes: Arc::new(NoteService::new(
            notes,
            Arc::clone(&organizations),
            identity,
            Arc::clone(&shared.clock),
        )),
        campaigns: Arc::new(CampaignService::new(campaigns, organizations, shared.clock)),
    })
}

/// Wire every driving port against the selected adapters.
pub(crate) fn build_http_state(
    storage: &Storage,
    identity: &Identity,
    invites: InviteServiceConfig,
) -> web::Data<HttpState> {
    let shared = Shared {
        mailer: Arc::new(LoggingInviteMailer),
        clock: Arc::new(DefaultClock) as Arc<dyn Clock>,
        invites,
    };
    let state = match (storage, identity) {
        (Storage::Postgres(pool), Identity::Remote(idp)) => {
            assemble(Repositories::postgres(pool), Arc::clone(idp), shared)
        }
        (Storage::Postgres(pool), Identity::Local(idp)) => {
            assemble(Repositories::postgres(pool), Arc::clone(idp), shared)
        }
        (Storage::Memory(store), Identity::Remote(idp)) => {
            assemble(Repositories::memory(store), Arc::clone(idp), shared)
        }
        (Storage::Memory(store), Identity::Local(idp)) => {
            assemble(Repositories::memory(store), Arc::clone(idp), shared)
        }
    };
    web::Data::new(state)
}
