//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories are thin: they translate between the internal row structs in
//! `models.rs` and domain types, and map database failures onto each port's
//! error enum. Connections come from a shared `bb8` pool driven by
//! `diesel-async`.
//!
//! ```ignore
//! use orgdesk::outbound::persistence::{DbPool, DieselNoteRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/orgdesk")).await?;
//! let notes = DieselNoteRepository::new(pool.clone());
//! ```

mod diesel_basic_error_mapping;
mod diesel_campaign_repository;
mod diesel_invite_repository;
mod diesel_note_repository;
mod diesel_organization_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_campaign_repository::DieselCampaignRepository;
pub use diesel_invite_repository::DieselInviteRepository;
pub use diesel_note_repository::DieselNoteRepository;
pub use diesel_organization_repository::DieselOrganizationRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
