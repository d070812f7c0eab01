//! Display-name lookups against the identity provider.
//!
//! Listings show who wrote or invited what. Names are decoration, so a
//! provider outage degrades to empty names instead of failing the listing.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::ports::{IdentityProvider, IdentityProviderError};
use super::{Error, UserId, UserProfile};

/// Map identity provider failures onto domain errors.
pub(crate) fn map_identity_error(error: IdentityProviderError) -> Error {
    match error {
        IdentityProviderError::Connection { message } => {
            Error::service_unavailable(format!("identity provider unavailable: {message}"))
        }
        IdentityProviderError::InvalidCredentials => Error::unauthorized("invalid credentials"),
        IdentityProviderError::EmailTaken => Error::conflict("email already registered"),
        IdentityProviderError::UnknownUser => Error::unauthorized("login required"),
        IdentityProviderError::Rejected { message } => Error::invalid_request(message),
        IdentityProviderError::Protocol { message } => {
            Error::internal(format!("identity provider protocol error: {message}"))
        }
    }
}

/// Resolves user ids to profiles for enrichment.
pub struct UserDirectory<I> {
    identity: Arc<I>,
}

impl<I> Clone for UserDirectory<I> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<I> UserDirectory<I>
where
    I: IdentityProvider,
{
    /// Wrap an identity provider.
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &I {
        &self.identity
    }

    /// Profiles for `ids`, keyed by id. Unknown ids are absent.
    pub async fn profiles(&self, ids: &[UserId]) -> HashMap<UserId, UserProfile> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        match self.identity.find_users(&unique).await {
            Ok(profiles) => profiles
                .into_iter()
                .map(|profile| (profile.id, profile))
                .collect(),
            Err(error) => {
                warn!(%error, count = unique.len(), "profile enrichment failed; names left blank");
                HashMap::new()
            }
        }
    }
}

/// Display label for `id` from a profile map, empty when unknown.
pub(crate) fn label_for(profiles: &HashMap<UserId, UserProfile>, id: &UserId) -> String {
    profiles
        .get(id)
        .map(|profile| profile.label().to_owned())
        .unwrap_or_default()
}
