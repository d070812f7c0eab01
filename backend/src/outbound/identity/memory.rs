//! Process-local identity provider for development and tests.
//!
//! Accounts vanish on restart and passwords are compared verbatim, so this
//! adapter must never face real users.

use async_trait::async_trait;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{Email, LoginCredentials, SignUpDetails, UserId, UserProfile, UserUpdate};

struct Account {
    profile: UserProfile,
    password: Zeroizing<String>,
}

/// [`IdentityProvider`] holding accounts in memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryIdentityProvider {
    /// Empty provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account directly, bypassing sign-up validation.
    ///
    /// # Errors
    ///
    /// [`IdentityProviderError::EmailTaken`] when the email is registered.
    pub async fn register(
        &self,
        email: Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|account| account.profile.email == email) {
            return Err(IdentityProviderError::email_taken());
        }
        let profile = UserProfile {
            id: UserId::random(),
            email,
            display_name: display_name.map(str::to_owned),
        };
        accounts.push(Account {
            profile: profile.clone(),
            password: Zeroizing::new(password.to_owned()),
        });
        Ok(profile)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<UserProfile, IdentityProviderError> {
        let accounts = self.accounts.read().await;
        accounts
            .iter()
            .find(|account| {
                account.profile.email == *credentials.email()
                    && account.password.as_str() == credentials.password()
            })
            .map(|account| account.profile.clone())
            .ok_or_else(IdentityProviderError::invalid_credentials)
    }

    async fn sign_up(&self, details: &SignUpDetails) -> Result<UserProfile, IdentityProviderError> {
        let credentials = details.credentials();
        self.register(
            credentials.email().clone(),
            credentials.password(),
            Some(details.name()),
        )
        .await
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, IdentityProviderError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|account| account.profile.id == *id)
            .map(|account| account.profile.clone()))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserProfile>, IdentityProviderError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|account| account.profile.email == *email)
            .map(|account| account.profile.clone()))
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, IdentityProviderError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .filter(|account| ids.contains(&account.profile.id))
            .map(|account| account.profile.clone())
            .collect())
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<UserProfile, IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        if let Some(email) = &update.email {
            let taken = accounts
                .iter()
                .any(|account| account.profile.email == *email && account.profile.id != *id);
            if taken {
                return Err(IdentityProviderError::email_taken());
            }
        }
        let account = accounts
            .iter_mut()
            .find(|account| account.profile.id == *id)
            .ok_or_else(IdentityProviderError::unknown_user)?;
        if let Some(name) = &update.name {
            account.profile.display_name = Some(name.clone());
        }
        if let Some(email) = &update.email {
            account.profile.email = email.clone();
        }
        if let Some(password) = &update.password {
            account.password = password.clone();
        }
        Ok(account.profile.clone())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|account| account.profile.id != *id);
        if accounts.len() == before {
            return Err(IdentityProviderError::unknown_user());
        }
        Ok(())
    }
}
