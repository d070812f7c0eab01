//! Login service backed by the identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::directory::map_identity_error;
use super::ports::{IdentityProvider, LoginService};
use super::{Error, LoginCredentials, SignUpDetails, UserId, UserProfile};

/// [`LoginService`] delegating credential checks to an [`IdentityProvider`].
pub struct IdentityLoginService<I> {
    identity: Arc<I>,
}

impl<I> IdentityLoginService<I> {
    /// Wrap `identity`.
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl<I> LoginService for IdentityLoginService<I>
where
    I: IdentityProvider,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserProfile, Error> {
        self.identity
            .sign_in(credentials)
            .await
            .map_err(map_identity_error)
    }

    async fn sign_up(&self, details: &SignUpDetails) -> Result<UserProfile, Error> {
        let profile = self
            .identity
            .sign_up(details)
            .await
            .map_err(map_identity_error)?;
        info!(user_id = %profile.id, "account registered");
        Ok(profile)
    }

    async fn current_user(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        self.identity
            .find_user(user_id)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{IdentityProviderError, MockIdentityProvider};
    use rstest::rstest;

    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("ada@example.com", "secret").expect("valid credentials")
    }

    #[rstest]
    #[case(IdentityProviderError::invalid_credentials(), ErrorCode::Unauthorized)]
    #[case(IdentityProviderError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(IdentityProviderError::protocol("bad json"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn provider_failures_map_to_domain_codes(
        #[case] failure: IdentityProviderError,
        #[case] expected: ErrorCode,
    ) {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_in().return_once(move |_| Err(failure));
        let service = IdentityLoginService::new(Arc::new(identity));

        let err = service
            .authenticate(&credentials())
            .await
            .expect_err("failure");

        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn taken_email_on_sign_up_conflicts() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_up()
            .return_once(|_| Err(IdentityProviderError::email_taken()));
        let service = IdentityLoginService::new(Arc::new(identity));
        let details = SignUpDetails::try_from_parts("ada@example.com", "secret-one", "Ada")
            .expect("valid details");

        let err = service.sign_up(&details).await.expect_err("taken");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn vanished_user_must_log_in_again() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_find_user().return_once(|_| Ok(None));
        let service = IdentityLoginService::new(Arc::new(identity));

        let err = service
            .current_user(&UserId::random())
            .await
            .expect_err("unknown user");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
