//! Reqwest-backed adapter for a GoTrue-compatible auth service.
//!
//! Public endpoints (sign-in, sign-up) authenticate with the anon key; user
//! lookups use the admin API and the service key.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::dto::{
    AdminUserUpdateDto, ErrorBodyDto, PasswordGrantDto, SignUpDto, SignUpMetadataDto, UserDto,
    UserEnvelopeDto, UserListDto,
};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{Email, LoginCredentials, SignUpDetails, UserId, UserProfile, UserUpdate};

const ADMIN_PAGE_SIZE: u32 = 1000;

/// Keys issued by the auth service.
pub struct IdentityApiKeys {
    /// Public key sent with sign-in and sign-up.
    pub anon_key: Zeroizing<String>,
    /// Privileged key for the admin user API.
    pub service_key: Zeroizing<String>,
}

/// [`IdentityProvider`] talking to `{base}/auth/v1`.
pub struct HttpIdentityProvider {
    client: Client,
    base: Url,
    keys: IdentityApiKeys,
}

impl HttpIdentityProvider {
    /// Build the adapter with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, keys: IdentityApiKeys, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            keys,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityProviderError> {
        self.base
            .join(path)
            .map_err(|err| IdentityProviderError::protocol(format!("bad endpoint {path}: {err}")))
    }

    fn public(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", self.keys.anon_key.as_str())
    }

    fn admin(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.keys.service_key.as_str())
            .bearer_auth(self.keys.service_key.as_str())
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    if error.is_decode() {
        IdentityProviderError::protocol(error.to_string())
    } else {
        IdentityProviderError::connection(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let parsed: ErrorBodyDto = serde_json::from_slice(body).unwrap_or_default();
    let text = parsed
        .text()
        .map_or_else(|| format!("status {}", status.as_u16()), str::to_owned);

    let taken = matches!(
        parsed.error_code.as_deref(),
        Some("user_already_exists" | "email_exists")
    ) || text.contains("already registered");
    match status {
        _ if taken => IdentityProviderError::email_taken(),
        StatusCode::BAD_REQUEST if parsed.error_code.as_deref() != Some("weak_password") => {
            IdentityProviderError::invalid_credentials()
        }
        StatusCode::TOO_MANY_REQUESTS => IdentityProviderError::rejected(text),
        _ if status.is_server_error() => IdentityProviderError::connection(text),
        _ => IdentityProviderError::rejected(text),
    }
}

async fn read_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Option<T>, IdentityProviderError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref())
        .map(Some)
        .map_err(|err| IdentityProviderError::protocol(format!("invalid auth payload: {err}")))
}

/// Send a request whose body is not needed. `false` means 404.
async fn expect_success(request: RequestBuilder) -> Result<bool, IdentityProviderError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !status.is_success() {
        let body = response.bytes().await.map_err(map_transport_error)?;
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(true)
}

fn into_profile(user: UserDto) -> Result<UserProfile, IdentityProviderError> {
    user.into_profile().map_err(IdentityProviderError::protocol)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<UserProfile, IdentityProviderError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self.public(self.client.post(url)).json(&PasswordGrantDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
        });

        let envelope: UserEnvelopeDto = read_json(request)
            .await?
            .ok_or_else(IdentityProviderError::invalid_credentials)?;
        into_profile(envelope.into_user())
    }

    async fn sign_up(&self, details: &SignUpDetails) -> Result<UserProfile, IdentityProviderError> {
        let url = self.endpoint("auth/v1/signup")?;
        let credentials = details.credentials();
        let request = self.public(self.client.post(url)).json(&SignUpDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
            data: SignUpMetadataDto {
                name: details.name(),
            },
        });

        let envelope: UserEnvelopeDto = read_json(request)
            .await?
            .ok_or_else(|| IdentityProviderError::protocol("sign-up endpoint missing"))?;
        into_profile(envelope.into_user())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, IdentityProviderError> {
        let url = self.endpoint(&format!("auth/v1/admin/users/{id}"))?;
        let user: Option<UserDto> = read_json(self.admin(self.client.get(url))).await?;
        user.map(into_profile).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserProfile>, IdentityProviderError> {
        // The admin API has no email filter; scan one large page.
        let mut url = self.endpoint("auth/v1/admin/users")?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("per_page", &ADMIN_PAGE_SIZE.to_string());
        let listing: Option<UserListDto> = read_json(self.admin(self.client.get(url))).await?;

        listing
            .map(|list| list.users)
            .unwrap_or_default()
            .into_iter()
            .find(|user| user.email.as_deref() == Some(email.as_ref()))
            .map(into_profile)
            .transpose()
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, IdentityProviderError> {
        let found = try_join_all(ids.iter().map(|id| self.find_user(id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<UserProfile, IdentityProviderError> {
        let url = self.endpoint(&format!("auth/v1/admin/users/{id}"))?;
        let request = self
            .admin(self.client.put(url))
            .json(&AdminUserUpdateDto::from(update));
        let user: UserDto = read_json(request)
            .await?
            .ok_or_else(IdentityProviderError::unknown_user)?;
        into_profile(user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityProviderError> {
        let url = self.endpoint(&format!("auth/v1/admin/users/{id}"))?;
        if expect_success(self.admin(self.client.delete(url))).await? {
            Ok(())
        } else {
            Err(IdentityProviderError::unknown_user())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://auth.example.com", "https://auth.example.com/auth/v1/signup")]
    #[case("https://example.com/supabase", "https://example.com/supabase/auth/v1/signup")]
    #[case("https://example.com/supabase/", "https://example.com/supabase/auth/v1/signup")]
    fn endpoints_hang_off_the_base_path(#[case] base: &str, #[case] expected: &str) {
        let keys = IdentityApiKeys {
            anon_key: Zeroizing::new("anon".to_owned()),
            service_key: Zeroizing::new("service".to_owned()),
        };
        let provider = HttpIdentityProvider::new(
            Url::parse(base).expect("valid url"),
            keys,
            Duration::from_secs(5),
        )
        .expect("client builds");

        let url = provider.endpoint("auth/v1/signup").expect("joins");

        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(
        StatusCode::BAD_REQUEST,
        r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        IdentityProviderError::invalid_credentials()
    )]
    #[case(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
        IdentityProviderError::email_taken()
    )]
    #[case(
        StatusCode::BAD_REQUEST,
        r#"{"msg":"User already registered"}"#,
        IdentityProviderError::email_taken()
    )]
    #[case(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"error_code":"weak_password","msg":"Password should be at least 8 characters"}"#,
        IdentityProviderError::rejected("Password should be at least 8 characters")
    )]
    #[case(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#,
        IdentityProviderError::email_taken()
    )]
    #[case(
        StatusCode::BAD_GATEWAY,
        "",
        IdentityProviderError::connection("status 502")
    )]
    fn statuses_map_to_provider_errors(
        #[case] status: StatusCode,
        #[case] body: &str,
        #[case] expected: IdentityProviderError,
    ) {
        assert_eq!(map_status_error(status, body.as_bytes()), expected);
    }
}
