//! Organization invites.
//!
//! An invite is pending from creation until it is accepted, cancelled, or
//! found expired at accept time. All three outcomes delete the row, so a
//! stored invite is always pending.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Email, InviteId, OrgRole, OrganizationId, UnknownRole, UserId};

/// How long an invite stays valid.
pub const INVITE_TTL_DAYS: i64 = 7;
const TOKEN_BYTES: usize = 32;

/// Role an invitee may be granted. Ownership is never handed out by invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteRole {
    /// Grants [`OrgRole::Admin`].
    Admin,
    /// Grants [`OrgRole::Member`].
    Member,
    /// Grants [`OrgRole::Viewer`].
    Viewer,
}

impl From<InviteRole> for OrgRole {
    fn from(value: InviteRole) -> Self {
        match value {
            InviteRole::Admin => Self::Admin,
            InviteRole::Member => Self::Member,
            InviteRole::Viewer => Self::Viewer,
        }
    }
}

impl TryFrom<OrgRole> for InviteRole {
    type Error = UnknownRole;

    fn try_from(value: OrgRole) -> Result<Self, Self::Error> {
        match value {
            OrgRole::Admin => Ok(Self::Admin),
            OrgRole::Member => Ok(Self::Member),
            OrgRole::Viewer => Ok(Self::Viewer),
            OrgRole::Owner => Err(UnknownRole(value.as_str().to_owned())),
        }
    }
}

impl FromStr for InviteRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<OrgRole>().and_then(Self::try_from)
    }
}

impl fmt::Display for InviteRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OrgRole::from(*self).fmt(f)
    }
}

/// Opaque 256-bit invite token rendered as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InviteToken(String);

impl InviteToken {
    /// Draw a fresh token from `rng`.
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a token received from a link. Unknown tokens simply fail lookup.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InviteToken(..)")
    }
}

/// A pending invitation to join an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    /// Identifier.
    pub id: InviteId,
    /// Invited address.
    pub email: Email,
    /// Role granted on acceptance.
    pub role: InviteRole,
    /// Secret carried by the invite link.
    pub token: InviteToken,
    /// Organization being joined.
    pub org_id: OrganizationId,
    /// Member who sent the invite.
    pub inviter_id: UserId,
    /// Acceptance deadline.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Build a new invite that expires [`INVITE_TTL_DAYS`] after `now`.
    #[must_use]
    pub fn issue(
        org_id: OrganizationId,
        inviter_id: UserId,
        email: Email,
        role: InviteRole,
        token: InviteToken,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InviteId::random(),
            email,
            role,
            token,
            org_id,
            inviter_id,
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            created_at: now,
        }
    }

    /// Whether the invite can no longer be accepted at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Invite listing row with the inviter's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteView {
    /// The invite.
    pub invite: Invite,
    /// Inviter's name from the identity provider; empty when unknown.
    pub inviter_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    fn invite_at(now: DateTime<Utc>) -> Invite {
        let mut rng = StdRng::seed_from_u64(1);
        Invite::issue(
            OrganizationId::random(),
            UserId::random(),
            Email::new("new@example.com").expect("valid email"),
            InviteRole::Member,
            InviteToken::generate(&mut rng),
            now,
        )
    }

    #[rstest]
    fn tokens_are_64_hex_chars() {
        let mut rng = StdRng::seed_from_u64(42);
        let token = InviteToken::generate(&mut rng);
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[rstest]
    fn expires_seven_days_after_issue() {
        let now = Utc::now();
        let invite = invite_at(now);
        assert_eq!(invite.expires_at - invite.created_at, Duration::days(7));
        assert!(!invite.is_expired(now + Duration::days(7)));
        assert!(invite.is_expired(now + Duration::days(7) + Duration::seconds(1)));
    }

    #[rstest]
    fn owner_is_not_an_invite_role() {
        assert!("OWNER".parse::<InviteRole>().is_err());
        assert_eq!("ADMIN".parse::<InviteRole>(), Ok(InviteRole::Admin));
    }

    #[rstest]
    fn debug_output_hides_token() {
        let token = InviteToken::from_raw("secret");
        assert_eq!(format!("{token:?}"), "InviteToken(..)");
    }
}
