//! Strongly typed identifiers for domain aggregates.
//!
//! Every aggregate is keyed by a UUID. Wrapping each one in its own newtype
//! stops a note id from being passed where a campaign id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a user held by the identity provider.
    UserId
);
define_id!(
    /// Identifier of an organization.
    OrganizationId
);
define_id!(
    /// Identifier of a pending invite.
    InviteId
);
define_id!(
    /// Identifier of a note.
    NoteId
);
define_id!(
    /// Identifier of a comment on a note.
    CommentId
);
define_id!(
    /// Identifier of a campaign.
    CampaignId
);
define_id!(
    /// Identifier of a campaign form field.
    FieldId
);
define_id!(
    /// Identifier of a public campaign submission.
    SubmissionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_uuid() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id: NoteId = raw.parse().expect("valid uuid");
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("not-a-uuid".parse::<CampaignId>().is_err());
    }

    #[test]
    fn serialises_as_bare_string() {
        let id = OrganizationId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
