//! Request validation helpers shared by the handlers.
//!
//! Every rejection becomes `invalid_request` with `{"field", "code"}`
//! details so clients can point at the offending input.

use std::fmt::Display;
use std::str::FromStr;

use serde_json::json;

use crate::domain::{
    AuthValidationError, CampaignValidationError, EmailValidationError, Error,
    NoteValidationError, OrganizationValidationError, PasswordChangeError,
};

/// Detail codes attached to validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidId,
    InvalidValue,
    InvalidField,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::InvalidValue => "invalid_value",
            Self::InvalidField => "invalid_field",
        }
    }
}

/// Name of a request field as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

fn rejection(field: &str, code: ValidationCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

/// Domain validation errors that know which request field they concern.
pub(crate) trait FieldError: Display {
    fn field(&self) -> &'static str;
}

impl FieldError for AuthValidationError {
    fn field(&self) -> &'static str {
        Self::field(self)
    }
}

impl FieldError for PasswordChangeError {
    fn field(&self) -> &'static str {
        Self::field(self)
    }
}

impl FieldError for NoteValidationError {
    fn field(&self) -> &'static str {
        Self::field(self)
    }
}

impl FieldError for CampaignValidationError {
    fn field(&self) -> &'static str {
        Self::field(self)
    }
}

impl FieldError for OrganizationValidationError {
    fn field(&self) -> &'static str {
        "name"
    }
}

impl FieldError for EmailValidationError {
    fn field(&self) -> &'static str {
        "email"
    }
}

/// Turn a domain validation failure into an HTTP-facing error.
pub(crate) fn reject<E: FieldError>(error: E) -> Error {
    rejection(error.field(), ValidationCode::InvalidField, error.to_string())
}

/// Parse an identifier from a path segment or payload.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: FieldName) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| rejection(field.0, ValidationCode::InvalidId, format!("{} must be a valid UUID", field.0)))
}

/// Parse a list of identifiers, reporting the first bad index.
pub(crate) fn parse_id_list<T: FromStr>(raw: &[String], field: FieldName) -> Result<Vec<T>, Error> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            value.parse().map_err(|_| {
                Error::invalid_request(format!("{} must contain valid UUIDs", field.0)).with_details(
                    json!({
                        "field": field.0,
                        "index": index,
                        "code": ValidationCode::InvalidId.as_str(),
                    }),
                )
            })
        })
        .collect()
}

/// Parse an enumerated value such as a role or status.
pub(crate) fn parse_value<T>(raw: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|err: T::Err| rejection(field.0, ValidationCode::InvalidValue, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, NoteDraft, OrgRole, OrganizationId, OrganizationName};
    use rstest::rstest;

    #[rstest]
    fn domain_failures_name_their_field() {
        let err = NoteDraft::new("   ", "body").map_err(reject).expect_err("blank title");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details(), Some(&json!({ "field": "title", "code": "invalid_field" })));
    }

    #[rstest]
    fn organization_failures_point_at_name() {
        let err = OrganizationName::new("a").map_err(reject).expect_err("too short");

        assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!("name")));
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    fn bad_ids_are_rejected(#[case] raw: &str) {
        let err = parse_id::<OrganizationId>(raw, FieldName::new("orgId")).expect_err("bad id");

        assert_eq!(err.details().and_then(|d| d.get("code")), Some(&json!("invalid_id")));
    }

    #[rstest]
    fn list_errors_report_the_index() {
        let raw = vec![
            "7d1a9a52-4c1e-4b8f-9f0e-5d2c8f1b3a44".to_owned(),
            "nope".to_owned(),
        ];

        let err = parse_id_list::<OrganizationId>(&raw, FieldName::new("fieldIds")).expect_err("bad entry");

        assert_eq!(err.details().and_then(|d| d.get("index")), Some(&json!(1)));
    }

    #[rstest]
    #[case("ADMIN", Some(OrgRole::Admin))]
    #[case("SUPERUSER", None)]
    fn enumerated_values(#[case] raw: &str, #[case] expected: Option<OrgRole>) {
        let parsed = parse_value::<OrgRole>(raw, FieldName::new("role")).ok();

        assert_eq!(parsed, expected);
    }
}
