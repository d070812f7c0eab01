//! Shared Diesel error classification for the repositories.
//!
//! Each adapter turns a [`DieselFailure`] into its own port error; unique
//! violations carry the constraint name so adapters can tell a slug clash
//! from a duplicate membership.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Coarse outcome of a failed Diesel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection(&'static str),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// Anything else: bad query, missing row, foreign key failure.
    Query(&'static str),
}

impl DieselFailure {
    /// True when the unique violation came from `constraint`.
    pub(crate) fn violates(&self, constraint: &str) -> bool {
        matches!(
            self,
            Self::UniqueViolation { constraint: Some(name) } if name == constraint
        )
    }
}

/// Classify a Diesel error, logging the raw details at debug level.
pub(crate) fn classify_diesel_error(error: diesel::result::Error) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            DieselFailure::Query("referenced row missing")
        }
        _ => DieselFailure::Query("database error"),
    }
}

/// Message carried by a pool failure.
pub(crate) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Info(Option<&'static str>);

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.0
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info(constraint)))
    }

    #[rstest]
    fn unique_violation_keeps_constraint_name() {
        let failure = classify_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some("organizations_slug_key"),
        ));

        assert!(failure.violates("organizations_slug_key"));
        assert!(!failure.violates("memberships_pkey"));
    }

    #[rstest]
    #[case(DieselError::NotFound, DieselFailure::Query("record not found"))]
    #[case(
        database_error(DatabaseErrorKind::ClosedConnection, None),
        DieselFailure::Connection("database connection error")
    )]
    #[case(
        database_error(DatabaseErrorKind::ForeignKeyViolation, None),
        DieselFailure::Query("referenced row missing")
    )]
    fn other_failures_are_classified(#[case] error: DieselError, #[case] expected: DieselFailure) {
        assert_eq!(classify_diesel_error(error), expected);
    }

    #[rstest]
    fn pool_failures_keep_their_message() {
        assert_eq!(
            pool_error_message(PoolError::checkout("timed out")),
            "timed out"
        );
    }
}
