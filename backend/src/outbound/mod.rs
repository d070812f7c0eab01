//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **memory**: in-process store for development and tests
//! - **identity**: identity provider clients
//! - **mailer**: invite delivery
//!
//! Adapters translate between domain types and infrastructure
//! representations. They hold no business rules.

pub mod identity;
pub mod mailer;
pub mod memory;
pub mod persistence;
