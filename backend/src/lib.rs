//! orgdesk: a multi-tenant back office API.
//!
//! Layers follow a hexagonal split: [`domain`] holds entities, validation,
//! services, and ports; [`inbound`] adapts HTTP onto the driving ports;
//! [`outbound`] implements the driven ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
