//! Identity provider adapters.
//!
//! `HttpIdentityProvider` fronts a GoTrue-compatible auth service;
//! `InMemoryIdentityProvider` backs local development and tests.

mod dto;
mod http_provider;
mod memory;

pub use http_provider::{HttpIdentityProvider, IdentityApiKeys};
pub use memory::InMemoryIdentityProvider;
