//! Middleware wrapped around every route.

pub mod trace;

pub use trace::Trace;
