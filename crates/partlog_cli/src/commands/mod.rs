//! CLI command implementations.

pub mod inspect;
pub mod session;
