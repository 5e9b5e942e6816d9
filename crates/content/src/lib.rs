//! Data-driven HTN content and loaders.
//!
//! This crate describes task libraries as data and provides loaders for
//! RON/TOML files:
//! - Domains: key schema, primitive tasks and compound tasks (RON)
//! - Runtime configuration: update budget, planner and executor tuning (TOML)
//!
//! Operators and state providers are code and stay with the collaborator;
//! domain files refer to them by name and are validated against them when
//! built.

pub mod spec;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use spec::DomainSpec;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, DomainLoader, LoadResult};
