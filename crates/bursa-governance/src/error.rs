//! Errors raised by governance operations.
//!
//! The engine shares the platform-wide taxonomy from `bursa-types`, so
//! a host maps every failure the same way no matter which component
//! raised it.

pub use bursa_types::{GovernanceError, GovernanceResult};
