//! Bursa Types - Core type definitions for the Bursa governance engine.
//!
//! This crate provides the fundamental types used throughout Bursa:
//! - Account identifiers (32-byte, Bech32m encoded)
//! - Token amounts and timestamps
//! - Stakeholder classification
//! - Governance configuration
//! - The shared error taxonomy

pub mod account;
pub mod config;
pub mod error;
pub mod units;

#[cfg(feature = "serde")]
mod serialization;

pub use account::{AccountId, StakeholderKind};
pub use config::GovernanceConfig;
pub use error::{GovernanceError, GovernanceResult};
pub use units::{Amount, Timestamp};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AccountId, Amount, GovernanceConfig, GovernanceError, GovernanceResult, StakeholderKind,
        Timestamp,
    };
}
