//! Bursa Governance - token-weighted community governance.
//!
//! This crate provides:
//! - Amount-scoped, expiring vote delegation
//! - Proposal lifecycle management
//! - Weighted voting with vote replacement
//! - Typed execution of passed proposals
//! - The [`GovernanceEngine`] facade tying the pieces together

pub mod delegation;
pub mod engine;
pub mod error;
pub mod execution;
pub mod proposal;
pub mod voting;

pub use delegation::{DelegationEdge, DelegationGraph};
pub use engine::{GovernanceEngine, GovernanceStats, IdentityResolver};
pub use error::{GovernanceError, GovernanceResult};
pub use execution::{
    AllocationEffect, CreditAdjustmentEffect, CreditGateway, EffectError, EmergencyEffect,
    ExecutionDispatcher, Gateways, ParameterChangeEffect, PlatformGateway, ScholarshipEffect,
    TreasuryGateway, UpgradeEffect,
};
pub use proposal::{
    Proposal, ProposalAction, ProposalStatus, ProposalStore, ScholarshipCriteria, TreasuryKind,
};
pub use voting::{Vote, VoteBook, VoteChoice};
