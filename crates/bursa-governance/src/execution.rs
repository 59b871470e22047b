//! Effect dispatch for passed proposals.
//!
//! Each [`ProposalAction`] variant maps to a typed effect delivered to
//! one of three gateway traits. The engine owns exactly-once delivery;
//! this module owns the mapping and the collaborator seams.

use std::fmt;

use bursa_types::{AccountId, Amount};
use thiserror::Error;

use crate::error::GovernanceError;
use crate::proposal::{Proposal, ProposalAction, ScholarshipCriteria, TreasuryKind};

/// Failure reported by a gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// The collaborator could not be reached; the effect may be retried
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
    /// The collaborator refused the effect
    #[error("Gateway rejected effect: {0}")]
    Rejected(String),
}

impl From<EffectError> for GovernanceError {
    fn from(err: EffectError) -> Self {
        match err {
            EffectError::Unavailable(msg) => GovernanceError::Network(msg),
            EffectError::Rejected(msg) => GovernanceError::Internal(msg),
        }
    }
}

/// Funds released from a treasury pool.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEffect {
    pub proposal_id: u64,
    pub treasury: TreasuryKind,
    pub amount: Amount,
    pub recipient: Option<AccountId>,
    pub purpose: String,
}

/// A scholarship program to open.
#[derive(Debug, Clone, PartialEq)]
pub struct ScholarshipEffect {
    pub proposal_id: u64,
    pub name: String,
    pub amount: Amount,
    pub criteria: ScholarshipCriteria,
    pub max_recipients: u32,
}

/// A credit score override for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditAdjustmentEffect {
    pub proposal_id: u64,
    pub student: AccountId,
    pub current_score: u32,
    pub proposed_score: u32,
    pub justification: String,
}

/// A platform parameter update.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChangeEffect {
    pub proposal_id: u64,
    pub parameter: String,
    pub current_value: String,
    pub new_value: String,
}

/// A component upgrade to schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeEffect {
    pub proposal_id: u64,
    pub component: String,
    pub version: String,
    pub changes: Vec<String>,
}

/// An out-of-band emergency action.
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyEffect {
    pub proposal_id: u64,
    pub action: String,
    pub justification: String,
}

/// Receives treasury movements and scholarship programs.
pub trait TreasuryGateway {
    fn allocate(&mut self, effect: AllocationEffect) -> Result<(), EffectError>;
    fn create_scholarship(&mut self, effect: ScholarshipEffect) -> Result<(), EffectError>;
}

/// Receives credit score overrides.
pub trait CreditGateway {
    fn adjust_score(&mut self, effect: CreditAdjustmentEffect) -> Result<(), EffectError>;
}

/// Receives platform configuration and upgrade effects.
pub trait PlatformGateway {
    fn change_parameter(&mut self, effect: ParameterChangeEffect) -> Result<(), EffectError>;
    fn schedule_upgrade(&mut self, effect: UpgradeEffect) -> Result<(), EffectError>;
    fn emergency_action(&mut self, effect: EmergencyEffect) -> Result<(), EffectError>;
}

/// The gateway set the dispatcher delivers into.
pub struct Gateways {
    pub treasury: Box<dyn TreasuryGateway>,
    pub credit: Box<dyn CreditGateway>,
    pub platform: Box<dyn PlatformGateway>,
}

impl Gateways {
    /// Gateways that fail every effect as unavailable. Governance can
    /// run its full lifecycle against these; only execution fails, and
    /// it fails retryably.
    pub fn disconnected() -> Self {
        Self {
            treasury: Box::new(Disconnected),
            credit: Box::new(Disconnected),
            platform: Box::new(Disconnected),
        }
    }
}

impl Default for Gateways {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl fmt::Debug for Gateways {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateways").finish_non_exhaustive()
    }
}

/// Placeholder gateway used until real collaborators are wired in.
struct Disconnected;

impl TreasuryGateway for Disconnected {
    fn allocate(&mut self, _effect: AllocationEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "treasury gateway not wired".to_string(),
        ))
    }

    fn create_scholarship(&mut self, _effect: ScholarshipEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "treasury gateway not wired".to_string(),
        ))
    }
}

impl CreditGateway for Disconnected {
    fn adjust_score(&mut self, _effect: CreditAdjustmentEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "credit gateway not wired".to_string(),
        ))
    }
}

impl PlatformGateway for Disconnected {
    fn change_parameter(&mut self, _effect: ParameterChangeEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "platform gateway not wired".to_string(),
        ))
    }

    fn schedule_upgrade(&mut self, _effect: UpgradeEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "platform gateway not wired".to_string(),
        ))
    }

    fn emergency_action(&mut self, _effect: EmergencyEffect) -> Result<(), EffectError> {
        Err(EffectError::Unavailable(
            "platform gateway not wired".to_string(),
        ))
    }
}

/// Maps a passed proposal's action to its typed effect and delivers it.
#[derive(Debug)]
pub struct ExecutionDispatcher {
    gateways: Gateways,
}

impl ExecutionDispatcher {
    pub fn new(gateways: Gateways) -> Self {
        Self { gateways }
    }

    /// Deliver the proposal's effect. The match is exhaustive over
    /// [`ProposalAction`], so new actions cannot silently no-op.
    pub fn dispatch(&mut self, proposal: &Proposal) -> Result<(), EffectError> {
        match &proposal.action {
            ProposalAction::TreasuryAllocation {
                treasury,
                amount,
                recipient,
                purpose,
            } => self.gateways.treasury.allocate(AllocationEffect {
                proposal_id: proposal.id,
                treasury: *treasury,
                amount: *amount,
                recipient: *recipient,
                purpose: purpose.clone(),
            }),
            ProposalAction::ScholarshipCreation {
                name,
                amount,
                criteria,
                max_recipients,
            } => self.gateways.treasury.create_scholarship(ScholarshipEffect {
                proposal_id: proposal.id,
                name: name.clone(),
                amount: *amount,
                criteria: criteria.clone(),
                max_recipients: *max_recipients,
            }),
            ProposalAction::CreditScoreAdjustment {
                student,
                current_score,
                proposed_score,
                justification,
            } => self.gateways.credit.adjust_score(CreditAdjustmentEffect {
                proposal_id: proposal.id,
                student: *student,
                current_score: *current_score,
                proposed_score: *proposed_score,
                justification: justification.clone(),
            }),
            ProposalAction::ParameterChange {
                parameter,
                current_value,
                new_value,
            } => self.gateways.platform.change_parameter(ParameterChangeEffect {
                proposal_id: proposal.id,
                parameter: parameter.clone(),
                current_value: current_value.clone(),
                new_value: new_value.clone(),
            }),
            ProposalAction::PlatformUpgrade {
                component,
                version,
                changes,
            } => self.gateways.platform.schedule_upgrade(UpgradeEffect {
                proposal_id: proposal.id,
                component: component.clone(),
                version: version.clone(),
                changes: changes.clone(),
            }),
            ProposalAction::Emergency {
                action,
                justification,
            } => self.gateways.platform.emergency_action(EmergencyEffect {
                proposal_id: proposal.id,
                action: action.clone(),
                justification: justification.clone(),
            }),
        }
    }
}

impl Default for ExecutionDispatcher {
    fn default() -> Self {
        Self::new(Gateways::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::Proposal;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_account(n: u8) -> AccountId {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        AccountId::from_bytes(bytes)
    }

    fn proposal_with(action: ProposalAction) -> Proposal {
        Proposal::new(
            7,
            test_account(1),
            "T".to_string(),
            "D".to_string(),
            action,
            1_000,
            10_000,
            100,
        )
    }

    #[derive(Default)]
    struct Recording {
        allocations: Rc<RefCell<Vec<AllocationEffect>>>,
        scholarships: Rc<RefCell<Vec<ScholarshipEffect>>>,
    }

    impl TreasuryGateway for Recording {
        fn allocate(&mut self, effect: AllocationEffect) -> Result<(), EffectError> {
            self.allocations.borrow_mut().push(effect);
            Ok(())
        }

        fn create_scholarship(&mut self, effect: ScholarshipEffect) -> Result<(), EffectError> {
            self.scholarships.borrow_mut().push(effect);
            Ok(())
        }
    }

    #[test]
    fn test_allocation_routes_to_treasury() {
        let recording = Recording::default();
        let allocations = Rc::clone(&recording.allocations);

        let mut dispatcher = ExecutionDispatcher::new(Gateways {
            treasury: Box::new(recording),
            credit: Box::new(Disconnected),
            platform: Box::new(Disconnected),
        });

        let proposal = proposal_with(ProposalAction::TreasuryAllocation {
            treasury: TreasuryKind::Loan,
            amount: 2_500,
            recipient: Some(test_account(3)),
            purpose: "Loan pool top-up".to_string(),
        });
        dispatcher.dispatch(&proposal).unwrap();

        let seen = allocations.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].proposal_id, 7);
        assert_eq!(seen[0].treasury, TreasuryKind::Loan);
        assert_eq!(seen[0].amount, 2_500);
    }

    #[test]
    fn test_scholarship_routes_to_treasury() {
        let recording = Recording::default();
        let scholarships = Rc::clone(&recording.scholarships);

        let mut dispatcher = ExecutionDispatcher::new(Gateways {
            treasury: Box::new(recording),
            credit: Box::new(Disconnected),
            platform: Box::new(Disconnected),
        });

        let proposal = proposal_with(ProposalAction::ScholarshipCreation {
            name: "First Generation".to_string(),
            amount: 10_000,
            criteria: ScholarshipCriteria {
                min_gpa: 3.0,
                ..Default::default()
            },
            max_recipients: 25,
        });
        dispatcher.dispatch(&proposal).unwrap();

        let seen = scholarships.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "First Generation");
        assert_eq!(seen[0].max_recipients, 25);
    }

    #[test]
    fn test_disconnected_gateways_fail_retryably() {
        let mut dispatcher = ExecutionDispatcher::default();
        let proposal = proposal_with(ProposalAction::Emergency {
            action: "pause".to_string(),
            justification: "incident".to_string(),
        });

        let err = dispatcher.dispatch(&proposal).unwrap_err();
        assert!(matches!(err, EffectError::Unavailable(_)));

        let governance_err: GovernanceError = err.into();
        assert!(governance_err.is_retryable());
    }

    #[test]
    fn test_rejected_maps_to_internal() {
        let err: GovernanceError = EffectError::Rejected("over budget".to_string()).into();
        assert!(matches!(err, GovernanceError::Internal(_)));
        assert!(!err.is_retryable());
    }
}
