//! Proposal records and lifecycle state machine.
//!
//! Proposals go through states: Active -> Passed/Rejected/Expired/Cancelled,
//! and Passed -> Executed once the execution delay elapses.

use std::collections::HashMap;

use bursa_types::{units::SECS_PER_DAY, AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};
use crate::voting::VoteChoice;

/// Proposal status in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Voting is open, subject to the voting window
    Active,
    /// Quorum met and more weight for than against
    Passed,
    /// Quorum met but the majority test failed; ties fail
    Rejected,
    /// Voting closed without reaching quorum
    Expired,
    /// Withdrawn while still active
    Cancelled,
    /// Effect delivered to its collaborator
    Executed,
}

impl ProposalStatus {
    /// Whether votes can still be accepted.
    pub fn can_vote(&self) -> bool {
        matches!(self, ProposalStatus::Active)
    }

    /// Whether the proposal finished with a positive tally.
    pub fn is_passed(&self) -> bool {
        matches!(self, ProposalStatus::Passed)
    }

    /// Whether this is an end state no tally or execution can leave.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Active | ProposalStatus::Passed)
    }
}

/// Treasury pool targeted by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreasuryKind {
    Loan,
    Scholarship,
    Protocol,
}

/// Eligibility requirements attached to a scholarship program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScholarshipCriteria {
    pub min_gpa: f64,
    pub required_programs: Vec<String>,
    pub geographic_restrictions: Vec<String>,
    pub other_requirements: Vec<String>,
}

/// What a proposal does when executed. A closed union: the dispatcher
/// matches exhaustively, so adding a variant is a compile-time event
/// for every collaborator seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProposalAction {
    /// Create a scholarship program
    ScholarshipCreation {
        name: String,
        amount: Amount,
        criteria: ScholarshipCriteria,
        max_recipients: u32,
    },
    /// Upgrade a platform component
    PlatformUpgrade {
        component: String,
        version: String,
        changes: Vec<String>,
    },
    /// Move funds out of a treasury pool
    TreasuryAllocation {
        treasury: TreasuryKind,
        amount: Amount,
        recipient: Option<AccountId>,
        purpose: String,
    },
    /// Change a platform parameter
    ParameterChange {
        parameter: String,
        current_value: String,
        new_value: String,
    },
    /// Override a student's credit score
    CreditScoreAdjustment {
        student: AccountId,
        current_score: u32,
        proposed_score: u32,
        justification: String,
    },
    /// Emergency action taken outside normal processes
    Emergency {
        action: String,
        justification: String,
    },
}

impl ProposalAction {
    /// Quorum requirement in basis points of the voting power snapshot.
    /// More sensitive actions need broader participation.
    pub fn quorum_bps(&self) -> u16 {
        match self {
            ProposalAction::Emergency { .. } => 7_500,
            ProposalAction::PlatformUpgrade { .. } => 6_600,
            ProposalAction::TreasuryAllocation { .. } => 5_100,
            ProposalAction::ParameterChange { .. } => 5_100,
            ProposalAction::ScholarshipCreation { .. } => 3_300,
            ProposalAction::CreditScoreAdjustment { .. } => 3_300,
        }
    }

    /// Seconds between passing and earliest execution. Emergencies
    /// execute as soon as they pass.
    pub fn execution_delay(&self) -> u64 {
        match self {
            ProposalAction::Emergency { .. } => 0,
            _ => SECS_PER_DAY,
        }
    }

    /// Quorum in absolute voting power for a given snapshot, rounded
    /// up so it is never zero while any power exists.
    pub fn quorum_for(&self, total_voting_power: Amount) -> Amount {
        let product = total_voting_power as u128 * self.quorum_bps() as u128;
        ((product + 9_999) / 10_000) as Amount
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ProposalAction::ScholarshipCreation { .. } => "scholarship-creation",
            ProposalAction::PlatformUpgrade { .. } => "platform-upgrade",
            ProposalAction::TreasuryAllocation { .. } => "treasury-allocation",
            ProposalAction::ParameterChange { .. } => "parameter-change",
            ProposalAction::CreditScoreAdjustment { .. } => "credit-score-adjustment",
            ProposalAction::Emergency { .. } => "emergency",
        }
    }
}

/// A governance proposal. Never deleted; terminal records stay in the
/// store for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique id, assigned by the store
    pub id: u64,
    /// Account that created the proposal
    pub proposer: AccountId,
    /// Short human-readable title
    pub title: String,
    /// Full description
    pub description: String,
    /// What execution does
    pub action: ProposalAction,
    /// Current lifecycle status
    pub status: ProposalStatus,
    /// Voting window start (inclusive)
    pub voting_starts_at: Timestamp,
    /// Voting window end (exclusive)
    pub voting_ends_at: Timestamp,
    /// Seconds between passing and earliest execution
    pub execution_delay: u64,
    /// Participation required for the tally to count
    pub quorum_required: Amount,
    /// Weighted tally in favor
    pub votes_for: Amount,
    /// Weighted tally against
    pub votes_against: Amount,
    /// Weighted abstentions
    pub votes_abstain: Amount,
    /// Network-wide voting power snapshot at creation; quorum denominator
    pub total_voting_power: Amount,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
    /// When the tally outcome (Passed/Rejected/Expired) was entered
    pub finalized_at: Option<Timestamp>,
    /// When the effect was delivered
    pub executed_at: Option<Timestamp>,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        proposer: AccountId,
        title: String,
        description: String,
        action: ProposalAction,
        voting_period: u64,
        total_voting_power: Amount,
        now: Timestamp,
    ) -> Self {
        let quorum_required = action.quorum_for(total_voting_power);
        let execution_delay = action.execution_delay();

        Self {
            id,
            proposer,
            title,
            description,
            action,
            status: ProposalStatus::Active,
            voting_starts_at: now,
            voting_ends_at: now + voting_period,
            execution_delay,
            quorum_required,
            votes_for: 0,
            votes_against: 0,
            votes_abstain: 0,
            total_voting_power,
            created_at: now,
            updated_at: now,
            finalized_at: None,
            executed_at: None,
        }
    }

    /// Whether votes are accepted at `now`. The window is half-open:
    /// open at the start instant, closed at the end instant.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        self.status.can_vote() && now >= self.voting_starts_at && now < self.voting_ends_at
    }

    /// Total weight cast across all buckets.
    pub fn votes_total(&self) -> Amount {
        self.votes_for + self.votes_against + self.votes_abstain
    }

    /// Add a vote's weight to its bucket.
    pub(crate) fn apply_vote(&mut self, choice: VoteChoice, weight: Amount, now: Timestamp) {
        match choice {
            VoteChoice::For => self.votes_for = self.votes_for.saturating_add(weight),
            VoteChoice::Against => self.votes_against = self.votes_against.saturating_add(weight),
            VoteChoice::Abstain => self.votes_abstain = self.votes_abstain.saturating_add(weight),
        }
        self.updated_at = now;
    }

    /// Remove a previously applied weight from its bucket. Used when a
    /// voter replaces their vote.
    pub(crate) fn retract_vote(&mut self, choice: VoteChoice, weight: Amount, now: Timestamp) {
        match choice {
            VoteChoice::For => self.votes_for = self.votes_for.saturating_sub(weight),
            VoteChoice::Against => self.votes_against = self.votes_against.saturating_sub(weight),
            VoteChoice::Abstain => self.votes_abstain = self.votes_abstain.saturating_sub(weight),
        }
        self.updated_at = now;
    }

    /// Settle the tally once the voting window has closed.
    ///
    /// Idempotent: a proposal that already left Active is returned
    /// unchanged. Quorum counts every bucket, abstentions included;
    /// the majority test is strict, so ties are rejected.
    pub fn finalize(&mut self, now: Timestamp) -> GovernanceResult<ProposalStatus> {
        if self.status != ProposalStatus::Active {
            return Ok(self.status);
        }
        if now < self.voting_ends_at {
            return Err(GovernanceError::InvalidInput(format!(
                "proposal {} voting is open until {}",
                self.id, self.voting_ends_at
            )));
        }

        self.status = if self.votes_total() < self.quorum_required {
            ProposalStatus::Expired
        } else if self.votes_for > self.votes_against {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Rejected
        };
        self.finalized_at = Some(now);
        self.updated_at = now;
        Ok(self.status)
    }

    /// Earliest instant execution is allowed, once passed.
    pub fn executable_at(&self) -> Option<Timestamp> {
        match (self.status, self.finalized_at) {
            (ProposalStatus::Passed, Some(at)) => Some(at + self.execution_delay),
            _ => None,
        }
    }

    /// Whether the proposal may execute at `now`.
    pub fn can_execute(&self, now: Timestamp) -> bool {
        self.executable_at().map(|at| now >= at).unwrap_or(false)
    }

    pub(crate) fn mark_executed(&mut self, now: Timestamp) {
        self.status = ProposalStatus::Executed;
        self.executed_at = Some(now);
        self.updated_at = now;
    }

    /// Withdraw an active proposal. Caller authorization is the
    /// engine's concern.
    pub fn cancel(&mut self, now: Timestamp) -> GovernanceResult<()> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::InvalidInput(format!(
                "proposal {} is {:?}, only active proposals can be cancelled",
                self.id, self.status
            )));
        }
        self.status = ProposalStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }
}

/// Registry of all proposals.
#[derive(Debug, Clone)]
pub struct ProposalStore {
    proposals: HashMap<u64, Proposal>,
    next_id: u64,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a proposal, assigning the next id.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        proposer: AccountId,
        title: String,
        description: String,
        action: ProposalAction,
        voting_period: u64,
        total_voting_power: Amount,
        now: Timestamp,
    ) -> Proposal {
        let id = self.next_id;
        self.next_id += 1;

        let proposal = Proposal::new(
            id,
            proposer,
            title,
            description,
            action,
            voting_period,
            total_voting_power,
            now,
        );
        self.proposals.insert(id, proposal.clone());
        proposal
    }

    pub fn get(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }

    /// All proposals, ordered by id.
    pub fn all(&self) -> Vec<&Proposal> {
        let mut all: Vec<&Proposal> = self.proposals.values().collect();
        all.sort_by_key(|p| p.id);
        all
    }

    /// Proposals in a given status, ordered by id.
    pub fn by_status(&self, status: ProposalStatus) -> Vec<&Proposal> {
        let mut matching: Vec<&Proposal> = self
            .proposals
            .values()
            .filter(|p| p.status == status)
            .collect();
        matching.sort_by_key(|p| p.id);
        matching
    }

    /// Proposals still accepting votes.
    pub fn active(&self) -> Vec<&Proposal> {
        self.by_status(ProposalStatus::Active)
    }

    /// Ids of active proposals whose voting window has closed at `now`.
    pub fn due_for_finalize(&self, now: Timestamp) -> Vec<u64> {
        let mut due: Vec<u64> = self
            .proposals
            .values()
            .filter(|p| p.status == ProposalStatus::Active && now >= p.voting_ends_at)
            .map(|p| p.id)
            .collect();
        due.sort_unstable();
        due
    }

    pub fn count(&self) -> usize {
        self.proposals.len()
    }
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}
