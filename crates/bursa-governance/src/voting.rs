//! Vote records and per-proposal vote books.

use std::collections::BTreeMap;

use bursa_types::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    /// In favor
    For,
    /// Opposed
    Against,
    /// Counts toward quorum but not the majority test
    Abstain,
}

/// A recorded vote. At most one exists per (voter, proposal); casting
/// again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Proposal voted on
    pub proposal_id: u64,
    /// Voting account
    pub voter: AccountId,
    /// Ballot choice
    pub choice: VoteChoice,
    /// Effective voting power at cast time
    pub voting_power: Amount,
    /// When the vote was cast, or last replaced
    pub cast_at: Timestamp,
    /// Sole delegator backing this voter at cast time, if exactly one.
    /// Audit trail only; tallies never read it.
    pub delegated_from: Option<AccountId>,
}

/// Vote storage across proposals.
///
/// Ordered maps keep listings deterministic: votes iterate in voter
/// order within a proposal, and histories in proposal order.
#[derive(Debug, Clone, Default)]
pub struct VoteBook {
    by_proposal: BTreeMap<u64, BTreeMap<AccountId, Vote>>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote, returning the vote it replaced, if any.
    pub fn record(&mut self, vote: Vote) -> Option<Vote> {
        self.by_proposal
            .entry(vote.proposal_id)
            .or_default()
            .insert(vote.voter, vote)
    }

    /// A voter's current vote on a proposal.
    pub fn get(&self, proposal_id: u64, voter: &AccountId) -> Option<&Vote> {
        self.by_proposal.get(&proposal_id).and_then(|m| m.get(voter))
    }

    /// All votes on a proposal, in voter order.
    pub fn for_proposal(&self, proposal_id: u64) -> Vec<&Vote> {
        self.by_proposal
            .get(&proposal_id)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    /// Every vote an account currently holds, oldest proposal first.
    pub fn by_voter(&self, voter: &AccountId) -> Vec<&Vote> {
        self.by_proposal
            .values()
            .filter_map(|m| m.get(voter))
            .collect()
    }

    /// Number of votes recorded on one proposal.
    pub fn count_for(&self, proposal_id: u64) -> usize {
        self.by_proposal
            .get(&proposal_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Total votes currently recorded across all proposals.
    pub fn total_votes(&self) -> usize {
        self.by_proposal.values().map(|m| m.len()).sum()
    }
}
