//! The governance engine: one facade over the ledger, the delegation
//! graph, the proposal store, the vote book, and effect dispatch.
//!
//! Every time-dependent operation takes `now` explicitly; the engine
//! never reads a clock. Callers own time, which keeps replay and tests
//! deterministic.

use std::fmt;

use bursa_ledger::{TokenHolding, TokenLedger, TokenSource};
use bursa_types::{AccountId, Amount, GovernanceConfig, StakeholderKind, Timestamp};
use serde::{Deserialize, Serialize};

use crate::delegation::{DelegationEdge, DelegationGraph};
use crate::error::{GovernanceError, GovernanceResult};
use crate::execution::{ExecutionDispatcher, Gateways};
use crate::proposal::{Proposal, ProposalAction, ProposalStatus, ProposalStore};
use crate::voting::{Vote, VoteBook, VoteChoice};

/// Maps an external caller credential (a session token, a DID, a key
/// fingerprint) to an account.
pub trait IdentityResolver {
    fn resolve(&self, credential: &str) -> GovernanceResult<AccountId>;
}

/// Aggregate counters for dashboards and operators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GovernanceStats {
    pub total_proposals: usize,
    pub active_proposals: usize,
    pub passed_proposals: usize,
    pub rejected_proposals: usize,
    pub expired_proposals: usize,
    pub cancelled_proposals: usize,
    pub executed_proposals: usize,
    pub total_votes_cast: usize,
    /// Network-wide voting base at the query instant
    pub total_voting_power: Amount,
    pub total_token_holders: usize,
    pub total_tokens_issued: Amount,
    pub total_tokens_locked: Amount,
}

/// Token-weighted governance over scholarships, loans, credit scores,
/// and platform parameters.
pub struct GovernanceEngine {
    config: GovernanceConfig,
    ledger: TokenLedger,
    delegations: DelegationGraph,
    proposals: ProposalStore,
    votes: VoteBook,
    dispatcher: ExecutionDispatcher,
    resolver: Option<Box<dyn IdentityResolver>>,
}

impl GovernanceEngine {
    /// Engine with disconnected gateways. Everything up to execution
    /// works; execution fails retryably until gateways are wired.
    pub fn new(config: GovernanceConfig) -> Self {
        Self::with_gateways(config, Gateways::disconnected())
    }

    pub fn with_gateways(config: GovernanceConfig, gateways: Gateways) -> Self {
        Self {
            config,
            ledger: TokenLedger::new(),
            delegations: DelegationGraph::new(),
            proposals: ProposalStore::new(),
            votes: VoteBook::new(),
            dispatcher: ExecutionDispatcher::new(gateways),
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    // ---- tokens ----

    /// Issue tokens to a stakeholder.
    pub fn issue_tokens(
        &mut self,
        account: AccountId,
        amount: Amount,
        source: TokenSource,
        kind: StakeholderKind,
        now: Timestamp,
    ) -> GovernanceResult<TokenHolding> {
        self.ledger.issue(account, amount, source, kind, now)
    }

    /// Lock part of a holding until a deadline.
    pub fn lock_tokens(
        &mut self,
        account: AccountId,
        amount: Amount,
        until: Timestamp,
        now: Timestamp,
    ) -> GovernanceResult<TokenHolding> {
        self.ledger.lock(account, amount, until, now)
    }

    pub fn token_holding(&self, account: &AccountId) -> Option<&TokenHolding> {
        self.ledger.holding(account)
    }

    // ---- delegation ----

    /// Delegate voting power. `amount` of `None` grants the entire
    /// voting base; a prior grant is replaced.
    pub fn delegate_voting_power(
        &mut self,
        delegator: AccountId,
        delegate: AccountId,
        amount: Option<Amount>,
        expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> GovernanceResult<DelegationEdge> {
        self.delegations.delegate(
            &self.ledger,
            &self.config,
            delegator,
            delegate,
            amount,
            expires_at,
            now,
        )
    }

    /// Remove the caller's current delegation. Power reverts at once.
    pub fn remove_delegation(
        &mut self,
        delegator: &AccountId,
        now: Timestamp,
    ) -> GovernanceResult<DelegationEdge> {
        self.delegations.remove(delegator, now)
    }

    /// Voting power at `now`: own unlocked base, minus outbound grants,
    /// plus inbound grants.
    pub fn get_effective_voting_power(&self, account: &AccountId, now: Timestamp) -> Amount {
        self.delegations
            .effective_voting_power(&self.ledger, &self.config, account, now)
    }

    /// Every delegation an account has made, current first.
    pub fn delegations_from(&self, delegator: &AccountId) -> Vec<&DelegationEdge> {
        self.delegations.edges_from(delegator)
    }

    /// Active delegations granting power to an account at `now`.
    pub fn delegations_to(&self, delegate: &AccountId, now: Timestamp) -> Vec<&DelegationEdge> {
        self.delegations.inbound_edges(delegate, now)
    }

    // ---- proposals ----

    /// Create a proposal. The proposer needs `min_proposal_power`
    /// effective voting power; the quorum denominator snapshots the
    /// network-wide voting base at this instant.
    pub fn create_proposal(
        &mut self,
        proposer: AccountId,
        title: String,
        description: String,
        action: ProposalAction,
        voting_period: Option<u64>,
        now: Timestamp,
    ) -> GovernanceResult<Proposal> {
        if title.trim().is_empty() {
            return Err(GovernanceError::InvalidInput(
                "proposal title cannot be empty".to_string(),
            ));
        }
        if title.len() > self.config.max_title_len {
            return Err(GovernanceError::InvalidInput(format!(
                "title exceeds {} characters",
                self.config.max_title_len
            )));
        }
        if description.len() > self.config.max_description_len {
            return Err(GovernanceError::InvalidInput(format!(
                "description exceeds {} characters",
                self.config.max_description_len
            )));
        }

        let power = self.get_effective_voting_power(&proposer, now);
        if power < self.config.min_proposal_power {
            return Err(GovernanceError::Unauthorized(format!(
                "requires {} voting power to propose, {} available",
                self.config.min_proposal_power, power
            )));
        }

        let period = self.config.clamp_voting_period(voting_period);
        let snapshot = self.ledger.total_voting_base(&self.config, now);
        let proposal = self
            .proposals
            .create(proposer, title, description, action, period, snapshot, now);

        tracing::info!(
            "proposal #{} created ({}, quorum {} of {})",
            proposal.id,
            proposal.action.label(),
            proposal.quorum_required,
            proposal.total_voting_power
        );
        Ok(proposal)
    }

    /// Cast or replace a vote. A voter has one vote per proposal; a
    /// re-vote pulls the prior weight out of its bucket first. Weight
    /// is the voter's effective power at cast time.
    pub fn vote_on_proposal(
        &mut self,
        voter: AccountId,
        proposal_id: u64,
        choice: VoteChoice,
        now: Timestamp,
    ) -> GovernanceResult<Vote> {
        let power = self.get_effective_voting_power(&voter, now);
        let delegated_from = self.delegations.sole_delegator(&voter, now);

        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("proposal {}", proposal_id)))?;

        if !proposal.voting_open(now) {
            return Err(GovernanceError::InvalidInput(format!(
                "proposal {} is not accepting votes",
                proposal_id
            )));
        }
        if power == 0 {
            return Err(GovernanceError::Unauthorized(format!(
                "{} has no voting power",
                voter
            )));
        }

        if let Some(prior) = self.votes.get(proposal_id, &voter) {
            proposal.retract_vote(prior.choice, prior.voting_power, now);
        }
        proposal.apply_vote(choice, power, now);

        let vote = Vote {
            proposal_id,
            voter,
            choice,
            voting_power: power,
            cast_at: now,
            delegated_from,
        };
        let replaced = self.votes.record(vote.clone());

        tracing::debug!(
            "{} voted {:?} on proposal #{} with {} power{}",
            voter,
            choice,
            proposal_id,
            power,
            if replaced.is_some() { " (replaced)" } else { "" }
        );
        Ok(vote)
    }

    /// Settle one proposal's tally if its window has closed.
    pub fn process_proposal(
        &mut self,
        proposal_id: u64,
        now: Timestamp,
    ) -> GovernanceResult<ProposalStatus> {
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("proposal {}", proposal_id)))?;

        let before = proposal.status;
        let status = proposal.finalize(now)?;
        if status != before {
            tracing::info!(
                "proposal #{} finalized as {:?} ({} for, {} against, {} abstain)",
                proposal_id,
                status,
                proposal.votes_for,
                proposal.votes_against,
                proposal.votes_abstain
            );
        }
        Ok(status)
    }

    /// Deliver a passed proposal's effect, exactly once.
    ///
    /// Executing an already-executed proposal is a no-op returning the
    /// record. A gateway failure leaves the proposal Passed so the call
    /// can be retried.
    pub fn execute_proposal(
        &mut self,
        proposal_id: u64,
        now: Timestamp,
    ) -> GovernanceResult<Proposal> {
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("proposal {}", proposal_id)))?;

        if proposal.status == ProposalStatus::Executed {
            return Ok(proposal.clone());
        }
        if proposal.status != ProposalStatus::Passed {
            return Err(GovernanceError::Unauthorized(format!(
                "proposal {} is {:?}, only passed proposals execute",
                proposal_id, proposal.status
            )));
        }
        if !proposal.can_execute(now) {
            return Err(GovernanceError::InvalidInput(format!(
                "proposal {} is in its execution delay until {}",
                proposal_id,
                proposal.executable_at().unwrap_or(0)
            )));
        }

        self.dispatcher.dispatch(proposal)?;
        proposal.mark_executed(now);

        tracing::info!(
            "proposal #{} executed ({})",
            proposal_id,
            proposal.action.label()
        );
        Ok(proposal.clone())
    }

    /// Withdraw an active proposal. Only the proposer or an admin may.
    pub fn cancel_proposal(
        &mut self,
        caller: AccountId,
        proposal_id: u64,
        now: Timestamp,
    ) -> GovernanceResult<()> {
        let caller_is_admin = self.config.is_admin(&caller);
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("proposal {}", proposal_id)))?;

        if proposal.proposer != caller && !caller_is_admin {
            return Err(GovernanceError::Unauthorized(format!(
                "{} may not cancel proposal {}",
                caller, proposal_id
            )));
        }
        proposal.cancel(now)?;

        tracing::info!("proposal #{} cancelled by {}", proposal_id, caller);
        Ok(())
    }

    pub fn get_proposal(&self, proposal_id: u64) -> GovernanceResult<&Proposal> {
        self.proposals
            .get(proposal_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("proposal {}", proposal_id)))
    }

    pub fn get_active_proposals(&self) -> Vec<&Proposal> {
        self.proposals.active()
    }

    pub fn get_proposals_by_status(&self, status: ProposalStatus) -> Vec<&Proposal> {
        self.proposals.by_status(status)
    }

    pub fn all_proposals(&self) -> Vec<&Proposal> {
        self.proposals.all()
    }

    /// Votes on a proposal, in voter order.
    pub fn get_proposal_votes(&self, proposal_id: u64) -> Vec<&Vote> {
        self.votes.for_proposal(proposal_id)
    }

    /// Every current vote an account holds, in proposal order.
    pub fn voter_history(&self, voter: &AccountId) -> Vec<&Vote> {
        self.votes.by_voter(voter)
    }

    // ---- housekeeping ----

    /// Settle every proposal whose window has closed and archive
    /// expired delegations. Returns the ids finalized. Meant to run on
    /// a timer or before reads that need settled tallies.
    pub fn finalize_due(&mut self, now: Timestamp) -> Vec<u64> {
        let compacted = self.delegations.compact(now);
        if compacted > 0 {
            tracing::debug!("archived {} expired delegations", compacted);
        }

        let mut finalized = Vec::new();
        for id in self.proposals.due_for_finalize(now) {
            if let Some(proposal) = self.proposals.get_mut(id) {
                // Due proposals are past their window, so finalize
                // cannot report an open window here.
                if let Ok(status) = proposal.finalize(now) {
                    tracing::info!("proposal #{} finalized as {:?}", id, status);
                    finalized.push(id);
                }
            }
        }
        finalized
    }

    /// Resolve an external credential to an account. Without a
    /// configured resolver, credentials must be account strings
    /// (bech32m or hex).
    pub fn resolve_caller(&self, credential: &str) -> GovernanceResult<AccountId> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(credential),
            None => credential.parse().map_err(|e| {
                GovernanceError::Unauthorized(format!("unresolvable caller credential: {}", e))
            }),
        }
    }

    /// Aggregate counters at `now`.
    pub fn get_governance_stats(&self, now: Timestamp) -> GovernanceStats {
        let mut stats = GovernanceStats {
            total_proposals: self.proposals.count(),
            total_votes_cast: self.votes.total_votes(),
            total_voting_power: self.ledger.total_voting_base(&self.config, now),
            total_token_holders: self.ledger.holder_count(),
            total_tokens_issued: self.ledger.total_issued(),
            total_tokens_locked: self.ledger.total_locked(now),
            ..GovernanceStats::default()
        };
        for proposal in self.proposals.all() {
            match proposal.status {
                ProposalStatus::Active => stats.active_proposals += 1,
                ProposalStatus::Passed => stats.passed_proposals += 1,
                ProposalStatus::Rejected => stats.rejected_proposals += 1,
                ProposalStatus::Expired => stats.expired_proposals += 1,
                ProposalStatus::Cancelled => stats.cancelled_proposals += 1,
                ProposalStatus::Executed => stats.executed_proposals += 1,
            }
        }
        stats
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }
}

impl fmt::Debug for GovernanceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("config", &self.config)
            .field("holders", &self.ledger.holder_count())
            .field("proposals", &self.proposals.count())
            .field("votes", &self.votes.total_votes())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bursa_types::units::days;

    fn test_account(n: u8) -> AccountId {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        AccountId::from_bytes(bytes)
    }

    fn engine() -> GovernanceEngine {
        GovernanceEngine::new(GovernanceConfig::standard())
    }

    fn fund(engine: &mut GovernanceEngine, n: u8, amount: Amount, now: Timestamp) {
        engine
            .issue_tokens(
                test_account(n),
                amount,
                TokenSource::InitialDistribution,
                StakeholderKind::CommunityMember,
                now,
            )
            .unwrap();
    }

    fn parameter_action() -> ProposalAction {
        ProposalAction::ParameterChange {
            parameter: "loan_interest_bps".to_string(),
            current_value: "500".to_string(),
            new_value: "450".to_string(),
        }
    }

    #[test]
    fn test_create_proposal_requires_power() {
        let mut engine = engine();
        fund(&mut engine, 1, 99, 100);

        // Standard config needs 100 effective power
        let err = engine
            .create_proposal(
                test_account(1),
                "Lower interest".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized(_)));

        fund(&mut engine, 1, 1, 100);
        let proposal = engine
            .create_proposal(
                test_account(1),
                "Lower interest".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();
        assert_eq!(proposal.id, 1);
        assert_eq!(proposal.status, ProposalStatus::Active);
    }

    #[test]
    fn test_create_proposal_validates_text() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);

        let err = engine
            .create_proposal(
                test_account(1),
                "   ".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));

        let long_title = "t".repeat(201);
        let err = engine
            .create_proposal(
                test_account(1),
                long_title,
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));

        let long_description = "d".repeat(2_001);
        let err = engine
            .create_proposal(
                test_account(1),
                "Fine".to_string(),
                long_description,
                parameter_action(),
                None,
                100,
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));
    }

    #[test]
    fn test_voting_period_is_clamped() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);

        let proposal = engine
            .create_proposal(
                test_account(1),
                "Short window".to_string(),
                "d".to_string(),
                parameter_action(),
                Some(60),
                100,
            )
            .unwrap();
        // Clamped up to the one-day minimum
        assert_eq!(proposal.voting_ends_at, 100 + days(1));

        let proposal = engine
            .create_proposal(
                test_account(1),
                "Long window".to_string(),
                "d".to_string(),
                parameter_action(),
                Some(days(90)),
                100,
            )
            .unwrap();
        assert_eq!(proposal.voting_ends_at, 100 + days(30));
    }

    #[test]
    fn test_vote_error_ordering() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);

        // Unknown proposal comes first
        let err = engine
            .vote_on_proposal(test_account(1), 99, VoteChoice::For, 100)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NotFound(_)));

        engine
            .create_proposal(
                test_account(1),
                "P".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();

        // Closed window beats missing power
        let after_close = 100 + days(7);
        let err = engine
            .vote_on_proposal(test_account(2), 1, VoteChoice::For, after_close)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));

        // Powerless voter inside the window
        let err = engine
            .vote_on_proposal(test_account(2), 1, VoteChoice::For, 200)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized(_)));
    }

    #[test]
    fn test_revote_replaces_weight() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);
        fund(&mut engine, 2, 400, 100);

        engine
            .create_proposal(
                test_account(1),
                "P".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();

        engine
            .vote_on_proposal(test_account(2), 1, VoteChoice::For, 200)
            .unwrap();
        engine
            .vote_on_proposal(test_account(2), 1, VoteChoice::Against, 300)
            .unwrap();

        let proposal = engine.get_proposal(1).unwrap();
        assert_eq!(proposal.votes_for, 0);
        assert_eq!(proposal.votes_against, 400);
        // One vote per voter, the latest
        assert_eq!(engine.get_proposal_votes(1).len(), 1);
        assert_eq!(
            engine.get_proposal_votes(1)[0].choice,
            VoteChoice::Against
        );
    }

    #[test]
    fn test_vote_records_sole_delegator() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);
        fund(&mut engine, 2, 200, 100);

        engine
            .delegate_voting_power(test_account(1), test_account(2), None, None, 100)
            .unwrap();
        engine
            .create_proposal(
                test_account(2),
                "P".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();

        let vote = engine
            .vote_on_proposal(test_account(2), 1, VoteChoice::For, 200)
            .unwrap();
        assert_eq!(vote.voting_power, 1_200);
        assert_eq!(vote.delegated_from, Some(test_account(1)));
    }

    #[test]
    fn test_cancel_requires_proposer_or_admin() {
        let admin = test_account(9);
        let mut config = GovernanceConfig::standard();
        config.admins.push(admin);
        let mut engine = GovernanceEngine::new(config);
        fund(&mut engine, 1, 1_000, 100);

        engine
            .create_proposal(
                test_account(1),
                "P".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();
        engine
            .create_proposal(
                test_account(1),
                "Q".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();

        let err = engine
            .cancel_proposal(test_account(2), 1, 200)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized(_)));

        engine.cancel_proposal(test_account(1), 1, 200).unwrap();
        engine.cancel_proposal(admin, 2, 200).unwrap();
        assert_eq!(
            engine.get_proposals_by_status(ProposalStatus::Cancelled).len(),
            2
        );
    }

    #[test]
    fn test_locked_tokens_vote_policy() {
        let mut inert = engine();
        fund(&mut inert, 1, 1_000, 100);
        inert
            .lock_tokens(test_account(1), 600, days(30), 100)
            .unwrap();
        assert_eq!(inert.get_effective_voting_power(&test_account(1), 200), 400);

        let mut config = GovernanceConfig::standard();
        config.locked_tokens_vote = true;
        let mut full = GovernanceEngine::new(config);
        fund(&mut full, 1, 1_000, 100);
        full.lock_tokens(test_account(1), 600, days(30), 100)
            .unwrap();
        assert_eq!(full.get_effective_voting_power(&test_account(1), 200), 1_000);
    }

    #[test]
    fn test_resolve_caller_without_resolver() {
        let mut engine = engine();
        fund(&mut engine, 1, 100, 100);

        let account = test_account(1);
        assert_eq!(engine.resolve_caller(&account.to_string()).unwrap(), account);
        assert_eq!(
            engine.resolve_caller(&format!("0x{}", account.to_hex())).unwrap(),
            account
        );

        let err = engine.resolve_caller("not-a-credential").unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized(_)));
    }

    #[test]
    fn test_resolve_caller_with_resolver() {
        struct StaticResolver;
        impl IdentityResolver for StaticResolver {
            fn resolve(&self, credential: &str) -> GovernanceResult<AccountId> {
                if credential == "session-123" {
                    Ok(test_account(5))
                } else {
                    Err(GovernanceError::Unauthorized("unknown session".to_string()))
                }
            }
        }

        let engine = engine().with_resolver(Box::new(StaticResolver));
        assert_eq!(
            engine.resolve_caller("session-123").unwrap(),
            test_account(5)
        );
        assert!(engine.resolve_caller("session-999").is_err());
    }

    #[test]
    fn test_stats_roll_up() {
        let mut engine = engine();
        fund(&mut engine, 1, 1_000, 100);
        fund(&mut engine, 2, 500, 100);

        engine
            .create_proposal(
                test_account(1),
                "P".to_string(),
                "d".to_string(),
                parameter_action(),
                None,
                100,
            )
            .unwrap();
        engine
            .vote_on_proposal(test_account(1), 1, VoteChoice::For, 200)
            .unwrap();
        engine.lock_tokens(test_account(2), 100, days(30), 200).unwrap();

        let stats = engine.get_governance_stats(300);
        assert_eq!(stats.total_proposals, 1);
        assert_eq!(stats.active_proposals, 1);
        assert_eq!(stats.total_votes_cast, 1);
        assert_eq!(stats.total_token_holders, 2);
        assert_eq!(stats.total_tokens_issued, 1_500);
        assert_eq!(stats.total_tokens_locked, 100);
        assert_eq!(stats.total_voting_power, 1_400);
    }
}
