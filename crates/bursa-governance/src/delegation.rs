//! Amount-scoped, expiring vote delegation.
//!
//! Delegation is single-hop: power received from a delegator is never
//! re-delegatable, so cycles cannot form and conservation holds by
//! construction. Each delegator has at most one current edge, and
//! re-delegating replaces it. Superseded edges move to an archive and
//! are never deleted.

use std::collections::HashMap;

use bursa_ledger::TokenLedger;
use bursa_types::{AccountId, Amount, GovernanceConfig, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};

/// A single delegation grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationEdge {
    /// Who is delegating
    pub delegator: AccountId,
    /// Who receives the voting power
    pub delegate: AccountId,
    /// Voting power granted
    pub amount: Amount,
    /// When the delegation was created
    pub created_at: Timestamp,
    /// Optional expiry; the edge is inert from this instant on
    pub expires_at: Option<Timestamp>,
    /// Set when replaced or explicitly removed
    pub revoked_at: Option<Timestamp>,
}

impl DelegationEdge {
    pub fn new(
        delegator: AccountId,
        delegate: AccountId,
        amount: Amount,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            delegator,
            delegate,
            amount,
            created_at,
            expires_at,
            revoked_at: None,
        }
    }

    /// Whether the edge still conveys voting power at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        if self.revoked_at.is_some() {
            return false;
        }
        match self.expires_at {
            Some(at) => now < at,
            None => true,
        }
    }

    fn revoke(&mut self, now: Timestamp) {
        self.revoked_at = Some(now);
    }
}

/// Delegation graph: one current edge per delegator, a reverse index
/// for inbound lookups, and an audit archive of superseded edges.
///
/// Expiry is lazy. An expired edge stops conveying power the instant
/// its deadline passes; [`DelegationGraph::compact`] only moves it to
/// the archive so current-edge scans stay small.
#[derive(Debug, Clone, Default)]
pub struct DelegationGraph {
    /// delegator -> current edge (possibly expired)
    current: HashMap<AccountId, DelegationEdge>,
    /// delegate -> delegators with a current edge
    inbound: HashMap<AccountId, Vec<AccountId>>,
    /// Superseded, removed, and compacted edges
    archive: Vec<DelegationEdge>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the delegator's grant.
    ///
    /// `amount` defaults to the delegator's entire voting base. Edges
    /// never stack: an existing grant is revoked and archived first.
    pub fn delegate(
        &mut self,
        ledger: &TokenLedger,
        config: &GovernanceConfig,
        delegator: AccountId,
        delegate: AccountId,
        amount: Option<Amount>,
        expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> GovernanceResult<DelegationEdge> {
        if delegator == delegate {
            return Err(GovernanceError::InvalidInput(
                "cannot delegate to self".to_string(),
            ));
        }
        if let Some(at) = expires_at {
            if at <= now {
                return Err(GovernanceError::InvalidInput(
                    "delegation expiry is not in the future".to_string(),
                ));
            }
        }

        let base = ledger.voting_base(config, &delegator, now);
        let amount = amount.unwrap_or(base);
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "cannot delegate zero voting power".to_string(),
            ));
        }
        if amount > base {
            return Err(GovernanceError::InsufficientFunds {
                requested: amount,
                available: base,
            });
        }

        if let Some(mut prior) = self.current.remove(&delegator) {
            self.unlink(&prior.delegate, &delegator);
            prior.revoke(now);
            self.archive.push(prior);
        }

        let edge = DelegationEdge::new(delegator, delegate, amount, now, expires_at);
        self.inbound.entry(delegate).or_default().push(delegator);
        self.current.insert(delegator, edge.clone());

        tracing::debug!(
            "{} delegated {} voting power to {}",
            delegator,
            amount,
            delegate
        );
        Ok(edge)
    }

    /// Remove the delegator's current edge. Power reverts immediately.
    pub fn remove(
        &mut self,
        delegator: &AccountId,
        now: Timestamp,
    ) -> GovernanceResult<DelegationEdge> {
        let mut edge = self.current.remove(delegator).ok_or_else(|| {
            GovernanceError::NotFound(format!("no delegation from {}", delegator))
        })?;
        self.unlink(&edge.delegate, delegator);
        edge.revoke(now);
        self.archive.push(edge.clone());

        tracing::debug!("{} removed delegation to {}", delegator, edge.delegate);
        Ok(edge)
    }

    fn unlink(&mut self, delegate: &AccountId, delegator: &AccountId) {
        if let Some(list) = self.inbound.get_mut(delegate) {
            list.retain(|d| d != delegator);
            if list.is_empty() {
                self.inbound.remove(delegate);
            }
        }
    }

    /// Current edge for a delegator, if any. May already be expired.
    pub fn current_edge(&self, delegator: &AccountId) -> Option<&DelegationEdge> {
        self.current.get(delegator)
    }

    /// Active inbound edges granting power to `delegate` at `now`.
    pub fn inbound_edges(&self, delegate: &AccountId, now: Timestamp) -> Vec<&DelegationEdge> {
        self.inbound
            .get(delegate)
            .map(|delegators| {
                delegators
                    .iter()
                    .filter_map(|d| self.current.get(d))
                    .filter(|e| e.is_active(now))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every edge a delegator has created: the current one first, then
    /// archived history.
    pub fn edges_from(&self, delegator: &AccountId) -> Vec<&DelegationEdge> {
        let mut edges: Vec<&DelegationEdge> = self.current.get(delegator).into_iter().collect();
        edges.extend(self.archive.iter().filter(|e| e.delegator == *delegator));
        edges
    }

    /// Power an edge conveys at `now`: its amount, capped by the
    /// delegator's current voting base. Locks applied after the grant
    /// shrink the grant rather than double-count power.
    fn conveyed(
        &self,
        edge: &DelegationEdge,
        ledger: &TokenLedger,
        config: &GovernanceConfig,
        now: Timestamp,
    ) -> Amount {
        edge.amount.min(ledger.voting_base(config, &edge.delegator, now))
    }

    /// Live outbound grant for a delegator at `now`.
    pub fn outbound_live(
        &self,
        ledger: &TokenLedger,
        config: &GovernanceConfig,
        delegator: &AccountId,
        now: Timestamp,
    ) -> Amount {
        self.current
            .get(delegator)
            .filter(|e| e.is_active(now))
            .map(|e| self.conveyed(e, ledger, config, now))
            .unwrap_or(0)
    }

    /// Effective voting power at `now`: own base, minus power granted
    /// away, plus power granted in.
    pub fn effective_voting_power(
        &self,
        ledger: &TokenLedger,
        config: &GovernanceConfig,
        account: &AccountId,
        now: Timestamp,
    ) -> Amount {
        let base = ledger.voting_base(config, account, now);
        let outbound = self.outbound_live(ledger, config, account, now);
        let inbound: Amount = self
            .inbound_edges(account, now)
            .iter()
            .map(|e| self.conveyed(e, ledger, config, now))
            .sum();

        // outbound is capped at base, so the subtraction cannot wrap
        (base - outbound).saturating_add(inbound)
    }

    /// Sole active delegator for `delegate` at `now`, if exactly one
    /// inbound edge exists. Used for vote audit trails.
    pub fn sole_delegator(&self, delegate: &AccountId, now: Timestamp) -> Option<AccountId> {
        match self.inbound_edges(delegate, now).as_slice() {
            [single] => Some(single.delegator),
            _ => None,
        }
    }

    /// Move expired current edges to the archive. Returns how many
    /// were archived.
    pub fn compact(&mut self, now: Timestamp) -> usize {
        let expired: Vec<AccountId> = self
            .current
            .iter()
            .filter(|(_, e)| !e.is_active(now))
            .map(|(d, _)| *d)
            .collect();

        for delegator in &expired {
            if let Some(edge) = self.current.remove(delegator) {
                self.unlink(&edge.delegate, delegator);
                self.archive.push(edge);
            }
        }
        expired.len()
    }

    /// Number of current edges, expired ones included.
    pub fn current_count(&self) -> usize {
        self.current.len()
    }

    /// Number of archived edges.
    pub fn archived_count(&self) -> usize {
        self.archive.len()
    }
}
