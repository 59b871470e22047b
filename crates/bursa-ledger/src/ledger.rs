//! Token ledger: issuance, locking, and supply metrics.

use std::collections::HashMap;

use bursa_types::{
    AccountId, Amount, GovernanceConfig, GovernanceError, GovernanceResult, StakeholderKind,
    Timestamp,
};

use crate::holding::{TokenHolding, TokenSource};

/// Registry of all token holdings, keyed by account.
///
/// Lock expiry is lazy: reads subtract elapsed locks on the fly, and
/// mutations clear them opportunistically.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    holdings: HashMap<AccountId, TokenHolding>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self {
            holdings: HashMap::new(),
        }
    }

    /// Issue tokens to an account, creating the holding on first
    /// issuance. The stakeholder kind is recorded once and kept on
    /// later issuances.
    pub fn issue(
        &mut self,
        account: AccountId,
        amount: Amount,
        source: TokenSource,
        kind: StakeholderKind,
        now: Timestamp,
    ) -> GovernanceResult<TokenHolding> {
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "cannot issue zero tokens".to_string(),
            ));
        }

        let holding = self
            .holdings
            .entry(account)
            .and_modify(|h| {
                h.release_expired_lock(now);
                h.credit(amount, now);
            })
            .or_insert_with(|| TokenHolding::new(account, kind, amount, source, now));

        tracing::debug!("issued {} tokens to {} ({})", amount, account, source);
        Ok(holding.clone())
    }

    /// Lock part of a balance until a deadline.
    ///
    /// Locking on top of an existing lock adds the amounts and keeps
    /// the later deadline.
    pub fn lock(
        &mut self,
        account: AccountId,
        amount: Amount,
        until: Timestamp,
        now: Timestamp,
    ) -> GovernanceResult<TokenHolding> {
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "cannot lock zero tokens".to_string(),
            ));
        }
        if until <= now {
            return Err(GovernanceError::InvalidInput(
                "lock deadline is not in the future".to_string(),
            ));
        }

        let holding = self
            .holdings
            .get_mut(&account)
            .ok_or_else(|| GovernanceError::NotFound(format!("no holding for {}", account)))?;

        holding.release_expired_lock(now);

        let available = holding.unlocked_at(now);
        if amount > available {
            return Err(GovernanceError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        holding.apply_lock(amount, until, now);
        tracing::debug!("locked {} tokens of {} until {}", amount, account, until);
        Ok(holding.clone())
    }

    /// Balance net of active locks. Unknown accounts hold zero.
    pub fn effective_balance(&self, account: &AccountId, at: Timestamp) -> Amount {
        self.holdings
            .get(account)
            .map(|h| h.unlocked_at(at))
            .unwrap_or(0)
    }

    /// Full balance, locked portion included.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.holdings.get(account).map(|h| h.balance).unwrap_or(0)
    }

    /// Voting power base for an account under the given policy.
    pub fn voting_base(
        &self,
        config: &GovernanceConfig,
        account: &AccountId,
        at: Timestamp,
    ) -> Amount {
        if config.locked_tokens_vote {
            self.balance(account)
        } else {
            self.effective_balance(account, at)
        }
    }

    /// Network-wide sum of voting bases. Quorum denominators snapshot
    /// this at proposal creation.
    pub fn total_voting_base(&self, config: &GovernanceConfig, at: Timestamp) -> Amount {
        if config.locked_tokens_vote {
            self.total_issued()
        } else {
            self.total_unlocked(at)
        }
    }

    pub fn holding(&self, account: &AccountId) -> Option<&TokenHolding> {
        self.holdings.get(account)
    }

    pub fn holdings(&self) -> impl Iterator<Item = &TokenHolding> {
        self.holdings.values()
    }

    pub fn holder_count(&self) -> usize {
        self.holdings.len()
    }

    /// Total tokens ever issued. Nothing burns, so this is the supply.
    pub fn total_issued(&self) -> Amount {
        self.holdings.values().map(|h| h.balance).sum()
    }

    /// Supply free of locks at `at`.
    pub fn total_unlocked(&self, at: Timestamp) -> Amount {
        self.holdings.values().map(|h| h.unlocked_at(at)).sum()
    }

    /// Supply under locks at `at`.
    pub fn total_locked(&self, at: Timestamp) -> Amount {
        self.holdings.values().map(|h| h.locked_at(at)).sum()
    }
}
