use bursa_types::{AccountId, Amount, StakeholderKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a holding's first tokens came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSource {
    InitialDistribution,
    Staking,
    ScholarshipDonation,
    LoanOrigination,
    LoanRepayment,
    CommunityParticipation,
    Delegation,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::InitialDistribution => write!(f, "InitialDistribution"),
            TokenSource::Staking => write!(f, "Staking"),
            TokenSource::ScholarshipDonation => write!(f, "ScholarshipDonation"),
            TokenSource::LoanOrigination => write!(f, "LoanOrigination"),
            TokenSource::LoanRepayment => write!(f, "LoanRepayment"),
            TokenSource::CommunityParticipation => write!(f, "CommunityParticipation"),
            TokenSource::Delegation => write!(f, "Delegation"),
        }
    }
}

/// A single account's governance token holding.
///
/// `balance` always includes the locked portion; views that exclude
/// locks go through [`TokenHolding::unlocked_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    /// Owning account
    pub account: AccountId,
    /// Stakeholder classification, recorded at first issuance
    pub kind: StakeholderKind,
    /// Total balance, locked portion included
    pub balance: Amount,
    /// Portion of the balance under an active lock
    pub locked_amount: Amount,
    /// Instant the locked portion unlocks
    pub locked_until: Option<Timestamp>,
    /// Source of the first issuance
    pub earned_from: TokenSource,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
}

impl TokenHolding {
    /// Create a holding with an initial issuance.
    pub fn new(
        account: AccountId,
        kind: StakeholderKind,
        amount: Amount,
        source: TokenSource,
        now: Timestamp,
    ) -> Self {
        Self {
            account,
            kind,
            balance: amount,
            locked_amount: 0,
            locked_until: None,
            earned_from: source,
            created_at: now,
            updated_at: now,
        }
    }

    /// Locked portion still in force at `at`.
    pub fn locked_at(&self, at: Timestamp) -> Amount {
        match self.locked_until {
            Some(until) if at < until => self.locked_amount,
            _ => 0,
        }
    }

    /// Balance free of locks at `at`.
    pub fn unlocked_at(&self, at: Timestamp) -> Amount {
        self.balance.saturating_sub(self.locked_at(at))
    }

    /// Whether a lock is in force at `at`.
    pub fn is_locked(&self, at: Timestamp) -> bool {
        self.locked_at(at) > 0
    }

    /// Credit newly issued tokens.
    pub(crate) fn credit(&mut self, amount: Amount, now: Timestamp) {
        self.balance = self.balance.saturating_add(amount);
        self.updated_at = now;
    }

    /// Add to the locked portion and extend the deadline to the later
    /// of the current and requested instants. Caller validates funds.
    pub(crate) fn apply_lock(&mut self, amount: Amount, until: Timestamp, now: Timestamp) {
        self.locked_amount = self.locked_amount.saturating_add(amount);
        self.locked_until = Some(match self.locked_until {
            Some(current) => current.max(until),
            None => until,
        });
        self.updated_at = now;
    }

    /// Drop a lock whose deadline has passed. Returns true if one was
    /// released.
    pub(crate) fn release_expired_lock(&mut self, now: Timestamp) -> bool {
        match self.locked_until {
            Some(until) if now >= until => {
                self.locked_amount = 0;
                self.locked_until = None;
                self.updated_at = now;
                true
            }
            _ => false,
        }
    }
}
