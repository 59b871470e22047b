use crate::account::AccountId;
use crate::units::{days, hours, Amount};

/// Engine-level governance parameters.
/// These can themselves be changed via a ParameterChange proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernanceConfig {
    // Proposal creation
    pub min_proposal_power: Amount,   // 100 effective voting power
    pub max_title_len: usize,         // 200
    pub max_description_len: usize,   // 2000

    // Voting window, in seconds
    pub default_voting_period: u64,   // 7 days
    pub min_voting_period: u64,       // 1 day
    pub max_voting_period: u64,       // 30 days

    // Voting power policy
    pub locked_tokens_vote: bool,     // false: locked tokens are voting-inert

    // Accounts allowed to cancel any active proposal
    pub admins: Vec<AccountId>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl GovernanceConfig {
    /// Production configuration
    pub fn standard() -> Self {
        Self {
            min_proposal_power: 100,
            max_title_len: 200,
            max_description_len: 2_000,
            default_voting_period: days(7),
            min_voting_period: days(1),
            max_voting_period: days(30),
            locked_tokens_vote: false,
            admins: Vec::new(),
        }
    }

    /// Campus pilot configuration: faster cycles, lower proposal bar
    pub fn pilot() -> Self {
        let mut config = Self::standard();
        config.min_proposal_power = 10;
        config.default_voting_period = days(3);
        config.min_voting_period = hours(12);
        config.max_voting_period = days(14);
        config
    }

    /// Local development configuration
    pub fn dev() -> Self {
        let mut config = Self::standard();
        config.min_proposal_power = 1;
        config.default_voting_period = 600; // 10 minutes
        config.min_voting_period = 60;
        config.max_voting_period = days(1);
        config
    }

    /// Clamp a requested voting period into the allowed window.
    pub fn clamp_voting_period(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_voting_period)
            .clamp(self.min_voting_period, self.max_voting_period)
    }

    /// Whether an account may cancel any active proposal.
    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::SECS_PER_DAY;

    #[test]
    fn test_standard_config() {
        let config = GovernanceConfig::standard();
        assert_eq!(config.min_proposal_power, 100);
        assert_eq!(config.max_title_len, 200);
        assert_eq!(config.max_description_len, 2_000);
        assert_eq!(config.default_voting_period, 7 * SECS_PER_DAY);
        assert!(!config.locked_tokens_vote);
        assert!(config.admins.is_empty());
    }

    #[test]
    fn test_pilot_config() {
        let config = GovernanceConfig::pilot();
        assert_eq!(config.min_proposal_power, 10);
        assert_eq!(config.default_voting_period, 3 * SECS_PER_DAY);
        assert!(config.min_voting_period < SECS_PER_DAY);
    }

    #[test]
    fn test_dev_config() {
        let config = GovernanceConfig::dev();
        assert_eq!(config.min_proposal_power, 1);
        assert_eq!(config.default_voting_period, 600);
    }

    #[test]
    fn test_clamp_voting_period() {
        let config = GovernanceConfig::standard();
        assert_eq!(
            config.clamp_voting_period(None),
            config.default_voting_period
        );
        assert_eq!(config.clamp_voting_period(Some(0)), config.min_voting_period);
        assert_eq!(
            config.clamp_voting_period(Some(365 * SECS_PER_DAY)),
            config.max_voting_period
        );
        assert_eq!(
            config.clamp_voting_period(Some(2 * SECS_PER_DAY)),
            2 * SECS_PER_DAY
        );
    }

    #[test]
    fn test_is_admin() {
        let admin = AccountId::from_bytes([9u8; 32]);
        let other = AccountId::from_bytes([8u8; 32]);

        let mut config = GovernanceConfig::standard();
        assert!(!config.is_admin(&admin));

        config.admins.push(admin);
        assert!(config.is_admin(&admin));
        assert!(!config.is_admin(&other));
    }
}
