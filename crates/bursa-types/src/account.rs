use crate::error::GovernanceError;
use std::fmt;
use std::str::FromStr;

/// 32-byte account identifier derived from an ed25519 public key.
/// Display format: Bech32m with "bursa" human-readable prefix.
///
/// # Derivation
/// `id = blake3(ed25519_pubkey)`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub const ZERO: Self = Self([0u8; 32]);
    pub const LEN: usize = 32;

    /// Bech32m human-readable prefix
    pub const BECH32_HRP: &'static str = "bursa";

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, GovernanceError> {
        if slice.len() != Self::LEN {
            return Err(GovernanceError::InvalidInput(format!(
                "invalid account id length: expected {}, got {}",
                Self::LEN,
                slice.len()
            )));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Derive an account id from ed25519 public key bytes (32 bytes).
    pub fn from_public_key(pubkey: &[u8; 32]) -> Self {
        Self(*blake3::hash(pubkey).as_bytes())
    }

    /// Check if this is the zero id
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Convert to hex string without 0x prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = bech32::Hrp::parse_unchecked(Self::BECH32_HRP);
        match bech32::encode::<bech32::Bech32m>(hrp, &self.0) {
            Ok(encoded) => write!(f, "{}", encoded),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId(0x{})", hex::encode(self.0))
    }
}

impl fmt::LowerHex for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::UpperHex for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode_upper(self.0))
    }
}

impl FromStr for AccountId {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Support both Bech32m ("bursa1...") and hex ("0x...")
        if s.starts_with("bursa1") {
            let (hrp, data) = bech32::decode(s)
                .map_err(|e| GovernanceError::InvalidInput(format!("invalid bech32: {}", e)))?;

            let expected_hrp = bech32::Hrp::parse_unchecked(Self::BECH32_HRP);
            if hrp != expected_hrp {
                return Err(GovernanceError::InvalidInput(format!(
                    "invalid HRP: expected '{}', got '{}'",
                    Self::BECH32_HRP,
                    hrp
                )));
            }

            Self::from_slice(&data)
        } else if s.starts_with("0x") || s.starts_with("0X") {
            let bytes = hex::decode(&s[2..])?;
            Self::from_slice(&bytes)
        } else {
            Err(GovernanceError::InvalidInput(format!(
                "unrecognized account id format: {}",
                s
            )))
        }
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Stakeholder classification recorded on token holdings.
///
/// Informational only: the tag never affects voting weight, which is
/// always the unlocked token balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StakeholderKind {
    Student,
    Donor,
    University,
    Validator,
    TeamMember,
    #[default]
    CommunityMember,
}

impl fmt::Display for StakeholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeholderKind::Student => write!(f, "Student"),
            StakeholderKind::Donor => write!(f, "Donor"),
            StakeholderKind::University => write!(f, "University"),
            StakeholderKind::Validator => write!(f, "Validator"),
            StakeholderKind::TeamMember => write!(f, "TeamMember"),
            StakeholderKind::CommunityMember => write!(f, "CommunityMember"),
        }
    }
}
