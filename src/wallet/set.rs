use alloy::primitives::Address;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Canonical lowercase `0x`-prefixed form of an address.
pub fn canonical(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Parse a wallet string in any letter case. No checksum validation.
pub fn parse_address(raw: &str) -> Option<Address> {
    let lowered = raw.trim().to_lowercase();
    if !lowered.starts_with("0x") || lowered.len() != 42 {
        return None;
    }
    Address::from_str(&lowered).ok()
}

/// Deduplicated set of tracked wallets, used for membership tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSet {
    members: HashSet<Address>,
}

impl WalletSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address) -> bool {
        self.members.insert(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    /// Members in ascending byte order.
    pub fn sorted(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.members.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// Canonical strings in ascending order.
    pub fn canonical_strings(&self) -> Vec<String> {
        self.sorted().iter().map(canonical).collect()
    }

    /// Identity of the member set, independent of insertion order.
    /// Used as the event cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.members.len().hash(&mut hasher);
        for address in self.sorted() {
            address.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl FromIterator<Address> for WalletSet {
    fn from_iter<T: IntoIterator<Item = Address>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
