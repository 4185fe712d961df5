//! Strict IPv4 address blocks.
//!
//! An [`AddressBlock`] is a network prefix whose host bits are all zero:
//! `10.0.0.0/24` is accepted, `10.0.0.5/24` is rejected. The `Display` form is
//! canonical, so parsing a canonical string and printing it again yields the
//! same text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("address block must not be empty")]
    Empty,
    #[error("invalid IPv4 address in '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length in '{0}' (expected 0-32 or a contiguous netmask)")]
    InvalidPrefix(String),
    #[error("'{input}' has host bits set (did you mean {suggested}?)")]
    HostBitsSet { input: String, suggested: String },
}

/// An IPv4 network in slash notation with host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressBlock {
    network: Ipv4Addr,
    prefix: u8,
}

#[inline]
fn mask_for(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

fn prefix_from_netmask(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let ones = bits.leading_ones();
    // Any set bit after the leading run means the mask is not contiguous.
    if bits.checked_shl(ones).unwrap_or(0) == 0 {
        Some(ones as u8)
    } else {
        None
    }
}

impl AddressBlock {
    /// Build a block from its parts, rejecting set host bits.
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::InvalidPrefix(format!("{network}/{prefix}")));
        }
        let mask = mask_for(prefix);
        let bits = u32::from(network);
        if bits & !mask != 0 {
            return Err(CidrError::HostBitsSet {
                input: format!("{network}/{prefix}"),
                suggested: format!("{}/{prefix}", Ipv4Addr::from(bits & mask)),
            });
        }
        Ok(Self { network, prefix })
    }

    /// Caller guarantees `prefix <= 32` and clear host bits.
    pub(crate) const fn from_raw(network: Ipv4Addr, prefix: u8) -> Self {
        Self { network, prefix }
    }

    /// Parse `a.b.c.d/len`, `a.b.c.d/netmask`, or a bare address (`/32`).
    pub fn parse(input: &str) -> Result<Self, CidrError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CidrError::Empty);
        }

        let (addr_str, prefix_str) = match trimmed.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (trimmed, None),
        };

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| CidrError::InvalidAddress(trimmed.to_owned()))?;

        let prefix = match prefix_str {
            None => 32,
            Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => p
                .parse::<u8>()
                .ok()
                .filter(|len| *len <= 32)
                .ok_or_else(|| CidrError::InvalidPrefix(trimmed.to_owned()))?,
            Some(p) => Ipv4Addr::from_str(p)
                .ok()
                .and_then(prefix_from_netmask)
                .ok_or_else(|| CidrError::InvalidPrefix(trimmed.to_owned()))?,
        };

        Self::new(network, prefix).map_err(|e| match e {
            CidrError::HostBitsSet { suggested, .. } => CidrError::HostBitsSet {
                input: trimmed.to_owned(),
                suggested,
            },
            other => other,
        })
    }

    #[inline]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[inline]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// First address of the block as an integer.
    #[inline]
    pub fn first(&self) -> u32 {
        u32::from(self.network)
    }

    /// Last address of the block (the broadcast address) as an integer.
    #[inline]
    pub fn last(&self) -> u32 {
        self.first() | !mask_for(self.prefix)
    }

    /// Number of addresses covered by the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    /// True if every address of `other` lies inside `self`.
    pub fn contains(&self, other: &AddressBlock) -> bool {
        self.first() <= other.first() && other.last() <= self.last()
    }

    /// True if the two blocks share at least one address.
    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }
}

impl fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for AddressBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AddressBlock {
    type Error = CidrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AddressBlock> for String {
    fn from(block: AddressBlock) -> Self {
        block.to_string()
    }
}

/// Validate a CIDR string and return its canonical form.
pub fn validate_cidr(input: &str) -> Result<String, CidrError> {
    AddressBlock::parse(input).map(|b| b.to_string())
}
