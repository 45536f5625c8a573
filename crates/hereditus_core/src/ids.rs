//! Identifiers for colonies and torbs.
//!
//! Colonies and torbs live in arenas owned by the [`Game`](crate::game::Game)
//! and are referenced only through these opaque handles. Nothing is ever
//! hard-deleted, so a handle stays valid for the lifetime of the game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Unique identifier for a colony within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColonyId(pub u32);

impl ColonyId {
    /// Position of this colony in the game's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ColonyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{:02}", self.0)
    }
}

/// Unique identifier for a torb within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TorbId(pub u64);

impl fmt::Display for TorbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:03}", self.0)
    }
}

/// Hands out game-wide torb identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TorbIdAllocator {
    next: u64,
}

impl TorbIdAllocator {
    /// Create an allocator starting at ID 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next identifier.
    pub fn allocate(&mut self) -> TorbId {
        // A default-constructed allocator starts at zero; skip it.
        if self.next == 0 {
            self.next = 1;
        }
        let id = TorbId(self.next);
        self.next += 1;
        id
    }
}

/// Player-facing label for a torb: its generation and its number within
/// that generation of its colony. Rendered as `"GG-NN"`, e.g. `"02-05"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TorbTag {
    /// Generation number (0 for founders).
    pub generation: u32,
    /// Number within the colony and generation, starting at 1.
    pub local_id: u32,
}

impl TorbTag {
    /// Create a new tag.
    #[must_use]
    pub const fn new(generation: u32, local_id: u32) -> Self {
        Self {
            generation,
            local_id,
        }
    }
}

impl fmt::Display for TorbTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.generation, self.local_id)
    }
}

impl FromStr for TorbTag {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidTorbTag(s.trim().to_string());
        let (generation, local) = s.split_once('-').ok_or_else(invalid)?;
        let generation = generation.trim().parse().map_err(|_| invalid())?;
        let local_id = local.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(generation, local_id))
    }
}

/// Parse a comma-separated list of tags such as `"00-01, 00-02"`.
///
/// Empty entries are skipped. Any malformed entry fails the whole list.
pub fn parse_torb_tags(text: &str) -> Result<Vec<TorbTag>, GameError> {
    text.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(TorbTag::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display_pads() {
        assert_eq!(TorbTag::new(2, 5).to_string(), "02-05");
        assert_eq!(TorbTag::new(12, 103).to_string(), "12-103");
    }

    #[test]
    fn test_tag_parse_with_spaces() {
        let tag: TorbTag = " 01 - 07 ".parse().unwrap();
        assert_eq!(tag, TorbTag::new(1, 7));
    }

    #[test]
    fn test_tag_parse_rejects_garbage() {
        assert!("0107".parse::<TorbTag>().is_err());
        assert!("a-b".parse::<TorbTag>().is_err());
    }

    #[test]
    fn test_parse_tag_list() {
        let tags = parse_torb_tags("00-01, 00-02;01-01,").unwrap();
        assert_eq!(
            tags,
            vec![TorbTag::new(0, 1), TorbTag::new(0, 2), TorbTag::new(1, 1)]
        );
        assert!(parse_torb_tags("00-01, nope").is_err());
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = TorbIdAllocator::default();
        assert_eq!(ids.allocate(), TorbId(1));
        assert_eq!(ids.allocate(), TorbId(2));
    }
}
