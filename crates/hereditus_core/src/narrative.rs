//! The chronicle: an append-only log of in-world events.
//!
//! Every entry is keyed by colony and round. The core only writes entries;
//! front ends read them back per colony for display.

use serde::{Deserialize, Serialize};

use crate::ids::ColonyId;

/// Category of a story entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryKind {
    /// Welcome, year changes, and refusals.
    System,
    /// Gathering and meals.
    Food,
    /// Births.
    Breeding,
    /// Deaths.
    Death,
    /// Scouting attempts.
    Scouting,
    /// Attacks and battles.
    Combat,
}

/// One human-readable event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryEntry {
    /// Colony the entry is shown to.
    pub colony: ColonyId,
    /// Round the entry was written in.
    pub round: u32,
    /// Category.
    pub kind: StoryKind,
    /// The text itself.
    pub text: String,
}

/// Append-only event log for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chronicle {
    entries: Vec<StoryEntry>,
    round: u32,
}

impl Chronicle {
    /// An empty chronicle at round 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Round stamped on new entries.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Stamp subsequent entries with `round`.
    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    /// Append an entry for `colony`.
    pub fn record(&mut self, colony: ColonyId, kind: StoryKind, text: impl Into<String>) {
        self.entries.push(StoryEntry {
            colony,
            round: self.round,
            kind,
            text: text.into(),
        });
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[StoryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chronicle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries shown to one colony, oldest first.
    pub fn for_colony(&self, colony: ColonyId) -> impl Iterator<Item = &StoryEntry> {
        self.entries.iter().filter(move |e| e.colony == colony)
    }

    /// Entries for one colony written in one round.
    pub fn for_round(&self, colony: ColonyId, round: u32) -> impl Iterator<Item = &StoryEntry> {
        self.for_colony(colony).filter(move |e| e.round == round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keyed_by_colony_and_round() {
        let mut log = Chronicle::new();
        log.record(ColonyId(0), StoryKind::System, "Welcome to Hereditus!");
        log.record(ColonyId(1), StoryKind::System, "Welcome to Hereditus!");
        log.set_round(1);
        log.record(ColonyId(0), StoryKind::Food, "Your Torbs gathered 3 food.");

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_colony(ColonyId(0)).count(), 2);
        let latest: Vec<_> = log.for_round(ColonyId(0), 1).collect();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].kind, StoryKind::Food);
        assert_eq!(latest[0].round, 1);
    }
}
