//! Line-delimited JSON spoken between the runner and its controllers.
//!
//! Every [`Command`] read from stdin is one JSON object tagged by `cmd`;
//! every [`Response`] written to stdout is one object tagged by `type`.
//! The runner greets with `ready`, answers each order with `ack` or
//! `error`, emits a `round` report once the last colony ends its turn, and
//! says `bye` on `quit`.
//!
//! Torbs are addressed by their `gen-local` tags, the same labels players
//! see in the colony listing.
//!
//! A short session:
//!
//! ```text
//! <- {"type":"ready","version":"1.0","round":0}
//! -> {"cmd":"join","player":"alice","colony":"Alicetown"}
//! <- {"type":"joined","colony":0,"name":"Alicetown"}
//! -> {"cmd":"join_ai","profile":"aggressive"}
//! <- {"type":"joined","colony":1,"name":"The Shire"}
//! -> {"cmd":"breed","colony":0,"torbs":"00-01, 00-02"}
//! <- {"type":"ack","cmd":"breed"}
//! -> {"cmd":"end_turn","colony":0}
//! <- {"type":"round","report":{"round":1,...}}
//! ```

use serde::{Deserialize, Serialize};

use hereditus_core::colony::{Colony, ColonySummary};
use hereditus_core::game::RoundReport;
use hereditus_core::narrative::StoryEntry;
use hereditus_core::torb::{Action, Torb};

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Orders and queries from a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// A human player joins with a new colony.
    Join { player: String, colony: String },

    /// An AI colony joins, using a preset profile (default `balanced`).
    JoinAi {
        #[serde(default)]
        profile: Option<String>,
    },

    /// Pair two torbs, given as a tag list such as `"00-01, 00-02"`.
    Breed { colony: u32, torbs: String },

    /// Reassign torbs to gathering, training or resting.
    Assign {
        colony: u32,
        torbs: String,
        action: Action,
    },

    /// Set or clear a colony's scout target.
    Scout {
        colony: u32,
        #[serde(default)]
        target: Option<u32>,
    },

    /// Set or clear a colony's attack target.
    Attack {
        colony: u32,
        #[serde(default)]
        target: Option<u32>,
    },

    /// Mark a colony ready.
    EndTurn { colony: u32 },

    /// Let AI colonies play and resolve N rounds (default 1). Refused while
    /// a human colony is unready.
    Advance {
        #[serde(default = "default_round_count")]
        rounds: u32,
    },

    /// Game state, or one colony in detail.
    Query {
        #[serde(default)]
        colony: Option<u32>,
    },

    /// Narrative entries for a colony, optionally for one round.
    Chronicle {
        colony: u32,
        #[serde(default)]
        round: Option<u32>,
    },

    /// The colony's scout report on discovered colonies.
    Report { colony: u32 },

    /// Current state hash (for determinism verification).
    Hash,

    /// Save a snapshot of the game.
    Save { path: String },

    /// Replace the game with a saved snapshot.
    Load { path: String },

    /// Quit the runner.
    Quit,
}

fn default_round_count() -> u32 {
    1
}

/// Everything the runner writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// First line of a session.
    Ready { version: String, round: u32 },

    /// The order was accepted.
    Ack { cmd: String },

    /// Error processing a command; the game is unchanged.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// A colony joined.
    Joined { colony: u32, name: String },

    /// A round was resolved.
    Round { report: RoundReport },

    /// Summary of every colony.
    State {
        round: u32,
        hash: u64,
        unready: Vec<u32>,
        colonies: Vec<ColonySummary>,
    },

    /// One colony in detail.
    Colony { colony: ColonyDetail },

    /// Narrative entries.
    Chronicle { entries: Vec<StoryEntry> },

    /// Scout report lines.
    ScoutReport { colony: u32, lines: Vec<String> },

    /// Current [`hereditus_core::game::Game::state_hash`].
    StateHash { round: u32, hash: u64 },

    /// Last line of a session.
    Bye,
}

/// One torb as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorbState {
    pub tag: String,
    pub name: String,
    pub generation: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub action: Action,
    pub status: String,
}

impl From<&Torb> for TorbState {
    fn from(torb: &Torb) -> Self {
        Self {
            tag: torb.tag.to_string(),
            name: torb.name.clone(),
            generation: torb.generation(),
            hp: torb.hp,
            max_hp: torb.max_hp,
            action: torb.action,
            status: torb.status(),
        }
    }
}

/// One colony in detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyDetail {
    pub summary: ColonySummary,
    pub ready: bool,
    pub discovered: Vec<u32>,
    pub scout_target: Option<u32>,
    pub attack_target: Option<u32>,
    pub torbs: Vec<TorbState>,
}

impl ColonyDetail {
    /// Build the detail view of a colony.
    pub fn of(colony: &Colony, precision: u32) -> Self {
        Self {
            summary: colony.summary(precision),
            ready: colony.ready,
            discovered: colony.discovered().iter().map(|c| c.0).collect(),
            scout_target: colony.army.scout_target.map(|c| c.0),
            attack_target: colony.army.attack_target.map(|c| c.0),
            torbs: colony.torbs().map(TorbState::from).collect(),
        }
    }
}

impl Response {
    pub fn ready(round: u32) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            round,
        }
    }

    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// A refusal, naming the command when it was parsed.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// One newline-terminated JSON line.
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The `cmd` tag, echoed in `ack` and `error`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::JoinAi { .. } => "join_ai",
            Self::Breed { .. } => "breed",
            Self::Assign { .. } => "assign",
            Self::Scout { .. } => "scout",
            Self::Attack { .. } => "attack",
            Self::EndTurn { .. } => "end_turn",
            Self::Advance { .. } => "advance",
            Self::Query { .. } => "query",
            Self::Chronicle { .. } => "chronicle",
            Self::Report { .. } => "report",
            Self::Hash => "hash",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_breed_command() {
        let json = r#"{"cmd":"breed","colony":0,"torbs":"00-01, 00-02"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(
            cmd,
            Command::Breed {
                colony: 0,
                torbs: "00-01, 00-02".to_string()
            }
        );
    }

    #[test]
    fn test_parse_assign_action() {
        let json = r#"{"cmd":"assign","colony":1,"torbs":"00-03","action":"training"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(
            cmd,
            Command::Assign {
                action: Action::Training,
                ..
            }
        ));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            Command::from_json(r#"{"cmd":"advance"}"#).unwrap(),
            Command::Advance { rounds: 1 }
        );
        assert_eq!(
            Command::from_json(r#"{"cmd":"scout","colony":2}"#).unwrap(),
            Command::Scout {
                colony: 2,
                target: None
            }
        );
        assert_eq!(
            Command::from_json(r#"{"cmd":"join_ai"}"#).unwrap(),
            Command::JoinAi { profile: None }
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Command::from_json(r#"{"cmd":"harvest","colony":0}"#).is_err());
    }

    #[test]
    fn test_serialize_hash_response() {
        let resp = Response::StateHash {
            round: 3,
            hash: 12345,
        };
        let json = resp.to_json_line();
        assert!(json.contains(r#""type":"state_hash""#));
        assert!(json.contains(r#""round":3"#));
        assert!(json.ends_with('\n'));
    }
}
