//! Headless game runner implementation.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use hereditus_core::prelude::*;
use hereditus_core::replay::{Replay, ReplayEntry};
use tracing::{debug, info, warn};

use crate::protocol::{ColonyDetail, Command, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output a state line after every resolved round.
    pub auto_state: bool,
    /// Write the session's replay here when the runner stops.
    pub record_path: Option<PathBuf>,
}

/// Drives one [`Game`] from JSON-line commands.
///
/// Every accepted state-changing command is journaled, so a session can be
/// saved as a [`Replay`] and verified later. Loading a snapshot stops the
/// journal: the loaded game cannot be rebuilt from its config alone.
pub struct HeadlessRunner {
    game: Game,
    journal: Option<Replay>,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// A runner over a new, empty game.
    pub fn new(game_config: GameConfig) -> Result<Self> {
        Self::with_config(game_config, HeadlessConfig::default())
    }

    /// A runner over a new, empty game, with custom runner configuration.
    pub fn with_config(game_config: GameConfig, config: HeadlessConfig) -> Result<Self> {
        let game = Game::new(game_config.clone())?;
        Ok(Self {
            game,
            journal: Some(Replay::new(game_config)),
            config,
        })
    }

    /// A runner with every seat of `scenario` joined, using `seed`.
    pub fn from_scenario(
        scenario: &Scenario,
        seed: u64,
        config: HeadlessConfig,
    ) -> std::result::Result<Self, ScenarioError> {
        let game_config = GameConfig {
            seed,
            ..scenario.config.clone()
        };
        let mut runner = Self::with_config(game_config, config)?;
        for seat in &scenario.humans {
            runner.journal(ReplayEntry::JoinHuman {
                player: seat.player.clone(),
                colony: seat.colony.clone(),
            })?;
        }
        for seat in &scenario.ai {
            runner.journal(ReplayEntry::JoinAi(seat.profile()?))?;
        }
        info!(scenario = %scenario.name, seed, "Runner ready");
        Ok(runner)
    }

    /// The game being run.
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The session journal, if still recording.
    pub const fn replay(&self) -> Option<&Replay> {
        self.journal.as_ref()
    }

    /// Read commands from `input` until `quit` or end of input, writing one
    /// response per line to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write!(output, "{}", Response::ready(self.game.round()).to_json_line())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (responses, quit) = match Command::from_json(line) {
                Ok(cmd) => self.handle(cmd),
                Err(e) => (vec![Response::error(format!("Parse error: {e}"), None)], false),
            };
            for response in &responses {
                write!(output, "{}", response.to_json_line())?;
            }
            output.flush()?;

            if quit {
                return Ok(());
            }
        }

        self.finish();
        Ok(())
    }

    /// Handle one command, returning its responses and whether to quit.
    pub fn handle(&mut self, cmd: Command) -> (Vec<Response>, bool) {
        let name = cmd.name();
        debug!(cmd = name, round = self.game.round(), "Handling command");

        let outcome = match cmd {
            Command::Quit => {
                self.finish();
                return (vec![Response::Bye], true);
            }
            Command::Join { player, colony } => self
                .journal(ReplayEntry::JoinHuman { player, colony })
                .map(|()| self.joined()),
            Command::JoinAi { profile } => {
                let profile_name = profile.as_deref().unwrap_or("balanced");
                match AiProfile::preset(profile_name) {
                    Some(profile) => self
                        .journal(ReplayEntry::JoinAi(profile))
                        .map(|()| self.joined()),
                    None => Err(GameError::Configuration(format!(
                        "Unknown AI profile: {profile_name}"
                    ))),
                }
            }
            Command::Breed { colony, torbs } => {
                let colony = ColonyId(colony);
                self.game.resolve_tags(colony, &torbs).and_then(|ids| match ids[..] {
                    [a, b] => self.issue(colony, ColonyCommand::Breed { a, b }, name),
                    _ => Err(GameError::InvalidOrder(format!(
                        "breeding needs exactly two torbs, got {}",
                        ids.len()
                    ))),
                })
            }
            Command::Assign {
                colony,
                torbs,
                action,
            } => {
                let colony = ColonyId(colony);
                self.game.resolve_tags(colony, &torbs).and_then(|torbs| {
                    self.issue(colony, ColonyCommand::Assign { torbs, action }, name)
                })
            }
            Command::Scout { colony, target } => self.issue(
                ColonyId(colony),
                ColonyCommand::Scout {
                    target: target.map(ColonyId),
                },
                name,
            ),
            Command::Attack { colony, target } => self.issue(
                ColonyId(colony),
                ColonyCommand::Attack {
                    target: target.map(ColonyId),
                },
                name,
            ),
            Command::EndTurn { colony } => {
                self.issue(ColonyId(colony), ColonyCommand::EndTurn, name)
            }
            Command::Advance { rounds } => self.advance(rounds),
            Command::Query { colony: None } => Ok(vec![self.state()]),
            Command::Query {
                colony: Some(colony),
            } => self.game.colony(ColonyId(colony)).map(|c| {
                vec![Response::Colony {
                    colony: ColonyDetail::of(c, self.game.config().army.stat_precision),
                }]
            }),
            Command::Chronicle { colony, round } => {
                let colony = ColonyId(colony);
                self.game.colony(colony).map(|_| {
                    let chronicle = self.game.chronicle();
                    let entries = match round {
                        Some(round) => chronicle.for_round(colony, round).cloned().collect(),
                        None => chronicle.for_colony(colony).cloned().collect(),
                    };
                    vec![Response::Chronicle { entries }]
                })
            }
            Command::Report { colony } => {
                self.game.scout_report(ColonyId(colony)).map(|lines| {
                    vec![Response::ScoutReport { colony, lines }]
                })
            }
            Command::Hash => Ok(vec![Response::StateHash {
                round: self.game.round(),
                hash: self.game.state_hash(),
            }]),
            Command::Save { path } => self.game.save(&path).map(|()| vec![Response::ack(name)]),
            Command::Load { path } => Game::load(&path).map(|game| {
                self.game = game;
                if self.journal.take().is_some() {
                    warn!(path = %path, "Loaded a snapshot, session recording stopped");
                }
                vec![Response::ack(name)]
            }),
        };

        match outcome {
            Ok(responses) => (responses, false),
            Err(err) => {
                debug!(cmd = name, error = %err, "Command refused");
                (vec![Response::error(err.to_string(), Some(name))], false)
            }
        }
    }

    /// Apply a journal entry to the game, recording it if accepted.
    fn journal(&mut self, entry: ReplayEntry) -> Result<()> {
        match self.journal.as_mut() {
            Some(journal) => journal.apply_and_record(&mut self.game, entry),
            None => entry.apply(&mut self.game),
        }
    }

    fn joined(&self) -> Vec<Response> {
        self.game
            .colonies()
            .last()
            .map(|c| Response::Joined {
                colony: c.id.0,
                name: c.name.clone(),
            })
            .into_iter()
            .collect()
    }

    /// Issue a colony command; acknowledges it and reports a resolved round.
    fn issue(&mut self, colony: ColonyId, command: ColonyCommand, name: &str) -> Result<Vec<Response>> {
        let report = GamePlayerFacade::new(&mut self.game, colony)?.issue(command.clone())?;
        if let Some(journal) = self.journal.as_mut() {
            journal.record(ReplayEntry::Command { colony, command });
        }
        let mut responses = vec![Response::ack(name)];
        if let Some(report) = report {
            self.push_round(&mut responses, report);
        }
        Ok(responses)
    }

    fn advance(&mut self, rounds: u32) -> Result<Vec<Response>> {
        let mut responses = Vec::new();
        for _ in 0..rounds {
            let report = self.game.advance_ai_round()?;
            if let Some(journal) = self.journal.as_mut() {
                journal.record(ReplayEntry::AdvanceAi);
            }
            self.push_round(&mut responses, report);
        }
        Ok(responses)
    }

    fn push_round(&self, responses: &mut Vec<Response>, report: RoundReport) {
        responses.push(Response::Round { report });
        if self.config.auto_state {
            responses.push(self.state());
        }
    }

    fn state(&self) -> Response {
        Response::State {
            round: self.game.round(),
            hash: self.game.state_hash(),
            unready: self.game.unready().into_iter().map(|c| c.0).collect(),
            colonies: self.game.summaries(),
        }
    }

    /// Finalize the journal and write it out if a record path is set.
    fn finish(&mut self) {
        let Some(journal) = self.journal.as_mut() else {
            return;
        };
        journal.finalize(&self.game);
        if let Some(path) = &self.config.record_path {
            match journal.save(path) {
                Ok(()) => info!(path = %path.display(), entries = journal.len(), "Replay saved"),
                Err(err) => warn!(path = %path.display(), error = %err, "Failed to save replay"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(runner: &mut HeadlessRunner, lines: &[&str]) -> Vec<Response> {
        let input = lines.join("\n");
        let mut output = Vec::new();
        runner.run(Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn runner() -> HeadlessRunner {
        HeadlessRunner::new(GameConfig::with_seed(42)).unwrap()
    }

    #[test]
    fn test_ready_then_bye() {
        let responses = session(&mut runner(), &[r#"{"cmd":"quit"}"#, r#"{"cmd":"hash"}"#]);
        assert_eq!(responses, vec![Response::ready(0), Response::Bye]);
    }

    #[test]
    fn test_parse_error_keeps_running() {
        let responses = session(&mut runner(), &["not json", r#"{"cmd":"hash"}"#]);
        assert!(matches!(responses[1], Response::Error { cmd: None, .. }));
        assert!(matches!(responses[2], Response::StateHash { round: 0, .. }));
    }

    #[test]
    fn test_join_and_play_a_round() {
        let responses = session(
            &mut runner(),
            &[
                r#"{"cmd":"join","player":"alice","colony":"Alicetown"}"#,
                r#"{"cmd":"join_ai","profile":"aggressive"}"#,
                r#"{"cmd":"breed","colony":0,"torbs":"00-01, 00-02"}"#,
                r#"{"cmd":"end_turn","colony":0}"#,
            ],
        );
        assert_eq!(
            responses[1],
            Response::Joined {
                colony: 0,
                name: "Alicetown".to_string()
            }
        );
        assert!(matches!(responses[2], Response::Joined { colony: 1, .. }));
        assert_eq!(responses[3], Response::ack("breed"));
        assert_eq!(responses[4], Response::ack("end_turn"));
        match &responses[5] {
            Response::Round { report } => {
                assert_eq!(report.round, 1);
                assert_eq!(report.colonies.len(), 2);
            }
            other => panic!("expected round report, got {other:?}"),
        }
    }

    #[test]
    fn test_refused_commands_are_not_journaled() {
        let mut runner = runner();
        let (responses, _) = runner.handle(Command::Join {
            player: "alice".to_string(),
            colony: "Alicetown".to_string(),
        });
        assert!(matches!(responses[0], Response::Joined { .. }));

        let (responses, _) = runner.handle(Command::Breed {
            colony: 0,
            torbs: "00-01".to_string(),
        });
        assert!(matches!(responses[0], Response::Error { .. }));
        let (responses, _) = runner.handle(Command::Scout {
            colony: 0,
            target: Some(9),
        });
        assert!(matches!(responses[0], Response::Error { .. }));

        assert_eq!(runner.replay().map(Replay::len), Some(1));
    }

    #[test]
    fn test_advance_refused_while_human_unready() {
        let mut runner = runner();
        runner.handle(Command::Join {
            player: "alice".to_string(),
            colony: "Alicetown".to_string(),
        });
        let (responses, quit) = runner.handle(Command::Advance { rounds: 3 });
        assert!(!quit);
        assert!(matches!(responses[0], Response::Error { .. }));
        assert_eq!(runner.game().round(), 0);
    }

    #[test]
    fn test_auto_state_after_rounds() {
        let config = HeadlessConfig {
            auto_state: true,
            record_path: None,
        };
        let mut runner =
            HeadlessRunner::from_scenario(&Scenario::skirmish_1v1(), 5, config).unwrap();
        let (responses, _) = runner.handle(Command::Advance { rounds: 2 });
        assert_eq!(responses.len(), 4);
        assert!(matches!(responses[1], Response::State { round: 1, .. }));
        assert!(matches!(responses[3], Response::State { round: 2, .. }));
    }

    #[test]
    fn test_recorded_session_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.replay");
        let config = HeadlessConfig {
            auto_state: false,
            record_path: Some(path.clone()),
        };
        let mut runner =
            HeadlessRunner::from_scenario(&Scenario::skirmish_1v1(), 8, config).unwrap();
        session(
            &mut runner,
            &[r#"{"cmd":"advance","rounds":5}"#, r#"{"cmd":"quit"}"#],
        );

        let replay = Replay::load(&path).unwrap();
        assert_eq!(replay.final_round, 5);
        assert_eq!(replay.final_hash, runner.game().state_hash());
        let mut player = hereditus_core::replay::ReplayPlayer::new(replay).unwrap();
        assert!(player.verify().unwrap());
    }

    #[test]
    fn test_load_stops_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.bin");
        let mut runner =
            HeadlessRunner::from_scenario(&Scenario::skirmish_1v1(), 3, HeadlessConfig::default())
                .unwrap();
        let path = path.to_string_lossy().to_string();
        let (responses, _) = runner.handle(Command::Save { path: path.clone() });
        assert_eq!(responses, vec![Response::ack("save")]);
        runner.handle(Command::Advance { rounds: 2 });

        let (responses, _) = runner.handle(Command::Load { path });
        assert_eq!(responses, vec![Response::ack("load")]);
        assert_eq!(runner.game().round(), 0);
        assert!(runner.replay().is_none());
    }

    #[test]
    fn test_chronicle_and_query() {
        let mut runner = runner();
        runner.handle(Command::Join {
            player: "alice".to_string(),
            colony: "Alicetown".to_string(),
        });
        let (responses, _) = runner.handle(Command::Chronicle {
            colony: 0,
            round: None,
        });
        match &responses[0] {
            Response::Chronicle { entries } => {
                assert!(entries.iter().any(|e| e.text.contains("Welcome to Hereditus!")));
            }
            other => panic!("expected chronicle, got {other:?}"),
        }

        let (responses, _) = runner.handle(Command::Query { colony: Some(0) });
        match &responses[0] {
            Response::Colony { colony } => {
                assert_eq!(colony.summary.name, "Alicetown");
                assert!(!colony.ready);
                assert_eq!(colony.torbs.len(), 4);
            }
            other => panic!("expected colony detail, got {other:?}"),
        }
    }
}
