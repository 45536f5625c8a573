//! Reproducibility checks for whole games.
//!
//! A game is a pure function of its config, its seed and the commands fed
//! to it. The helpers here replay the same setup more than once and compare
//! [`Game::state_hash`] values. Things that break that promise and show up
//! here first: a draw taken from anything but the game's `ChaCha8Rng`, an
//! iteration over a `HashMap`, and a snapshot that forgets the RNG position.

use std::thread;

use hereditus_core::game::Game;

/// Final hashes of repeated runs of one setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHashes {
    /// One hash per run, in run order.
    pub hashes: Vec<u64>,
    /// Rounds (or steps) each run advanced.
    pub rounds: u64,
}

impl RunHashes {
    /// True when every run ended on the same hash.
    pub fn agree(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Distinct hashes, sorted.
    #[must_use]
    pub fn distinct(&self) -> Vec<u64> {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct
    }

    /// # Panics
    ///
    /// Panics listing every hash when the runs disagree.
    pub fn assert_agree(&self) {
        assert!(
            self.agree(),
            "{} runs of {} rounds ended on {} different hashes: {:?}",
            self.hashes.len(),
            self.rounds,
            self.distinct().len(),
            self.hashes
        );
    }
}

/// Build a fresh state `runs` times, step it `rounds` times and hash it.
pub fn repeat_runs<S>(
    runs: usize,
    rounds: u64,
    build: impl Fn() -> S,
    step: impl Fn(&mut S),
    hash: impl Fn(&S) -> u64,
) -> RunHashes {
    let hashes = (0..runs)
        .map(|_| {
            let mut state = build();
            (0..rounds).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();
    RunHashes { hashes, rounds }
}

fn advance(game: &mut Game) {
    if let Err(err) = game.advance_ai_round() {
        tracing::warn!(error = %err, round = game.round(), "Round refused");
    }
}

/// Play an AI-only game twice from `setup` and compare the final hashes.
///
/// ```ignore
/// use hereditus_test_utils::determinism::verify_game_determinism;
/// use hereditus_test_utils::fixtures::ai_game;
/// use hereditus_core::prelude::AiProfile;
///
/// assert!(verify_game_determinism(
///     || ai_game(7, &[AiProfile::balanced(), AiProfile::aggressive()]),
///     25,
/// ));
/// ```
pub fn verify_game_determinism(setup: impl Fn() -> Game, rounds: u64) -> bool {
    repeat_runs(2, rounds, setup, advance, Game::state_hash).agree()
}

/// Play `games` copies of one setup on scoped threads at the same time.
pub fn run_parallel_games<F>(setup: F, games: usize, rounds: u64) -> RunHashes
where
    F: Fn() -> Game + Sync,
{
    let hashes = thread::scope(|scope| {
        let workers: Vec<_> = (0..games)
            .map(|_| {
                scope.spawn(|| {
                    let mut game = setup();
                    (0..rounds).for_each(|_| advance(&mut game));
                    game.state_hash()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("game thread panicked"))
            .collect()
    });
    RunHashes { hashes, rounds }
}

/// First round after which two copies of `setup` hash differently.
///
/// `Some(0)` means they differ before any round is played.
pub fn find_first_divergence(setup: impl Fn() -> Game, rounds: u64) -> Option<u64> {
    let (mut left, mut right) = (setup(), setup());
    if left.state_hash() != right.state_hash() {
        return Some(0);
    }
    (1..=rounds).find(|_| {
        advance(&mut left);
        advance(&mut right);
        left.state_hash() != right.state_hash()
    })
}

/// Snapshot after `before` rounds, then check the restored copy keeps
/// pace with the original for `after` more rounds.
pub fn verify_snapshot_determinism(setup: impl Fn() -> Game, before: u64, after: u64) -> bool {
    let mut game = setup();
    (0..before).for_each(|_| advance(&mut game));

    let restored = game.to_bytes().ok().and_then(|bytes| Game::from_bytes(&bytes).ok());
    let Some(mut restored) = restored else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    for _ in 0..after {
        advance(&mut game);
        advance(&mut restored);
    }
    restored.state_hash() == game.state_hash()
}

/// Proptest strategies for determinism and rule testing.
pub mod strategies {
    use hereditus_core::ai::AiProfile;
    use hereditus_core::config::{GameConfig, MoraleCheck};
    use hereditus_core::genetics::{Gene, Genome, COMBAT_GENES};
    use proptest::prelude::*;

    /// Any game seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// An allele value in the range founders are drawn from.
    pub fn arb_allele() -> impl Strategy<Value = f64> {
        1.0f64..20.0f64
    }

    /// A gene with `len` alleles.
    pub fn arb_gene(len: usize) -> impl Strategy<Value = Gene> {
        proptest::collection::vec(arb_allele(), len).prop_map(Gene::new)
    }

    /// A genome with every combat gene, `len` alleles each.
    pub fn arb_genome(len: usize) -> impl Strategy<Value = Genome> {
        proptest::collection::vec(arb_gene(len), COMBAT_GENES.len()).prop_map(|genes| {
            COMBAT_GENES
                .iter()
                .map(|name| (*name).to_string())
                .zip(genes)
                .collect()
        })
    }

    /// A fraction or chance in `[0, 1]`.
    pub fn arb_fraction() -> impl Strategy<Value = f64> {
        0.0f64..=1.0f64
    }

    /// Any valid AI profile.
    pub fn arb_ai_profile() -> impl Strategy<Value = AiProfile> {
        (arb_fraction(), arb_fraction(), arb_fraction(), arb_fraction()).prop_map(
            |(breed_fraction, army_fraction, aggression, scout_chance)| AiProfile {
                name: "generated".to_string(),
                breed_fraction,
                army_fraction,
                aggression,
                scout_chance,
            },
        )
    }

    /// Between `min` and `max` (exclusive) AI profiles.
    pub fn arb_ai_lineup(min: usize, max: usize) -> impl Strategy<Value = Vec<AiProfile>> {
        proptest::collection::vec(arb_ai_profile(), min..max)
    }

    /// Morale values across the full range.
    pub fn arb_morale() -> impl Strategy<Value = u8> {
        0u8..=100u8
    }

    /// Food stock values.
    pub fn arb_food() -> impl Strategy<Value = u32> {
        0u32..50u32
    }

    /// A valid game config with a random seed and morale mode.
    pub fn arb_game_config() -> impl Strategy<Value = GameConfig> {
        (arb_seed(), any::<bool>(), any::<bool>(), 1usize..4usize).prop_map(
            |(seed, shuffle, per_battle, alleles)| {
                let mut config = GameConfig::with_seed(seed);
                config.shuffle_colony_order = shuffle;
                config.evolution.alleles_per_gene = alleles;
                config.army.morale_check = if per_battle {
                    MoraleCheck::PerBattle
                } else {
                    MoraleCheck::PerDuel
                };
                config
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{ai_game, ai_game_with};
    use hereditus_core::prelude::AiProfile;
    use proptest::prelude::*;

    fn lineup() -> Vec<AiProfile> {
        vec![
            AiProfile::balanced(),
            AiProfile::aggressive(),
            AiProfile::breeder(),
        ]
    }

    #[test]
    fn test_counter_runs_agree() {
        let result = repeat_runs(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.agree());
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_leaky_setup_disagrees() {
        use std::cell::Cell;
        let counter = Cell::new(0u64);
        let result = repeat_runs(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.agree());
        assert_eq!(result.distinct().len(), 2);
    }

    #[test]
    fn test_ai_game_determinism() {
        assert!(verify_game_determinism(|| ai_game(42, &lineup()), 30));
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| ai_game(3, &lineup()), 20), None);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = ai_game(1, &lineup());
        let b = ai_game(2, &lineup());
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_snapshot_mid_game() {
        assert!(verify_snapshot_determinism(|| ai_game(5, &lineup()), 8, 12));
    }

    #[test]
    fn test_parallel_games_match() {
        let result = run_parallel_games(|| ai_game(11, &lineup()), 4, 15);
        result.assert_agree();
        assert_eq!(result.hashes.len(), 4);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_any_config_replays(config in arb_game_config(), profiles in arb_ai_lineup(1, 4)) {
            prop_assert!(verify_game_determinism(
                || ai_game_with(config.clone(), &profiles),
                6,
            ));
        }

        #[test]
        fn prop_morale_bounded(seed in arb_seed()) {
            let mut game = ai_game(seed, &[AiProfile::aggressive(), AiProfile::aggressive()]);
            for _ in 0..10 {
                game.advance_ai_round().unwrap();
            }
            for colony in game.colonies() {
                prop_assert!(colony.army.morale <= 100);
            }
        }
    }
}
