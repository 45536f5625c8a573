//! Name pools for torbs and AI colonies.

use rand::seq::SliceRandom;
use rand::Rng;

/// Names handed to new torbs.
pub const TORB_NAMES: &[&str] = &[
    "Aahl", "Abry", "Acla", "Adz", "Aev", "Aft", "Agor", "Ahm", "Aix", "Ajr", "Ake", "Alaz", "Amo",
    "Ant", "Aolt", "Apra", "Aquu", "Arr", "Asmo", "Atby", "Augo", "Avo", "Awre", "Axad", "Ayo",
    "Azzy", "Bahl", "Bek", "Bilo", "Brum", "Buzz", "Cato", "Crim", "Dov", "Drez", "Eelo", "Emba",
    "Fenn", "Flic", "Gorp", "Grib", "Hask", "Hoot", "Ilk", "Isso", "Jabo", "Jex", "Kell", "Krun",
    "Lomb", "Lutz", "Mabb", "Mirk", "Nob", "Nuzz", "Oddo", "Orl", "Pim", "Plok", "Quib", "Rasp",
    "Roon", "Skib", "Snor", "Tibb", "Trov", "Ulm", "Urgo", "Vink", "Voss", "Wub", "Wynn", "Xeb",
    "Yarl", "Yipp", "Zed", "Zorb",
];

/// Themed name pools for AI colonies.
pub const AI_COLONY_NAMES: &[(&str, &[&str])] = &[
    (
        "weak",
        &[
            "Fragileton",
            "Faintville",
            "Droughttown",
            "Foodfree",
            "Weaklings",
            "Scraplings",
            "Brittleburg",
            "Meekshire",
            "Tenderland",
        ],
    ),
    (
        "strong",
        &[
            "Bulkland",
            "Gainstown",
            "Lifters",
            "Pressers",
            "Giants",
            "Ironhold",
            "Steelhaven",
            "Rockgard",
            "Fortitude",
        ],
    ),
    (
        "aggressive",
        &[
            "Chasers",
            "Romans",
            "Barbarians",
            "Warland",
            "Furytown",
            "Raidridge",
            "Blitzville",
            "Strikefield",
        ],
    ),
    (
        "passive",
        &[
            "Sleepers",
            "Sleepyville",
            "Watchers",
            "Waiters",
            "Observers",
            "Quietude",
            "Peaceville",
            "Calmharbor",
            "Breezefield",
        ],
    ),
    (
        "retributive",
        &[
            "Elephants",
            "Brutusites",
            "Backtoyou",
            "Postals",
            "Grudgehaven",
            "Vengefort",
        ],
    ),
];

/// Attempts at drawing an unused AI colony name before falling back.
pub const MAX_NAME_ATTEMPTS: usize = 10;

/// A random torb name.
pub fn torb_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TORB_NAMES.choose(rng).copied().unwrap_or("Nonam")
}

/// A random AI colony name: a random theme, then a random name from it.
pub fn ai_colony_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    AI_COLONY_NAMES
        .choose(rng)
        .and_then(|(_, pool)| pool.choose(rng))
        .copied()
        .unwrap_or("Colony")
}

/// An AI colony name not already in `taken`.
///
/// Draws up to [`MAX_NAME_ATTEMPTS`] times, then numbers the last draw.
pub fn unique_ai_colony_name<R: Rng + ?Sized>(taken: &[&str], rng: &mut R) -> String {
    let mut name = ai_colony_name(rng);
    for _ in 1..MAX_NAME_ATTEMPTS {
        if !taken.contains(&name) {
            return name.to_string();
        }
        name = ai_colony_name(rng);
    }
    if !taken.contains(&name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{name} {n}"))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_torb_name_from_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(TORB_NAMES.contains(&torb_name(&mut rng)));
    }

    #[test]
    fn test_unique_name_avoids_taken() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut taken: Vec<String> = Vec::new();
        for _ in 0..60 {
            let refs: Vec<&str> = taken.iter().map(String::as_str).collect();
            let name = unique_ai_colony_name(&refs, &mut rng);
            assert!(!taken.contains(&name));
            taken.push(name);
        }
    }
}
