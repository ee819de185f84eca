//! Random display names, e.g. "SwiftTiger42"

use rand::seq::SliceRandom;
use rand::Rng;

pub const ADJECTIVES: [&str; 30] = [
    "Swift", "Mighty", "Blazing", "Iron", "Golden", "Silver", "Thunder", "Lightning", "Cosmic",
    "Epic", "Fierce", "Bold", "Brave", "Wild", "Rapid", "Power", "Super", "Ultra", "Mega",
    "Turbo", "Hyper", "Alpha", "Prime", "Elite", "Pro", "Zen", "Cool", "Rad", "Ace", "Star",
];

pub const NOUNS: [&str; 30] = [
    "Runner", "Cyclist", "Swimmer", "Athlete", "Champion", "Racer", "Sprinter", "Tiger", "Eagle",
    "Falcon", "Phoenix", "Dragon", "Wolf", "Bear", "Lion", "Shark", "Panther", "Hawk", "Cheetah",
    "Gazelle", "Dolphin", "Otter", "Ninja", "Warrior", "Legend", "Hero", "Titan", "Force",
    "Storm", "Flash",
];

/// Generate a display name from the thread-local RNG.
///
/// Names are not deduplicated across users.
pub fn generate_display_name() -> String {
    generate_display_name_with(&mut rand::thread_rng())
}

/// Generate a display name from the given RNG
pub fn generate_display_name_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Swift");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Runner");
    let number: u8 = rng.gen_range(10..=99);
    format!("{adjective}{noun}{number}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn split_name(name: &str) -> (&str, &str, u32) {
        let digits = name.len() - 2;
        let (words, number) = name.split_at(digits);
        let adjective = ADJECTIVES
            .iter()
            .copied()
            .find(|a| words.starts_with(*a))
            .expect("known adjective");
        let noun = &words[adjective.len()..];
        (adjective, noun, number.parse().expect("two digits"))
    }

    #[test]
    fn test_word_lists_have_thirty_unique_entries() {
        for list in [&ADJECTIVES, &NOUNS] {
            let mut words = list.to_vec();
            words.sort_unstable();
            words.dedup();
            assert_eq!(words.len(), 30);
        }
    }

    #[test]
    fn test_generated_name_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let name = generate_display_name_with(&mut rng);
            let (_, noun, number) = split_name(&name);
            assert!(NOUNS.contains(&noun), "unexpected noun in {name}");
            assert!((10..=99).contains(&number), "unexpected number in {name}");
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_display_name_with(&mut StdRng::seed_from_u64(42));
        let b = generate_display_name_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_thread_rng_generation() {
        assert!(generate_display_name().len() >= 6);
    }
}
