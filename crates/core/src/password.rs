//! Batch password generation.
//!
//! This is a convenience generator: callers pass in any [`rand::Rng`] and no
//! cryptographic guarantee is made about the output.

use rand::Rng;
use serde::Serialize;

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const NUMBERS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+[]{}|;:,.<>?";

/// Candidates produced per generation.
pub const BATCH_SIZE: usize = 10;
pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("Select at least one character type")]
    NoCharacterClass,

    #[error("Password length must be between 4 and 32, got {0}")]
    InvalidLength(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordOptions {
    pub length: usize,
    pub include_lowercase: bool,
    pub include_uppercase: bool,
    pub include_numbers: bool,
    pub include_symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 8,
            include_lowercase: true,
            include_uppercase: true,
            include_numbers: true,
            include_symbols: true,
        }
    }
}

impl PasswordOptions {
    /// The enabled character classes, in a fixed order.
    fn classes(&self) -> Vec<&'static str> {
        [
            (self.include_lowercase, LOWERCASE),
            (self.include_uppercase, UPPERCASE),
            (self.include_numbers, NUMBERS),
            (self.include_symbols, SYMBOLS),
        ]
        .into_iter()
        .filter_map(|(enabled, set)| enabled.then_some(set))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn label(self) -> &'static str {
        match self {
            Strength::Weak => "Weak",
            Strength::Fair => "Fair",
            Strength::Strong => "Strong",
            Strength::VeryStrong => "Very strong",
        }
    }
}

/// Strength is judged on length alone.
pub fn password_strength(password: &str) -> Strength {
    match password.chars().count() {
        0..=7 => Strength::Weak,
        8..=11 => Strength::Fair,
        12..=15 => Strength::Strong,
        _ => Strength::VeryStrong,
    }
}

fn satisfies(candidate: &str, classes: &[&str]) -> bool {
    classes
        .iter()
        .all(|set| candidate.chars().any(|c| set.contains(c)))
}

/// Generate [`BATCH_SIZE`] passwords, each containing at least one character
/// of every enabled class. Candidates missing a class are thrown away and
/// drawn again.
pub fn generate_passwords<R: Rng>(
    options: &PasswordOptions,
    rng: &mut R,
) -> Result<Vec<String>, PasswordError> {
    let classes = options.classes();
    if classes.is_empty() {
        return Err(PasswordError::NoCharacterClass);
    }
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(PasswordError::InvalidLength(options.length));
    }

    let alphabet: Vec<char> = classes.concat().chars().collect();
    let mut passwords = Vec::with_capacity(BATCH_SIZE);

    while passwords.len() < BATCH_SIZE {
        let candidate: String = (0..options.length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();

        if satisfies(&candidate, &classes) {
            passwords.push(candidate);
        }
    }

    Ok(passwords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_batch_respects_requested_classes() {
        let options = PasswordOptions {
            length: 12,
            include_lowercase: true,
            include_uppercase: true,
            include_numbers: true,
            include_symbols: false,
        };
        let passwords = generate_passwords(&options, &mut rng()).unwrap();

        assert_eq!(passwords.len(), BATCH_SIZE);
        for p in &passwords {
            assert_eq!(p.chars().count(), 12);
            assert!(p.chars().any(|c| c.is_ascii_lowercase()));
            assert!(p.chars().any(|c| c.is_ascii_uppercase()));
            assert!(p.chars().any(|c| c.is_ascii_digit()));
            assert!(!p.chars().any(|c| SYMBOLS.contains(c)));
        }
    }

    #[test]
    fn test_all_classes_at_minimum_length() {
        let options = PasswordOptions {
            length: 4,
            ..PasswordOptions::default()
        };
        for p in generate_passwords(&options, &mut rng()).unwrap() {
            assert!(p.chars().any(|c| SYMBOLS.contains(c)));
            assert!(p.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_single_class() {
        let options = PasswordOptions {
            length: 16,
            include_lowercase: false,
            include_uppercase: false,
            include_numbers: true,
            include_symbols: false,
        };
        for p in generate_passwords(&options, &mut rng()).unwrap() {
            assert!(p.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_no_class_selected() {
        let options = PasswordOptions {
            length: 8,
            include_lowercase: false,
            include_uppercase: false,
            include_numbers: false,
            include_symbols: false,
        };
        assert_eq!(
            generate_passwords(&options, &mut rng()),
            Err(PasswordError::NoCharacterClass)
        );
    }

    #[test]
    fn test_length_out_of_range() {
        for length in [0, 3, 33] {
            let options = PasswordOptions {
                length,
                ..PasswordOptions::default()
            };
            assert_eq!(
                generate_passwords(&options, &mut rng()),
                Err(PasswordError::InvalidLength(length))
            );
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let options = PasswordOptions::default();
        let a = generate_passwords(&options, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = generate_passwords(&options, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(password_strength("abcdefg"), Strength::Weak);
        assert_eq!(password_strength("abcdefgh"), Strength::Fair);
        assert_eq!(password_strength("abcdefghijkl"), Strength::Strong);
        assert_eq!(password_strength(&"a".repeat(16)), Strength::VeryStrong);
        assert_eq!(Strength::VeryStrong.label(), "Very strong");
    }
}
