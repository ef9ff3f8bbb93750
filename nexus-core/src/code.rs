// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short, human-typable access codes used to discover and join entities.
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters an alphanumeric access code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shape of a generated access code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeFormat {
    /// Fixed number of characters from [`CODE_ALPHABET`], for example "K3P9QZ".
    Alphanumeric(usize),

    /// Three uppercase letters followed by a number between 100 and 999, for example "CSE204".
    LettersDigits,
}

impl CodeFormat {
    /// Number of characters of codes in this format.
    pub fn len(&self) -> usize {
        match self {
            CodeFormat::Alphanumeric(len) => *len,
            CodeFormat::LettersDigits => 6,
        }
    }

    /// Returns `true` if codes in this format have no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalized access code: trimmed and uppercase.
///
/// Deserialized codes pass through [`AccessCode::normalize`] as well.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    /// Generate a random code.
    ///
    /// No uniqueness is guaranteed here, collisions with existing codes have to be detected by
    /// the store when inserting the entity.
    pub fn generate<R: Rng>(format: CodeFormat, rng: &mut R) -> Self {
        let code = match format {
            CodeFormat::Alphanumeric(len) => (0..len)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect(),
            CodeFormat::LettersDigits => {
                let mut code: String = (0..3)
                    .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
                    .collect();
                let number: u16 = rng.random_range(100..=999);
                code.push_str(&number.to_string());
                code
            }
        };

        Self(code)
    }

    /// Normalize user input into a code. Returns `None` if nothing is left after trimming.
    ///
    /// Matching codes is case-insensitive through this normalization only, stores compare codes
    /// byte-wise.
    pub fn normalize(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for AccessCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::normalize(&value).ok_or_else(|| serde::de::Error::custom("empty access code"))
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::{AccessCode, CODE_ALPHABET, CodeFormat};

    #[test]
    fn alphanumeric_codes() {
        let mut rng = ChaCha20Rng::from_seed([1; 32]);

        for _ in 0..100 {
            let code = AccessCode::generate(CodeFormat::Alphanumeric(6), &mut rng);
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|byte| CODE_ALPHABET.contains(&byte)));
        }
    }

    #[test]
    fn letters_digits_codes() {
        let mut rng = ChaCha20Rng::from_seed([2; 32]);

        for _ in 0..100 {
            let code = AccessCode::generate(CodeFormat::LettersDigits, &mut rng);
            let (letters, digits) = code.as_str().split_at(3);
            assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
            let number: u16 = digits.parse().unwrap();
            assert!((100..=999).contains(&number));
        }
    }

    #[test]
    fn normalization() {
        assert_eq!(
            AccessCode::normalize("  abc123 \n"),
            AccessCode::normalize("ABC123")
        );
        assert_eq!(AccessCode::normalize("abc123").unwrap().as_str(), "ABC123");
        assert!(AccessCode::normalize("   ").is_none());
        assert!(AccessCode::normalize("").is_none());
    }

    #[test]
    fn deserialized_codes_are_normalized() {
        let code: AccessCode = serde_json::from_str("\" k3p9qz \"").unwrap();
        assert_eq!(code.as_str(), "K3P9QZ");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"K3P9QZ\"");

        assert!(serde_json::from_str::<AccessCode>("\"  \"").is_err());
        assert!(serde_json::from_str::<AccessCode>("\"\"").is_err());
    }
}
