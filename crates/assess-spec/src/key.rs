use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("question key pattern is valid"));

/// Positional address of a question: `"{sectionIndex}-{questionIndex}"`.
///
/// Answers, visibility, errors and `conditional.dependsOn` all share this key
/// space. Ordering follows document order (section first, then question).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionKey {
    pub section: usize,
    pub question: usize,
}

impl QuestionKey {
    pub const fn new(section: usize, question: usize) -> Self {
        Self { section, question }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a question key (expected \"<section>-<question>\")")]
pub struct KeyParseError(pub String);

impl FromStr for QuestionKey {
    type Err = KeyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let captures = KEY_PATTERN
            .captures(raw)
            .ok_or_else(|| KeyParseError(raw.to_string()))?;
        let section = captures[1]
            .parse()
            .map_err(|_| KeyParseError(raw.to_string()))?;
        let question = captures[2]
            .parse()
            .map_err(|_| KeyParseError(raw.to_string()))?;
        Ok(Self { section, question })
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.section, self.question)
    }
}

impl Serialize for QuestionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuestionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_keys() {
        assert_eq!("0-0".parse::<QuestionKey>(), Ok(QuestionKey::new(0, 0)));
        assert_eq!("12-3".parse::<QuestionKey>(), Ok(QuestionKey::new(12, 3)));
    }

    #[test]
    fn rejects_non_positional_ids() {
        for raw in ["", "0", "0-", "-1", "a-b", "+1-2", "0-0-0", " 0-0", "section-0"] {
            assert!(raw.parse::<QuestionKey>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn orders_by_document_position() {
        assert!(QuestionKey::new(0, 5) < QuestionKey::new(1, 0));
        assert!(QuestionKey::new(1, 0) < QuestionKey::new(1, 1));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&QuestionKey::new(2, 7)).unwrap();
        assert_eq!(json, "\"2-7\"");
        let key: QuestionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, QuestionKey::new(2, 7));
    }
}
