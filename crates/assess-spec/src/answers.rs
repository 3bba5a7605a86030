use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::QuestionKey;

/// Raw answer for one question.
///
/// Text, numeric, single-choice and file-upload questions answer with a
/// string; multi-choice questions answer with the ordered list of selected
/// options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Choices(choices) => choices.is_empty(),
        }
    }

    /// String form used for comparisons: lists join with `","`.
    pub fn coerce_to_string(&self) -> Cow<'_, str> {
        match self {
            AnswerValue::Text(text) => Cow::Borrowed(text),
            AnswerValue::Choices(choices) => Cow::Owned(choices.join(",")),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::Choices(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::Choices(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::Choices(value.into_iter().map(String::from).collect())
    }
}

/// Answers of one fill session, keyed by positional question key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<QuestionKey, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QuestionKey) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    /// Answer for `key` when present and non-empty.
    pub fn answered(&self, key: &QuestionKey) -> Option<&AnswerValue> {
        self.values.get(key).filter(|value| !value.is_empty())
    }

    pub fn insert(
        &mut self,
        key: QuestionKey,
        value: impl Into<AnswerValue>,
    ) -> Option<AnswerValue> {
        self.values.insert(key, value.into())
    }

    pub fn with(mut self, key: QuestionKey, value: impl Into<AnswerValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &QuestionKey) -> Option<AnswerValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &QuestionKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionKey, &AnswerValue)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &QuestionKey> {
        self.values.keys()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

impl FromIterator<(QuestionKey, AnswerValue)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (QuestionKey, AnswerValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Violation reported for one question during submission validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub key: QuestionKey,
    pub question_id: String,
    pub message: String,
    pub code: String,
}

/// Outcome of validating a complete answer set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub missing_required: Vec<QuestionKey>,
    #[serde(default)]
    pub unknown_keys: Vec<QuestionKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_values() {
        assert!(AnswerValue::from("").is_empty());
        assert!(AnswerValue::Choices(Vec::new()).is_empty());
        assert!(!AnswerValue::from(" ").is_empty());
        assert!(!AnswerValue::from(vec!["A"]).is_empty());
    }

    #[test]
    fn choices_coerce_to_joined_string() {
        let value = AnswerValue::from(vec!["Rust", "Go"]);
        assert_eq!(value.coerce_to_string(), "Rust,Go");
    }

    #[test]
    fn answer_set_uses_string_keys_on_the_wire() {
        let answers = AnswerSet::new()
            .with(QuestionKey::new(0, 0), "Yes")
            .with(QuestionKey::new(1, 2), vec!["A", "B"]);
        let value = serde_json::to_value(&answers).unwrap();
        assert_eq!(value, json!({ "0-0": "Yes", "1-2": ["A", "B"] }));
    }

    #[test]
    fn answer_set_survives_cbor() {
        let answers = AnswerSet::new()
            .with(QuestionKey::new(0, 1), "42")
            .with(QuestionKey::new(0, 3), vec!["x"]);
        let bytes = answers.to_cbor().unwrap();
        assert_eq!(AnswerSet::from_cbor(&bytes).unwrap(), answers);
    }
}
