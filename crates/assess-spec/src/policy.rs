use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a multi-choice dependency answer is compared against a rule value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MultiChoiceMatch {
    /// Selected options joined with `","` and compared as one string.
    #[default]
    Joined,
    /// Each selected option is compared on its own.
    AnyOption,
}

/// Knobs for the form reactor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnginePolicy {
    #[serde(default)]
    pub multi_choice_match: MultiChoiceMatch,
    /// Re-validate retained answers when a question becomes visible again.
    #[serde(default)]
    pub revalidate_on_reveal: bool,
    /// Treat answers of hidden questions as absent when resolving dependents.
    #[serde(default)]
    pub cascade_hidden: bool,
}
