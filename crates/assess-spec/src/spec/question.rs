use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Length bounds for free-text questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl TextValidation {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none() && self.max_length.is_none()
    }
}

/// Inclusive numeric bounds for numeric questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NumericValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericValidation {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Type-specific payload of a question, keyed by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    ShortText {
        #[serde(default, skip_serializing_if = "TextValidation::is_empty")]
        validation: TextValidation,
    },
    LongText {
        #[serde(default, skip_serializing_if = "TextValidation::is_empty")]
        validation: TextValidation,
    },
    SingleChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    MultiChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    Numeric {
        #[serde(default, skip_serializing_if = "NumericValidation::is_empty")]
        validation: NumericValidation,
    },
    FileUpload,
}

impl QuestionKind {
    /// Wire label of the variant, identical to the `type` tag.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::ShortText { .. } => "short-text",
            QuestionKind::LongText { .. } => "long-text",
            QuestionKind::SingleChoice { .. } => "single-choice",
            QuestionKind::MultiChoice { .. } => "multi-choice",
            QuestionKind::Numeric { .. } => "numeric",
            QuestionKind::FileUpload => "file-upload",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::SingleChoice { options } | QuestionKind::MultiChoice { options } => {
                options
            }
            _ => &[],
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoice { .. } | QuestionKind::MultiChoice { .. }
        )
    }

    pub fn text_validation(&self) -> Option<&TextValidation> {
        match self {
            QuestionKind::ShortText { validation } | QuestionKind::LongText { validation } => {
                Some(validation)
            }
            _ => None,
        }
    }

    pub fn numeric_validation(&self) -> Option<&NumericValidation> {
        match self {
            QuestionKind::Numeric { validation } => Some(validation),
            _ => None,
        }
    }
}

/// Comparison applied by a conditional rule.
///
/// Tags outside the known set deserialize into [`Condition::Unknown`] and
/// never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Equals,
    NotEquals,
    Contains,
    #[serde(other)]
    Unknown,
}

/// Visibility rule tying a question to an earlier answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    /// Positional key (`"{section}-{question}"`) of the controlling question.
    pub depends_on: String,
    pub condition: Condition,
    #[serde(default)]
    pub value: String,
}

/// One question of an assessment section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            required: false,
            conditional: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_conditional(
        mut self,
        depends_on: impl Into<String>,
        condition: Condition,
        value: impl Into<String>,
    ) -> Self {
        self.conditional = Some(Conditional {
            depends_on: depends_on.into(),
            condition,
            value: value.into(),
        });
        self
    }
}
