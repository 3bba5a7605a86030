use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::key::QuestionKey;
use crate::spec::question::Question;

/// Ordered group of questions with a heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            questions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }
}

/// Assessment attached to a single job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Empty until the store assigns one on first save.
    #[serde(default)]
    pub id: String,
    pub job_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assessment {
    pub fn new(job_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            job_id: job_id.into(),
            title: title.into(),
            sections: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Every question paired with its positional key, in document order.
    pub fn questions(&self) -> impl Iterator<Item = (QuestionKey, &Question)> + '_ {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section_index, section)| {
                section
                    .questions
                    .iter()
                    .enumerate()
                    .map(move |(question_index, question)| {
                        (QuestionKey::new(section_index, question_index), question)
                    })
            })
    }

    pub fn question(&self, key: QuestionKey) -> Option<&Question> {
        self.sections
            .get(key.section)
            .and_then(|section| section.questions.get(key.question))
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.questions.len())
            .sum()
    }
}
