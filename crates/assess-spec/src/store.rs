//! In-memory assessment store keyed by job id.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::answers::{AnswerSet, ValidationResult};
use crate::policy::EnginePolicy;
use crate::spec::assessment::{Assessment, Section};
use crate::validate::validate_answers;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("assessment for job '{0}' not found")]
    NotFound(String),
    #[error("answers for job '{job_id}' failed validation")]
    InvalidSubmission {
        job_id: String,
        result: ValidationResult,
    },
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Partial update applied by [`AssessmentStore::put`]; absent fields keep
/// their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
}

impl From<Assessment> for AssessmentDraft {
    fn from(assessment: Assessment) -> Self {
        Self {
            title: Some(assessment.title),
            sections: Some(assessment.sections),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    Created(Assessment),
    Updated(Assessment),
}

impl PutOutcome {
    pub fn assessment(&self) -> &Assessment {
        match self {
            PutOutcome::Created(assessment) | PutOutcome::Updated(assessment) => assessment,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, PutOutcome::Created(_))
    }
}

/// Answers accepted for a job's assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub assessment_id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub responses: AnswerSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentStore {
    #[serde(default)]
    assessments: BTreeMap<String, Assessment>,
    #[serde(default)]
    submissions: Vec<Submission>,
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &str) -> Option<&Assessment> {
        self.assessments.get(job_id)
    }

    /// Assessments whose title contains `search` (case-insensitive), newest
    /// first. Records without a creation time sort last.
    pub fn list(&self, search: Option<&str>) -> Vec<&Assessment> {
        let needle = search
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);
        let mut matches = self
            .assessments
            .values()
            .filter(|assessment| match &needle {
                Some(needle) => assessment.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// Creates the job's assessment or merges `draft` into the stored one.
    pub fn put(&mut self, job_id: &str, draft: AssessmentDraft) -> PutOutcome {
        let now = Utc::now();
        if let Some(existing) = self.assessments.get_mut(job_id) {
            if let Some(title) = draft.title {
                existing.title = title;
            }
            if let Some(sections) = draft.sections {
                existing.sections = sections;
            }
            existing.updated_at = Some(now);
            info!(job_id, assessment_id = %existing.id, "assessment updated");
            return PutOutcome::Updated(existing.clone());
        }

        let assessment = Assessment {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            title: draft.title.unwrap_or_default(),
            sections: draft.sections.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        info!(job_id, assessment_id = %assessment.id, "assessment created");
        self.assessments
            .insert(job_id.to_string(), assessment.clone());
        PutOutcome::Created(assessment)
    }

    pub fn delete(&mut self, job_id: &str) -> Result<Assessment, StoreError> {
        let removed = self
            .assessments
            .remove(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        info!(job_id, assessment_id = %removed.id, "assessment deleted");
        Ok(removed)
    }

    /// Records a candidate's answers once they pass validation.
    pub fn submit(
        &mut self,
        job_id: &str,
        candidate_id: &str,
        answers: AnswerSet,
        policy: &EnginePolicy,
    ) -> Result<&Submission, StoreError> {
        let assessment = self
            .assessments
            .get(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        let result = validate_answers(assessment, &answers, policy);
        if !result.valid {
            return Err(StoreError::InvalidSubmission {
                job_id: job_id.to_string(),
                result,
            });
        }

        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment.id.clone(),
            job_id: job_id.to_string(),
            candidate_id: candidate_id.to_string(),
            responses: answers,
            submitted_at: Some(Utc::now()),
        };
        info!(job_id, candidate_id, submission_id = %submission.id, "submission recorded");
        self.submissions.push(submission);
        Ok(&self.submissions[self.submissions.len() - 1])
    }

    pub fn submissions(&self, job_id: &str) -> impl Iterator<Item = &Submission> {
        self.submissions
            .iter()
            .filter(move |submission| submission.job_id == job_id)
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    /// Loads a snapshot; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
