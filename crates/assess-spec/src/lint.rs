use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::QuestionKey;
use crate::spec::assessment::Assessment;
use crate::spec::question::{Condition, Conditional, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCode {
    InvalidDependency,
    UnknownDependency,
    ForwardDependency,
    IdentifierMismatch,
    EmptyConditionValue,
    UnknownCondition,
    MissingOptions,
    InvertedBounds,
    DuplicateQuestionId,
}

impl LintCode {
    pub fn severity(self) -> Severity {
        match self {
            LintCode::IdentifierMismatch
            | LintCode::EmptyConditionValue
            | LintCode::DuplicateQuestionId => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LintCode::InvalidDependency => "invalid_dependency",
            LintCode::UnknownDependency => "unknown_dependency",
            LintCode::ForwardDependency => "forward_dependency",
            LintCode::IdentifierMismatch => "identifier_mismatch",
            LintCode::EmptyConditionValue => "empty_condition_value",
            LintCode::UnknownCondition => "unknown_condition",
            LintCode::MissingOptions => "missing_options",
            LintCode::InvertedBounds => "inverted_bounds",
            LintCode::DuplicateQuestionId => "duplicate_question_id",
        }
    }
}

/// Authoring problem found in an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    pub key: QuestionKey,
    pub severity: Severity,
    pub code: LintCode,
    pub message: String,
}

impl LintIssue {
    fn new(key: QuestionKey, code: LintCode, message: String) -> Self {
        Self {
            key,
            severity: code.severity(),
            code,
            message,
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{} [{}] {}: {}",
            level,
            self.code.as_str(),
            self.key,
            self.message
        )
    }
}

/// Reports rules that can never resolve and other authoring mistakes.
pub fn lint_assessment(assessment: &Assessment) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let mut ids: BTreeMap<&str, QuestionKey> = BTreeMap::new();

    for (key, question) in assessment.questions() {
        if !question.id.is_empty()
            && let Some(first) = ids.insert(question.id.as_str(), key)
        {
            issues.push(LintIssue::new(
                key,
                LintCode::DuplicateQuestionId,
                format!("question id '{}' is already used by {}", question.id, first),
            ));
        }

        check_options(key, question, &mut issues);
        check_bounds(key, question, &mut issues);
        if let Some(rule) = &question.conditional {
            check_conditional(assessment, key, rule, &mut issues);
        }
    }

    issues
}

pub fn has_errors(issues: &[LintIssue]) -> bool {
    issues
        .iter()
        .any(|issue| issue.severity == Severity::Error)
}

fn check_options(key: QuestionKey, question: &Question, issues: &mut Vec<LintIssue>) {
    if !question.kind.is_choice() {
        return;
    }
    let options = question.kind.options();
    if options.is_empty() {
        issues.push(LintIssue::new(
            key,
            LintCode::MissingOptions,
            format!("{} question has no options", question.kind.label()),
        ));
    } else if options.iter().any(|option| option.trim().is_empty()) {
        issues.push(LintIssue::new(
            key,
            LintCode::MissingOptions,
            "options cannot be blank".into(),
        ));
    }
}

fn check_bounds(key: QuestionKey, question: &Question, issues: &mut Vec<LintIssue>) {
    if let Some(validation) = question.kind.text_validation()
        && let (Some(min), Some(max)) = (validation.min_length, validation.max_length)
        && min > max
    {
        issues.push(LintIssue::new(
            key,
            LintCode::InvertedBounds,
            format!("minLength {} exceeds maxLength {}", min, max),
        ));
    }

    if let Some(validation) = question.kind.numeric_validation()
        && let (Some(min), Some(max)) = (validation.min, validation.max)
        && min > max
    {
        issues.push(LintIssue::new(
            key,
            LintCode::InvertedBounds,
            format!("min {} exceeds max {}", min, max),
        ));
    }
}

fn check_conditional(
    assessment: &Assessment,
    key: QuestionKey,
    rule: &Conditional,
    issues: &mut Vec<LintIssue>,
) {
    if rule.condition == Condition::Unknown {
        issues.push(LintIssue::new(
            key,
            LintCode::UnknownCondition,
            "condition must be equals, not-equals or contains".into(),
        ));
    }
    if rule.value.is_empty() {
        issues.push(LintIssue::new(
            key,
            LintCode::EmptyConditionValue,
            "rule has no value and keeps the question hidden".into(),
        ));
    }

    let Some(dependency) = rule.dependency() else {
        issues.push(LintIssue::new(
            key,
            LintCode::InvalidDependency,
            format!(
                "dependsOn '{}' is not a \"<section>-<question>\" key",
                rule.depends_on
            ),
        ));
        return;
    };

    if assessment.question(dependency).is_none() {
        issues.push(LintIssue::new(
            key,
            LintCode::UnknownDependency,
            format!("dependsOn '{}' addresses no question", dependency),
        ));
    } else if dependency >= key {
        issues.push(LintIssue::new(
            key,
            LintCode::ForwardDependency,
            format!(
                "dependsOn '{}' is not earlier in the assessment and never resolves",
                dependency
            ),
        ));
    }

    if let Some((other, _)) = assessment
        .questions()
        .find(|(other, question)| question.id == rule.depends_on && *other != dependency)
    {
        issues.push(LintIssue::new(
            key,
            LintCode::IdentifierMismatch,
            format!(
                "dependsOn '{}' matches the id of question {} but is resolved by position",
                rule.depends_on, other
            ),
        ));
    }
}
