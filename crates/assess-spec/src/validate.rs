use thiserror::Error;

use crate::answers::{AnswerSet, AnswerValue, ValidationError, ValidationResult};
use crate::policy::EnginePolicy;
use crate::spec::assessment::Assessment;
use crate::spec::question::{NumericValidation, Question, TextValidation};
use crate::visibility::resolve_visibility;

/// First rule a value breaks. The `Display` output is the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FieldViolation {
    #[error("This field is required")]
    Required,
    #[error("Must be at least {0} characters")]
    MinLength(usize),
    #[error("Must be no more than {0} characters")]
    MaxLength(usize),
    #[error("Must be at least {0}")]
    Min(f64),
    #[error("Must be no more than {0}")]
    Max(f64),
}

impl FieldViolation {
    pub fn code(&self) -> &'static str {
        match self {
            FieldViolation::Required => "required",
            FieldViolation::MinLength(_) => "min_length",
            FieldViolation::MaxLength(_) => "max_length",
            FieldViolation::Min(_) => "min",
            FieldViolation::Max(_) => "max",
        }
    }
}

/// Checks a single value against its question.
///
/// Rules run in order required, minLength, maxLength, min, max and only
/// the first violation is reported. Empty optional values skip the
/// type-specific checks.
pub fn validate_field(question: &Question, value: Option<&AnswerValue>) -> Option<FieldViolation> {
    let value = match value.filter(|value| !value.is_empty()) {
        Some(value) => value,
        None if question.required => return Some(FieldViolation::Required),
        None => return None,
    };

    if let Some(validation) = question.kind.text_validation() {
        return check_text(validation, &value.coerce_to_string());
    }
    if let Some(validation) = question.kind.numeric_validation() {
        return check_numeric(validation, coerce_number(&value.coerce_to_string()));
    }
    None
}

fn check_text(validation: &TextValidation, text: &str) -> Option<FieldViolation> {
    let length = text.chars().count();

    if let Some(min_length) = validation.min_length.filter(|bound| *bound > 0)
        && length < min_length
    {
        return Some(FieldViolation::MinLength(min_length));
    }

    if let Some(max_length) = validation.max_length.filter(|bound| *bound > 0)
        && length > max_length
    {
        return Some(FieldViolation::MaxLength(max_length));
    }

    None
}

// A value that does not parse fails every configured bound.
fn check_numeric(validation: &NumericValidation, number: Option<f64>) -> Option<FieldViolation> {
    if let Some(min) = validation.min
        && !number.is_some_and(|number| number >= min)
    {
        return Some(FieldViolation::Min(min));
    }

    if let Some(max) = validation.max
        && !number.is_some_and(|number| number <= max)
    {
        return Some(FieldViolation::Max(max));
    }

    None
}

/// Parses a numeric answer. Surrounding whitespace is ignored, a blank
/// string is zero, and anything that is not a finite number is `None`.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Validates a whole answer set, skipping questions that are hidden.
pub fn validate_answers(
    assessment: &Assessment,
    answers: &AnswerSet,
    policy: &EnginePolicy,
) -> ValidationResult {
    let visibility = resolve_visibility(assessment, answers, policy);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for (key, question) in assessment.questions() {
        if !visibility.get(&key).copied().unwrap_or(false) {
            continue;
        }

        match validate_field(question, answers.get(&key)) {
            None => {}
            Some(FieldViolation::Required) => missing_required.push(key),
            Some(violation) => errors.push(ValidationError {
                key,
                question_id: question.id.clone(),
                message: violation.to_string(),
                code: violation.code().to_string(),
            }),
        }
    }

    let unknown_keys = answers
        .keys()
        .filter(|key| assessment.question(**key).is_none())
        .copied()
        .collect::<Vec<_>>();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_keys.is_empty(),
        errors,
        missing_required,
        unknown_keys,
    }
}
