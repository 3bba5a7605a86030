use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use assess_spec::{
    AnswerSet, AnswerValue, Assessment, EnginePolicy, FormEvent, FormState, KeyParseError,
    QuestionKey, RenderPayload, build_render_payload, lint_assessment, reduce,
    render_json_ui as spec_render_json_ui, render_text as spec_render_text, resolve_visibility,
    validate_answers as spec_validate_answers, validate_field as spec_validate_field,
};

const DEFAULT_ASSESSMENT: &str = include_str!("../../assess-spec/tests/fixtures/screening.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("assessment for job '{0}' is not available")]
    AssessmentUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    InvalidKey(#[from] KeyParseError),
    #[error("question '{0}' does not exist")]
    UnknownQuestion(QuestionKey),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    assessment_json: Option<String>,
    #[serde(default)]
    policy: EnginePolicy,
}

struct Loaded {
    assessment: Assessment,
    policy: EnginePolicy,
}

fn load_config(config_json: &str) -> Result<Loaded, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let assessment_json = config
        .assessment_json
        .as_deref()
        .unwrap_or(DEFAULT_ASSESSMENT);
    let assessment = serde_json::from_str(assessment_json).map_err(ComponentError::ConfigParse)?;

    Ok(Loaded {
        assessment,
        policy: config.policy,
    })
}

fn ensure_assessment(job_id: &str, config_json: &str) -> Result<Loaded, ComponentError> {
    let loaded = load_config(config_json)?;
    if loaded.assessment.job_id != job_id {
        Err(ComponentError::AssessmentUnavailable(job_id.to_string()))
    } else {
        Ok(loaded)
    }
}

fn parse_answers(answers_json: &str) -> Result<AnswerSet, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(AnswerSet::new());
    }
    serde_json::from_str(answers_json).map_err(ComponentError::ConfigParse)
}

fn parse_state(loaded: &Loaded, state_json: &str) -> Result<FormState, ComponentError> {
    if state_json.trim().is_empty() {
        return Ok(FormState::new(
            &loaded.assessment,
            AnswerSet::new(),
            &loaded.policy,
        ));
    }
    let mut state: FormState =
        serde_json::from_str(state_json).map_err(ComponentError::ConfigParse)?;
    // Callers may send answers only; resolve the visibility they imply.
    if state.visibility.is_empty() {
        state.visibility = resolve_visibility(&loaded.assessment, &state.answers, &loaded.policy);
    }
    Ok(state)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn state_value(state: &FormState) -> Result<Value, ComponentError> {
    let mut value = serde_json::to_value(state).map_err(ComponentError::JsonEncode)?;
    let states = serde_json::to_value(state.question_states()).map_err(ComponentError::JsonEncode)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("question_states".into(), states);
    }
    Ok(value)
}

pub fn describe(job_id: &str, config_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        serde_json::to_value(loaded.assessment).map_err(ComponentError::JsonEncode)
    }))
}

pub fn visibility(job_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        let answers = parse_answers(answers_json)?;
        let map = resolve_visibility(&loaded.assessment, &answers, &loaded.policy);
        serde_json::to_value(map).map_err(ComponentError::JsonEncode)
    }))
}

pub fn validate_field(job_id: &str, config_json: &str, key: &str, value_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        let key: QuestionKey = key.parse()?;
        let question = loaded
            .assessment
            .question(key)
            .ok_or(ComponentError::UnknownQuestion(key))?;
        let value = if value_json.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<AnswerValue>(value_json)
                    .map_err(ComponentError::ConfigParse)?,
            )
        };
        let violation = spec_validate_field(question, value.as_ref());
        Ok(json!({
            "key": key,
            "valid": violation.is_none(),
            "error": violation.map(|violation| violation.to_string()),
            "code": violation.map(|violation| violation.code()),
        }))
    }))
}

pub fn apply_event(job_id: &str, config_json: &str, state_json: &str, event_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        let state = parse_state(&loaded, state_json)?;
        let event: FormEvent =
            serde_json::from_str(event_json).map_err(ComponentError::ConfigParse)?;
        debug!(job_id, ?event, "applying form event");
        let next = reduce(&loaded.assessment, &state, &event, &loaded.policy);
        state_value(&next)
    }))
}

pub fn validate_answers(job_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        let answers = parse_answers(answers_json)?;
        let result = spec_validate_answers(&loaded.assessment, &answers, &loaded.policy);
        serde_json::to_value(result).map_err(ComponentError::JsonEncode)
    }))
}

pub fn next(job_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        render_payload(job_id, config_json, state_json).map(|payload| {
            json!({
                "status": payload.status.as_str(),
                "next_question": payload.next_question,
                "progress": {
                    "answered": payload.progress.answered,
                    "total": payload.progress.total
                }
            })
        }),
    )
}

pub fn lint(job_id: &str, config_json: &str) -> String {
    respond(ensure_assessment(job_id, config_json).and_then(|loaded| {
        let issues = lint_assessment(&loaded.assessment);
        serde_json::to_value(issues).map_err(ComponentError::JsonEncode)
    }))
}

fn render_payload(
    job_id: &str,
    config_json: &str,
    state_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let loaded = ensure_assessment(job_id, config_json)?;
    let state = parse_state(&loaded, state_json)?;
    let state = reduce(&loaded.assessment, &state, &FormEvent::Refresh, &loaded.policy);
    Ok(build_render_payload(&loaded.assessment, &state))
}

pub fn render_text(job_id: &str, config_json: &str, state_json: &str) -> String {
    respond_string(
        render_payload(job_id, config_json, state_json).map(|payload| spec_render_text(&payload)),
    )
}

pub fn render_json_ui(job_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        render_payload(job_id, config_json, state_json)
            .map(|payload| spec_render_json_ui(&payload)),
    )
}
