use serde_json::{Map, Value, json};

use crate::{
    answers::AnswerValue,
    key::QuestionKey,
    progress::{answered_count, next_question},
    reactor::{FormState, QuestionState},
    spec::{assessment::Assessment, question::Question},
    visibility::visible_count,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// More input is required.
    NeedInput,
    /// All visible questions are filled.
    Complete,
    /// At least one visible answer is invalid.
    Error,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Describes a single question for render outputs.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub key: QuestionKey,
    pub id: String,
    pub text: String,
    pub kind: &'static str,
    pub required: bool,
    pub options: Vec<String>,
    pub visible: bool,
    pub state: QuestionState,
    pub current_value: Option<AnswerValue>,
    pub error: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderSection {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<RenderQuestion>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub assessment_id: String,
    pub job_id: String,
    pub title: String,
    pub status: RenderStatus,
    pub next_question: Option<QuestionKey>,
    pub progress: RenderProgress,
    pub sections: Vec<RenderSection>,
}

impl RenderPayload {
    pub fn question(&self, key: QuestionKey) -> Option<&RenderQuestion> {
        self.sections
            .get(key.section)
            .and_then(|section| section.questions.get(key.question))
    }

    pub fn visible_questions(&self) -> impl Iterator<Item = &RenderQuestion> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
            .filter(|question| question.visible)
    }
}

/// Build the renderer payload from an assessment and the session state.
pub fn build_render_payload(assessment: &Assessment, state: &FormState) -> RenderPayload {
    let next_question = next_question(assessment, state);
    let answered = answered_count(assessment, state);
    let total = visible_count(&state.visibility);

    let sections = assessment
        .sections
        .iter()
        .enumerate()
        .map(|(section_index, section)| RenderSection {
            id: section.id.clone(),
            title: section.title.clone(),
            description: section.description.clone(),
            questions: section
                .questions
                .iter()
                .enumerate()
                .map(|(question_index, question)| {
                    render_question(
                        QuestionKey::new(section_index, question_index),
                        question,
                        state,
                    )
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let has_visible_errors = state.errors.keys().any(|key| state.is_visible(key));
    let status = if has_visible_errors {
        RenderStatus::Error
    } else if next_question.is_some() {
        RenderStatus::NeedInput
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        assessment_id: assessment.id.clone(),
        job_id: assessment.job_id.clone(),
        title: assessment.title.clone(),
        status,
        next_question,
        progress: RenderProgress { answered, total },
        sections,
    }
}

fn render_question(key: QuestionKey, question: &Question, state: &FormState) -> RenderQuestion {
    RenderQuestion {
        key,
        id: question.id.clone(),
        text: question.text.clone(),
        kind: question.kind.label(),
        required: question.required,
        options: question.kind.options().to_vec(),
        visible: state.is_visible(&key),
        state: state
            .question_state(&key)
            .unwrap_or(QuestionState::Hidden),
        current_value: state.answers.get(&key).cloned(),
        error: state.error(&key).map(String::from),
        hint: question_hint(question),
    }
}

/// Helper text shown under an input.
pub fn question_hint(question: &Question) -> Option<String> {
    if let Some(validation) = question.kind.text_validation() {
        return validation
            .min_length
            .filter(|min| *min > 0)
            .map(|min| format!("Minimum {} characters", min));
    }
    if let Some(validation) = question.kind.numeric_validation()
        && let (Some(min), Some(max)) = (validation.min, validation.max)
    {
        return Some(format!("Range: {} - {}", min, max));
    }
    None
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let sections = payload
        .sections
        .iter()
        .map(|section| {
            let questions = section
                .questions
                .iter()
                .map(|question| {
                    let mut map = Map::new();
                    map.insert("key".into(), Value::String(question.key.to_string()));
                    map.insert("id".into(), Value::String(question.id.clone()));
                    map.insert("text".into(), Value::String(question.text.clone()));
                    map.insert("type".into(), Value::String(question.kind.to_string()));
                    map.insert("required".into(), Value::Bool(question.required));
                    if !question.options.is_empty() {
                        map.insert("options".into(), json!(question.options));
                    }
                    map.insert("visible".into(), Value::Bool(question.visible));
                    map.insert(
                        "state".into(),
                        Value::String(question.state.as_str().to_string()),
                    );
                    if let Some(value) = &question.current_value {
                        map.insert("current_value".into(), json!(value));
                    }
                    if let Some(error) = &question.error {
                        map.insert("error".into(), Value::String(error.clone()));
                    }
                    if let Some(hint) = &question.hint {
                        map.insert("hint".into(), Value::String(hint.clone()));
                    }
                    Value::Object(map)
                })
                .collect::<Vec<_>>();
            json!({
                "id": section.id,
                "title": section.title,
                "description": section.description,
                "questions": questions,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "assessment_id": payload.assessment_id,
        "job_id": payload.job_id,
        "title": payload.title,
        "status": payload.status.as_str(),
        "next_question": payload.next_question.map(|key| key.to_string()),
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "sections": sections,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Assessment: {} (job {})",
        payload.title, payload.job_id
    ));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));

    if let Some(key) = payload.next_question {
        lines.push(format!("Next question: {}", key));
    } else {
        lines.push("All visible questions are answered.".to_string());
    }

    for section in &payload.sections {
        let visible = section
            .questions
            .iter()
            .filter(|question| question.visible)
            .collect::<Vec<_>>();
        if visible.is_empty() {
            continue;
        }
        lines.push(format!("Section: {}", section.title));
        if let Some(description) = &section.description {
            lines.push(format!("  {}", description));
        }
        for question in visible {
            let mut entry = format!(" - {} {}", question.key, question.text);
            if question.required {
                entry.push_str(" *");
            }
            if let Some(value) = &question.current_value {
                entry.push_str(&format!(" = {}", value.coerce_to_string()));
            }
            lines.push(entry);
            if let Some(error) = &question.error {
                lines.push(format!("   ! {}", error));
            }
        }
    }

    lines.join("\n")
}
