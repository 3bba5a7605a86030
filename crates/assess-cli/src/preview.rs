use std::fmt::Write;

use assess_spec::AnswerSet;
use serde_json::Value;

/// Controls which bits of state the preview prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, visible questions, hints and choices.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and state once the engine yields a question.
pub struct PreviewPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl PreviewPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &PreviewPayload) {
        if self.header_printed {
            return;
        }
        println!("Assessment: {}", payload.title);
        if self.verbosity.is_verbose() {
            println!("Job: {}", payload.job_id);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &PreviewPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status,
                payload.progress.answered,
                payload.progress.total
            );
            self.print_visible_questions(payload);
        } else if payload.visible_count() == 0 {
            println!("No visible questions are available; check the conditional rules.");
        }
    }

    fn print_visible_questions(&self, payload: &PreviewPayload) {
        println!("Visible questions:");
        for question in payload.questions.iter().filter(|question| question.visible) {
            let mut entry = format!(" - {} ({})", question.key, question.text);
            if question.required {
                entry.push_str(" [required]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.text)
        } else {
            format!("{} {}", prompt.index, prompt.text)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.kind_hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(hint) = &prompt.hint {
            println!("{}", hint);
        }
        if let Some(error) = &prompt.error {
            eprintln!("{}: {}", prompt.key, error);
        }
        if self.verbosity.is_verbose()
            && let Some(section) = &prompt.section
        {
            println!("Section: {}", section);
        }
        if self.verbosity.is_verbose() && !prompt.options.is_empty() {
            println!("Options: {}", prompt.options.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// Render payload extracted from the component output.
pub struct PreviewPayload {
    pub title: String,
    pub job_id: String,
    pub status: String,
    pub progress: RenderProgress,
    pub questions: Vec<PreviewQuestion>,
}

impl PreviewPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let title = json
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| "preview payload missing title".to_string())?
            .to_string();
        let job_id = json
            .get("job_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = json
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("need_input")
            .to_string();
        let progress = json
            .get("progress")
            .and_then(Value::as_object)
            .ok_or_else(|| "preview payload missing progress".to_string())?;
        let answered = progress
            .get("answered")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let total = progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;

        let sections = json
            .get("sections")
            .and_then(Value::as_array)
            .ok_or_else(|| "preview payload missing sections".to_string())?;
        let mut questions = Vec::new();
        for section in sections {
            let section_title = section
                .get("title")
                .and_then(Value::as_str)
                .map(String::from);
            let entries = section
                .get("questions")
                .and_then(Value::as_array)
                .ok_or_else(|| "preview section missing questions".to_string())?;
            for entry in entries {
                questions.push(PreviewQuestion::from_json(entry, section_title.clone())?);
            }
        }

        Ok(Self {
            title,
            job_id,
            status,
            progress: RenderProgress { answered, total },
            questions,
        })
    }

    pub fn visible_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.visible)
            .count()
    }

    pub fn question(&self, key: &str) -> Option<&PreviewQuestion> {
        self.questions.iter().find(|question| question.key == key)
    }
}

/// Progress counters from the render payload.
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Minimal view of a question used for rendering prompts.
pub struct PreviewQuestion {
    pub key: String,
    pub text: String,
    pub section: Option<String>,
    pub kind: PromptKind,
    pub required: bool,
    pub options: Vec<String>,
    pub visible: bool,
    pub hint: Option<String>,
    pub error: Option<String>,
}

impl PreviewQuestion {
    fn from_json(value: &Value, section: Option<String>) -> Result<Self, String> {
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| "question missing key".to_string())?
            .to_string();
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("question '{}' missing text", key))?
            .to_string();
        let kind = PromptKind::from_label(
            value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("short-text"),
        );
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let visible = value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let hint = value.get("hint").and_then(Value::as_str).map(String::from);
        let error = value.get("error").and_then(Value::as_str).map(String::from);
        Ok(Self {
            key,
            text,
            section,
            kind,
            required,
            options,
            visible,
            hint,
            error,
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub key: String,
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub section: Option<String>,
    pub required: bool,
    pub kind_hint: Option<String>,
    pub hint: Option<String>,
    pub options: Vec<String>,
    pub error: Option<String>,
}

impl PromptContext {
    pub fn new(question: &PreviewQuestion, progress: &RenderProgress) -> Self {
        let index = progress.answered + 1;
        Self {
            key: question.key.clone(),
            index: index.max(1),
            total: progress.total,
            text: question.text.clone(),
            section: question.section.clone(),
            required: question.required,
            kind_hint: question.kind.hint(&question.options),
            hint: question.hint.clone(),
            options: question.options.clone(),
            error: question.error.clone(),
        }
    }
}

/// Input shape a prompt expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    SingleChoice,
    MultiChoice,
    Numeric,
    FileUpload,
}

impl PromptKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "single-choice" => PromptKind::SingleChoice,
            "multi-choice" => PromptKind::MultiChoice,
            "numeric" => PromptKind::Numeric,
            "file-upload" => PromptKind::FileUpload,
            _ => PromptKind::Text,
        }
    }

    fn hint(&self, options: &[String]) -> Option<String> {
        match self {
            PromptKind::SingleChoice if !options.is_empty() => {
                Some(format!("({})", options.join("/")))
            }
            PromptKind::MultiChoice if !options.is_empty() => {
                Some(format!("(comma separated: {})", options.join("/")))
            }
            PromptKind::Numeric => Some("(number)".to_string()),
            PromptKind::FileUpload => Some("(file name)".to_string()),
            _ => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut encoded, byte| {
        let _ = write!(encoded, "{:02x}", byte);
        encoded
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_flattens_sections() {
        let ui = json!({
            "title": "Screening",
            "job_id": "job-1",
            "status": "need_input",
            "progress": { "answered": 1, "total": 3 },
            "sections": [
                { "title": "A", "questions": [
                    { "key": "0-0", "text": "Remote?", "type": "single-choice",
                      "options": ["Yes", "No"], "visible": true, "required": true }
                ]},
                { "title": "B", "questions": [
                    { "key": "1-0", "text": "Years", "type": "numeric",
                      "visible": false, "hint": "Range: 0 - 40",
                      "error": "Must be at least 0" }
                ]}
            ]
        });
        let payload = PreviewPayload::from_json(&ui).expect("payload");
        assert_eq!(payload.questions.len(), 2);
        assert_eq!(payload.visible_count(), 1);
        let years = payload.question("1-0").expect("question");
        assert_eq!(years.kind, PromptKind::Numeric);
        assert_eq!(years.section.as_deref(), Some("B"));

        let prompt = PromptContext::new(years, &payload.progress);
        assert_eq!(prompt.index, 2);
        assert_eq!(prompt.hint.as_deref(), Some("Range: 0 - 40"));
        assert_eq!(prompt.kind_hint.as_deref(), Some("(number)"));
        assert_eq!(prompt.error.as_deref(), Some("Must be at least 0"));
    }

    #[test]
    fn payload_requires_progress() {
        let ui = json!({ "title": "x", "sections": [] });
        assert!(PreviewPayload::from_json(&ui).is_err());
    }

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(encode_hex(&[0x00, 0xab, 0x10]), "00ab10");
    }
}
