use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use assess_spec::{
    AnswerSet, AnswerValue, Assessment, Condition, EnginePolicy, LintIssue, NumericValidation,
    Question, QuestionKey, QuestionKind, Section, TextValidation, has_errors, lint_assessment,
    resolve_visibility,
};

/// Input shape describing what should be generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationInput {
    pub dir_name: String,
    #[serde(default)]
    pub summary_md: Option<String>,
    pub assessment: AssessmentInput,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

/// Metadata describing the assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub job_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// Question metadata collected from JSON inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInput {
    #[serde(rename = "type")]
    pub kind: CliQuestionType,
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalInput>,
}

/// Show-when rule; `depends_on` is a `"<section>-<question>"` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalInput {
    pub depends_on: String,
    pub condition: Condition,
    #[serde(default)]
    pub value: String,
}

/// Supported question types for generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CliQuestionType {
    #[default]
    ShortText,
    LongText,
    SingleChoice,
    MultiChoice,
    Numeric,
    FileUpload,
}

impl fmt::Display for CliQuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliQuestionType::ShortText => write!(f, "short-text"),
            CliQuestionType::LongText => write!(f, "long-text"),
            CliQuestionType::SingleChoice => write!(f, "single-choice"),
            CliQuestionType::MultiChoice => write!(f, "multi-choice"),
            CliQuestionType::Numeric => write!(f, "numeric"),
            CliQuestionType::FileUpload => write!(f, "file-upload"),
        }
    }
}

impl std::str::FromStr for CliQuestionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "short-text" | "text" => Ok(CliQuestionType::ShortText),
            "long-text" | "textarea" => Ok(CliQuestionType::LongText),
            "single-choice" | "choice" => Ok(CliQuestionType::SingleChoice),
            "multi-choice" | "multiple" => Ok(CliQuestionType::MultiChoice),
            "numeric" | "number" => Ok(CliQuestionType::Numeric),
            "file-upload" | "file" => Ok(CliQuestionType::FileUpload),
            _ => Err(format!("unknown question type '{}'", value)),
        }
    }
}

impl CliQuestionType {
    fn is_choice(self) -> bool {
        matches!(
            self,
            CliQuestionType::SingleChoice | CliQuestionType::MultiChoice
        )
    }
}

/// Generated bundle returned by the builder.
pub struct GeneratedBundle {
    pub assessment: Assessment,
    pub schema: Value,
    pub examples: AnswerSet,
    /// Lint warnings; errors abort the build.
    pub warnings: Vec<LintIssue>,
}

/// Build the full bundle from a generation input.
pub fn build_bundle(input: &GenerationInput) -> Result<GeneratedBundle, String> {
    validate_input(input)?;
    let assessment = to_assessment(input);

    let issues = lint_assessment(&assessment);
    if has_errors(&issues) {
        let details = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(format!("assessment has lint errors: {}", details));
    }

    let schema = serde_json::to_value(schemars::schema_for!(Assessment))
        .map_err(|err| format!("failed to encode schema: {}", err))?;
    let examples = example_answers(&assessment);

    Ok(GeneratedBundle {
        assessment,
        schema,
        examples,
        warnings: issues,
    })
}

fn validate_input(input: &GenerationInput) -> Result<(), String> {
    if input.dir_name.trim().is_empty() {
        return Err("dir_name must be provided".into());
    }
    if input.assessment.job_id.trim().is_empty() {
        return Err("assessment.job_id is required".into());
    }
    if input.assessment.title.trim().is_empty() {
        return Err("assessment.title is required".into());
    }
    if input
        .sections
        .iter()
        .all(|section| section.questions.is_empty())
    {
        return Err("at least one question must be defined".into());
    }

    for (section_index, section) in input.sections.iter().enumerate() {
        if section.title.trim().is_empty() {
            return Err(format!("section {} needs a title", section_index));
        }
        for (question_index, question) in section.questions.iter().enumerate() {
            let key = QuestionKey::new(section_index, question_index);
            if question.text.trim().is_empty() {
                return Err(format!("question {} needs text", key));
            }
            if question.kind.is_choice() && question.options.is_empty() {
                return Err(format!(
                    "{} question {} must include options",
                    question.kind, key
                ));
            }
        }
    }

    Ok(())
}

fn to_assessment(input: &GenerationInput) -> Assessment {
    let mut assessment = Assessment::new(&input.assessment.job_id, &input.assessment.title);
    if let Some(id) = &input.assessment.id {
        assessment.id = id.clone();
    }

    for (section_index, section_input) in input.sections.iter().enumerate() {
        let mut section = Section::new(
            format!("section-{}", section_index),
            section_input.title.clone(),
        );
        if let Some(description) = &section_input.description {
            section = section.with_description(description.clone());
        }
        for (question_index, question) in section_input.questions.iter().enumerate() {
            let key = QuestionKey::new(section_index, question_index);
            section = section.with_question(to_question(key, question));
        }
        assessment = assessment.with_section(section);
    }

    assessment
}

fn to_question(key: QuestionKey, input: &QuestionInput) -> Question {
    let text_validation = TextValidation {
        min_length: input.min_length,
        max_length: input.max_length,
    };
    let kind = match input.kind {
        CliQuestionType::ShortText => QuestionKind::ShortText {
            validation: text_validation,
        },
        CliQuestionType::LongText => QuestionKind::LongText {
            validation: text_validation,
        },
        CliQuestionType::SingleChoice => QuestionKind::SingleChoice {
            options: input.options.clone(),
        },
        CliQuestionType::MultiChoice => QuestionKind::MultiChoice {
            options: input.options.clone(),
        },
        CliQuestionType::Numeric => QuestionKind::Numeric {
            validation: NumericValidation {
                min: input.min,
                max: input.max,
            },
        },
        CliQuestionType::FileUpload => QuestionKind::FileUpload,
    };

    let mut question = Question::new(key.to_string(), input.text.clone(), kind);
    question.required = input.required;
    if let Some(rule) = &input.conditional {
        question = question.with_conditional(
            rule.depends_on.clone(),
            rule.condition,
            rule.value.clone(),
        );
    }
    question
}

/// One answer per question that is visible once the earlier examples are
/// filled in.
fn example_answers(assessment: &Assessment) -> AnswerSet {
    let policy = EnginePolicy::default();
    let mut answers = AnswerSet::new();
    for (key, question) in assessment.questions() {
        let visibility = resolve_visibility(assessment, &answers, &policy);
        if visibility.get(&key).copied().unwrap_or(false) {
            answers.insert(key, example_value(question));
        }
    }
    answers
}

fn example_value(question: &Question) -> AnswerValue {
    match &question.kind {
        QuestionKind::ShortText { validation } | QuestionKind::LongText { validation } => {
            example_text(validation).into()
        }
        QuestionKind::SingleChoice { options } => {
            options.first().cloned().unwrap_or_default().into()
        }
        QuestionKind::MultiChoice { options } => {
            options.iter().take(1).cloned().collect::<Vec<_>>().into()
        }
        QuestionKind::Numeric { validation } => {
            let value = match (validation.min, validation.max) {
                (Some(min), _) => min,
                (None, Some(max)) => max.min(1.0),
                (None, None) => 1.0,
            };
            value.to_string().into()
        }
        QuestionKind::FileUpload => "resume.pdf".into(),
    }
}

fn example_text(validation: &TextValidation) -> String {
    let mut text = String::from("Sample answer");
    if let Some(min) = validation.min_length {
        while text.chars().count() < min {
            text.push('.');
        }
    }
    if let Some(max) = validation.max_length {
        text = text.chars().take(max).collect();
    }
    text
}

/// Serialize the bundle to disk.
pub fn write_bundle(
    bundle: &GeneratedBundle,
    input: &GenerationInput,
    out_root: &Path,
) -> io::Result<PathBuf> {
    let bundle_dir = out_root.join(&input.dir_name);
    let assessments_dir = bundle_dir.join("assessments");
    let examples_dir = bundle_dir.join("examples");
    let schemas_dir = bundle_dir.join("schemas");

    fs::create_dir_all(&assessments_dir)?;
    fs::create_dir_all(&examples_dir)?;
    fs::create_dir_all(&schemas_dir)?;

    let base_name = sanitize_file_name(&bundle.assessment.job_id);

    write_json(
        &assessments_dir.join(format!("{}.assessment.json", base_name)),
        &bundle.assessment,
    )?;
    write_json(
        &examples_dir.join(format!("{}.answers.example.json", base_name)),
        &bundle.examples,
    )?;
    write_json(&schemas_dir.join("assessment.schema.json"), &bundle.schema)?;

    let readme_path = bundle_dir.join("README.md");
    fs::write(readme_path, build_readme(bundle, input, &base_name))?;

    Ok(bundle_dir)
}

fn sanitize_file_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "bundle".into()
    } else {
        cleaned
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> io::Result<()> {
    let contents = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    fs::write(path, contents)
}

fn build_readme(bundle: &GeneratedBundle, input: &GenerationInput, base: &str) -> String {
    let summary = input
        .summary_md
        .as_deref()
        .unwrap_or("Generated by `talentflow-assess`.");
    let description = input
        .assessment
        .description
        .as_deref()
        .unwrap_or("No description provided.");

    format!(
        "# {title}\n\nJob: {job}\n\nQuestions: {count}\n\n{description}\n\n## Summary\n\n{summary}\n\n## Files\n\n- `assessments/{base}.assessment.json`\n- `examples/{base}.answers.example.json`\n- `schemas/assessment.schema.json`\n\nValidate the example answers with:\n\n```\ntalentflow-assess validate --assessment assessments/{base}.assessment.json --answers examples/{base}.answers.example.json\n```\n",
        title = bundle.assessment.title,
        job = bundle.assessment.job_id,
        count = bundle.assessment.question_count(),
        description = description,
        summary = summary,
        base = base,
    )
}
