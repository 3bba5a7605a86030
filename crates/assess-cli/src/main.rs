pub mod builder;

mod preview;

use assess_spec::{
    AnswerSet, AnswerValue, Assessment, AssessmentDraft, AssessmentStore, EnginePolicy,
    MultiChoiceMatch, StoreError, ValidationResult, has_errors, lint_assessment, validate_answers,
};
use builder::{GeneratedBundle, GenerationInput, build_bundle, write_bundle};
use clap::{Parser, Subcommand, ValueEnum};
use component_assess::{apply_event, next as assess_next, render_json_ui};
use preview::{
    AnswerParseError, PreviewPayload, PreviewPresenter, PreviewQuestion, PromptContext,
    PromptKind, Verbosity,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Hiring assessment preview and validation CLI",
    long_about = "Previews conditional assessments in a text shell, generates assessment bundles, and validates candidate answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MultiChoiceArg {
    /// Compare the comma-joined selection, e.g. "Async,Embedded".
    Joined,
    /// Compare each selected option on its own.
    Any,
}

impl From<MultiChoiceArg> for MultiChoiceMatch {
    fn from(value: MultiChoiceArg) -> Self {
        match value {
            MultiChoiceArg::Joined => MultiChoiceMatch::Joined,
            MultiChoiceArg::Any => MultiChoiceMatch::AnyOption,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Fill an assessment question by question, the way a candidate sees it.
    Preview {
        /// Path to the assessment JSON.
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: PathBuf,
        /// Optional JSON file containing initial answers keyed by "<section>-<question>".
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (status, visible questions, options) and debug logs.
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON on completion.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode for each step.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Re-validate retained answers when their question becomes visible again.
        #[arg(long)]
        revalidate_on_reveal: bool,
        /// Treat answers of hidden questions as unanswered for their dependents.
        #[arg(long)]
        cascade_hidden: bool,
        /// How multi-choice answers are compared in conditional rules.
        #[arg(long, value_enum, default_value_t = MultiChoiceArg::Joined)]
        multi_choice: MultiChoiceArg,
    },
    /// Non-interactive generator that consumes a JSON description and emits the bundle.
    Generate {
        /// JSON file describing the assessment sections and questions.
        #[arg(long, value_name = "INPUT")]
        input: PathBuf,
        /// Root directory where the generated bundle will be emitted (defaults to ASSESS_OUTPUT_DIR or current working directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite existing bundle if present.
        #[arg(long)]
        force: bool,
        /// Show internal bundle data for debugging.
        #[arg(long)]
        verbose: bool,
    },
    /// Validate a candidate's answers against an assessment.
    Validate {
        /// Path to the assessment JSON.
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Report conditional rules that can never resolve and other authoring mistakes.
    Lint {
        /// Path to the assessment JSON.
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: PathBuf,
    },
    /// Print the JSON Schema of the assessment format.
    Schema,
    /// Manage a JSON snapshot of assessments keyed by job id.
    Store {
        #[command(subcommand)]
        action: StoreCommand,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    /// List stored assessments, newest first.
    List {
        #[arg(long, value_name = "STORE")]
        store: PathBuf,
        /// Only show assessments whose title contains this text (case-insensitive).
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,
    },
    /// Print the assessment stored for a job.
    Get {
        #[arg(long, value_name = "STORE")]
        store: PathBuf,
        #[arg(long, value_name = "JOB")]
        job: String,
    },
    /// Create or merge the assessment for a job from a JSON draft.
    Put {
        #[arg(long, value_name = "STORE")]
        store: PathBuf,
        #[arg(long, value_name = "JOB")]
        job: String,
        /// JSON with optional `title` and `sections`.
        #[arg(long, value_name = "INPUT")]
        input: PathBuf,
    },
    /// Remove the assessment for a job.
    Delete {
        #[arg(long, value_name = "STORE")]
        store: PathBuf,
        #[arg(long, value_name = "JOB")]
        job: String,
    },
    /// Record a candidate's answers after validating them.
    Submit {
        #[arg(long, value_name = "STORE")]
        store: PathBuf,
        #[arg(long, value_name = "JOB")]
        job: String,
        #[arg(long, value_name = "CANDIDATE")]
        candidate: String,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Preview { verbose, .. } | Command::Generate { verbose, .. } => *verbose,
            _ => false,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    match cli.command {
        Command::Preview {
            assessment,
            answers,
            verbose,
            answers_json,
            format,
            revalidate_on_reveal,
            cascade_hidden,
            multi_choice,
        } => {
            let policy = EnginePolicy {
                multi_choice_match: multi_choice.into(),
                revalidate_on_reveal,
                cascade_hidden,
            };
            run_preview(assessment, answers, verbose, answers_json, format, policy)
        }
        Command::Generate {
            input,
            out,
            force,
            verbose,
        } => run_generate(input, out, force, verbose),
        Command::Validate {
            assessment,
            answers,
        } => run_validate(assessment, answers),
        Command::Lint { assessment } => run_lint(assessment),
        Command::Schema => run_schema(),
        Command::Store { action } => run_store(action),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_assessment(path: &Path) -> CliResult<Assessment> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn read_answers(path: &Path) -> CliResult<AnswerSet> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn dump_bundle_debug(bundle: &GeneratedBundle) -> CliResult<()> {
    println!("Assessment:");
    println!("{}", serde_json::to_string_pretty(&bundle.assessment)?);
    println!("Example answers:");
    println!("{}", bundle.examples.to_json_pretty()?);
    Ok(())
}

fn run_generate(
    input_path: PathBuf,
    out_dir: Option<PathBuf>,
    force: bool,
    verbose: bool,
) -> CliResult<()> {
    let contents = fs::read_to_string(&input_path)?;
    let input: GenerationInput = serde_json::from_str(&contents)?;
    let out_root = resolve_output_root(out_dir)?;
    let bundle_dir = out_root.join(&input.dir_name);
    if bundle_dir.exists() {
        if force {
            fs::remove_dir_all(&bundle_dir)?;
        } else {
            return Err(format!(
                "bundle {} already exists; rerun with --force to overwrite",
                bundle_dir.display()
            )
            .into());
        }
    }

    let bundle = build_bundle(&input)?;
    for warning in &bundle.warnings {
        eprintln!("{}", warning);
    }
    let bundle_dir = write_bundle(&bundle, &input, &out_root)?;
    println!("Generated assessment bundle at {}", bundle_dir.display());
    if verbose {
        println!("Detailed bundle state:");
        dump_bundle_debug(&bundle)?;
    }
    Ok(())
}

fn resolve_output_root(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os("ASSESS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    Ok(candidate)
}

fn run_validate(assessment_path: PathBuf, answers_path: PathBuf) -> CliResult<()> {
    let assessment = read_assessment(&assessment_path)?;
    let answers = read_answers(&answers_path)?;

    let result = validate_answers(&assessment, &answers, &EnginePolicy::default());
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.key, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            join_keys(&result.missing_required)
        );
    }
    if !result.unknown_keys.is_empty() {
        println!("Unknown answer keys: {}", join_keys(&result.unknown_keys));
    }
}

fn join_keys(keys: &[assess_spec::QuestionKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_lint(assessment_path: PathBuf) -> CliResult<()> {
    let assessment = read_assessment(&assessment_path)?;
    let issues = lint_assessment(&assessment);
    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }
    for issue in &issues {
        println!("{}", issue);
    }
    if has_errors(&issues) {
        Err("assessment has lint errors".into())
    } else {
        Ok(())
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(Assessment);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_store(action: StoreCommand) -> CliResult<()> {
    match action {
        StoreCommand::List { store, search } => {
            let snapshot = AssessmentStore::load(&store)?;
            let assessments = snapshot.list(search.as_deref());
            if assessments.is_empty() {
                println!("No assessments found");
            }
            for assessment in assessments {
                let created = assessment
                    .created_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{}\t{}\t{}",
                    assessment.job_id, assessment.title, assessment.question_count(), created
                );
            }
        }
        StoreCommand::Get { store, job } => {
            let snapshot = AssessmentStore::load(&store)?;
            let assessment = snapshot
                .get(&job)
                .ok_or_else(|| StoreError::NotFound(job.clone()))?;
            println!("{}", serde_json::to_string_pretty(assessment)?);
        }
        StoreCommand::Put { store, job, input } => {
            let mut snapshot = AssessmentStore::load(&store)?;
            let draft: AssessmentDraft = serde_json::from_str(&fs::read_to_string(&input)?)?;
            let outcome = snapshot.put(&job, draft);
            snapshot.save(&store)?;
            println!(
                "{} assessment {} for job {}",
                if outcome.is_created() {
                    "Created"
                } else {
                    "Updated"
                },
                outcome.assessment().id,
                job
            );
        }
        StoreCommand::Delete { store, job } => {
            let mut snapshot = AssessmentStore::load(&store)?;
            let removed = snapshot.delete(&job)?;
            snapshot.save(&store)?;
            println!("Deleted assessment {} for job {}", removed.id, job);
        }
        StoreCommand::Submit {
            store,
            job,
            candidate,
            answers,
        } => {
            let mut snapshot = AssessmentStore::load(&store)?;
            let answers = read_answers(&answers)?;
            let policy = EnginePolicy::default();
            let submission_id = match snapshot.submit(&job, &candidate, answers, &policy) {
                Ok(submission) => submission.id.clone(),
                Err(StoreError::InvalidSubmission { result, .. }) => {
                    describe_validation(&result);
                    return Err("submission failed validation".into());
                }
                Err(err) => return Err(err.into()),
            };
            snapshot.save(&store)?;
            println!("Recorded submission {} for job {}", submission_id, job);
        }
    }
    Ok(())
}

fn run_preview(
    assessment_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
    format: RenderMode,
    policy: EnginePolicy,
) -> CliResult<()> {
    let assessment_json = fs::read_to_string(&assessment_path)?;
    let assessment: Assessment = serde_json::from_str(&assessment_json)?;
    let job_id = assessment.job_id.clone();
    let config_json = json!({ "assessment_json": assessment_json, "policy": policy }).to_string();

    let answers = match answers_path {
        Some(path) => read_answers(&path)?,
        None => AnswerSet::new(),
    };
    let mut state = json!({ "answers": answers });
    let mut presenter = PreviewPresenter::new(Verbosity::from_verbose(verbose), answers_json);

    loop {
        let state_str = state.to_string();
        let next_value = parse_component_result(&assess_next(&job_id, &config_json, &state_str))?;
        if next_value["status"] == "complete" {
            let answers: AnswerSet = serde_json::from_value(state["answers"].clone())?;
            presenter.show_completion(&answers);
            break;
        }
        let key = next_value["next_question"]
            .as_str()
            .ok_or("preview failed to return a next question")?
            .to_string();

        let ui_raw = render_json_ui(&job_id, &config_json, &state_str);
        let ui = parse_component_result(&ui_raw)?;
        if matches!(format, RenderMode::Json) {
            println!("JSON UI:\n{}", ui_raw);
        }
        let payload =
            PreviewPayload::from_json(&ui).map_err(|err| format!("preview UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        let question = payload
            .question(&key)
            .ok_or_else(|| format!("preview payload missing question '{}'", key))?;
        let prompt = PromptContext::new(question, &payload.progress);
        let value = prompt_question(&prompt, question, &presenter)?;

        let event = json!({ "kind": "change", "key": key, "value": value }).to_string();
        debug!(%key, "submitting answer");
        state = parse_component_result(&apply_event(&job_id, &config_json, &state_str, &event))?;
    }

    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn prompt_question(
    prompt: &PromptContext,
    question: &PreviewQuestion,
    presenter: &PreviewPresenter,
) -> CliResult<AnswerValue> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("preview aborted: input closed".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("preview aborted by user".into());
        }

        match parse_answer(question, trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Blank input is submitted as an empty answer so the engine reports
/// required questions itself.
fn parse_answer(question: &PreviewQuestion, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(match question.kind {
            PromptKind::MultiChoice => AnswerValue::Choices(Vec::new()),
            _ => AnswerValue::Text(String::new()),
        });
    }

    match question.kind {
        PromptKind::SingleChoice => parse_choice(&question.options, raw).map(AnswerValue::Text),
        PromptKind::MultiChoice => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_choice(&question.options, part))
            .collect::<Result<Vec<_>, _>>()
            .map(AnswerValue::Choices),
        PromptKind::Numeric => parse_number(raw),
        PromptKind::Text | PromptKind::FileUpload => Ok(AnswerValue::Text(raw.to_string())),
    }
}

/// Accepts an option label (case-insensitive) or its 1-based position.
fn parse_choice(options: &[String], raw: &str) -> Result<String, AnswerParseError> {
    if let Some(option) = options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
    {
        return Ok(option.clone());
    }
    if let Ok(index) = raw.parse::<usize>()
        && let Some(option) = index.checked_sub(1).and_then(|index| options.get(index))
    {
        return Ok(option.clone());
    }
    Err(AnswerParseError::new(
        format!("Choose one of: {}.", options.join(", ")),
        Some(format!("allowed values: {}", options.join(", "))),
    ))
}

fn parse_number(raw: &str) -> Result<AnswerValue, AnswerParseError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(AnswerValue::Text(raw.to_string())),
        Ok(_) => Err(AnswerParseError::new(
            "Please enter a finite number.",
            Some("number must be finite".to_string()),
        )),
        Err(_) => Err(AnswerParseError::new(
            "Please enter a number.",
            Some("expected number".to_string()),
        )),
    }
}
