#![allow(missing_docs)]

pub mod answers;
pub mod conditional;
pub mod key;
pub mod lint;
pub mod policy;
pub mod progress;
pub mod reactor;
pub mod render;
pub mod spec;
pub mod store;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, AnswerValue, ValidationError, ValidationResult};
pub use conditional::{is_visible, is_visible_with};
pub use key::{KeyParseError, QuestionKey};
pub use lint::{LintCode, LintIssue, Severity, has_errors, lint_assessment};
pub use policy::{EnginePolicy, MultiChoiceMatch};
pub use progress::{answered_count, next_question};
pub use reactor::{ErrorMap, FormEvent, FormSession, FormState, QuestionState, reduce};
pub use render::{
    RenderPayload, RenderProgress, RenderQuestion, RenderSection, RenderStatus,
    build_render_payload, render_json_ui, render_text,
};
pub use spec::{
    Assessment, Condition, Conditional, NumericValidation, Question, QuestionKind, Section,
    TextValidation,
};
pub use store::{AssessmentDraft, AssessmentStore, PutOutcome, StoreError, Submission};
pub use validate::{FieldViolation, coerce_number, validate_answers, validate_field};
pub use visibility::{VisibilityMap, resolve_visibility, visible_count};
