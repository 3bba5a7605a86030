pub mod assessment;
pub mod question;

pub use assessment::{Assessment, Section};
pub use question::{
    Condition, Conditional, NumericValidation, Question, QuestionKind, TextValidation,
};
