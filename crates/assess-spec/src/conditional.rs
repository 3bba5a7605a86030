//! Visibility rules for conditional questions.
//!
//! Every function here is total: a rule that cannot be resolved (missing
//! dependency answer, empty target value, malformed key, unknown condition)
//! evaluates to "not visible".

use crate::answers::{AnswerSet, AnswerValue};
use crate::key::QuestionKey;
use crate::policy::MultiChoiceMatch;
use crate::spec::question::{Condition, Conditional, Question};

/// Whether `question` is shown given the current answers.
pub fn is_visible(question: &Question, answers: &AnswerSet) -> bool {
    is_visible_with(question, answers, MultiChoiceMatch::default())
}

pub fn is_visible_with(question: &Question, answers: &AnswerSet, mode: MultiChoiceMatch) -> bool {
    match &question.conditional {
        None => true,
        Some(rule) => rule.evaluate(answers, mode),
    }
}

impl Conditional {
    /// Parsed dependency key, if `dependsOn` is a positional key.
    pub fn dependency(&self) -> Option<QuestionKey> {
        self.depends_on.parse().ok()
    }

    pub fn evaluate(&self, answers: &AnswerSet, mode: MultiChoiceMatch) -> bool {
        let Some(key) = self.dependency() else {
            return false;
        };
        let Some(answer) = answers.answered(&key) else {
            return false;
        };
        self.matches(answer, mode)
    }

    /// Applies the rule to an already resolved dependency answer.
    pub fn matches(&self, answer: &AnswerValue, mode: MultiChoiceMatch) -> bool {
        if self.value.is_empty() || answer.is_empty() {
            return false;
        }
        match (mode, answer) {
            (MultiChoiceMatch::AnyOption, AnswerValue::Choices(options)) => match self.condition {
                Condition::NotEquals => !options
                    .iter()
                    .any(|option| Condition::Equals.test(option, &self.value)),
                condition => options
                    .iter()
                    .any(|option| condition.test(option, &self.value)),
            },
            _ => self.condition.test(&answer.coerce_to_string(), &self.value),
        }
    }
}

impl Condition {
    pub fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            Condition::Equals => actual.trim() == expected.trim(),
            Condition::NotEquals => actual.trim() != expected.trim(),
            Condition::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
            Condition::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::{QuestionKind, TextValidation};

    fn dependent(condition: Condition, value: &str) -> Question {
        Question::new(
            "0-1",
            "Follow-up",
            QuestionKind::ShortText {
                validation: TextValidation::default(),
            },
        )
        .with_conditional("0-0", condition, value)
    }

    fn answers(value: impl Into<AnswerValue>) -> AnswerSet {
        AnswerSet::new().with(QuestionKey::new(0, 0), value)
    }

    #[test]
    fn unconditional_questions_are_visible() {
        let question = Question::new("q", "Plain", QuestionKind::FileUpload);
        assert!(is_visible(&question, &AnswerSet::new()));
    }

    #[test]
    fn equals_trims_both_sides() {
        let question = dependent(Condition::Equals, " Yes ");
        assert!(is_visible(&question, &answers("Yes  ")));
        assert!(!is_visible(&question, &answers("yes")));
    }

    #[test]
    fn not_equals_negates_trimmed_equality() {
        let question = dependent(Condition::NotEquals, "Yes");
        assert!(is_visible(&question, &answers("No")));
        assert!(!is_visible(&question, &answers(" Yes")));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let question = dependent(Condition::Contains, "Yes");
        assert!(is_visible(&question, &answers("Yes, absolutely")));
        assert!(is_visible(&question, &answers("oh YES")));
        assert!(!is_visible(&question, &answers("No")));
    }

    #[test]
    fn fails_closed_on_unresolvable_rules() {
        assert!(!is_visible(&dependent(Condition::Equals, "Yes"), &AnswerSet::new()));
        assert!(!is_visible(&dependent(Condition::Equals, "Yes"), &answers("")));
        assert!(!is_visible(&dependent(Condition::NotEquals, ""), &answers("No")));
        assert!(!is_visible(&dependent(Condition::Unknown, "Yes"), &answers("Yes")));

        let malformed = dependent(Condition::Equals, "Yes");
        let malformed = Question {
            conditional: malformed.conditional.map(|mut rule| {
                rule.depends_on = "section-0".into();
                rule
            }),
            ..malformed
        };
        assert!(!is_visible(&malformed, &answers("Yes")));
    }

    #[test]
    fn joined_mode_compares_the_whole_selection() {
        let question = dependent(Condition::Equals, "Rust");
        assert!(is_visible(&question, &answers(vec!["Rust"])));
        assert!(!is_visible(&question, &answers(vec!["Rust", "Go"])));

        let contains = dependent(Condition::Contains, "go");
        assert!(is_visible(&contains, &answers(vec!["Rust", "Go"])));
    }

    #[test]
    fn any_option_mode_matches_individual_selections() {
        let selection = answers(vec!["Rust", "Go"]);
        let equals = dependent(Condition::Equals, "Go");
        assert!(is_visible_with(&equals, &selection, MultiChoiceMatch::AnyOption));

        let not_equals = dependent(Condition::NotEquals, "Go");
        assert!(!is_visible_with(&not_equals, &selection, MultiChoiceMatch::AnyOption));
        assert!(is_visible_with(
            &not_equals,
            &answers(vec!["Rust"]),
            MultiChoiceMatch::AnyOption
        ));
    }

    #[test]
    fn empty_selection_hides_dependents() {
        let question = dependent(Condition::NotEquals, "Rust");
        assert!(!is_visible(&question, &answers(Vec::<String>::new())));
    }
}
