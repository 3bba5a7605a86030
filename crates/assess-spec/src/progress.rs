use crate::key::QuestionKey;
use crate::reactor::FormState;
use crate::spec::assessment::Assessment;

/// Visible questions holding a non-empty answer.
pub fn answered_count(assessment: &Assessment, state: &FormState) -> usize {
    assessment
        .questions()
        .filter(|(key, _)| state.is_visible(key) && state.answers.answered(key).is_some())
        .count()
}

/// First visible question, in document order, that still needs input:
/// either it has never been answered or its answer is currently invalid.
pub fn next_question(assessment: &Assessment, state: &FormState) -> Option<QuestionKey> {
    assessment
        .questions()
        .map(|(key, _)| key)
        .find(|key| {
            state.is_visible(key)
                && (!state.answers.contains(key) || state.errors.contains_key(key))
        })
}
