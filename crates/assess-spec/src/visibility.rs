use std::collections::BTreeMap;

use crate::answers::AnswerSet;
use crate::conditional::is_visible_with;
use crate::key::QuestionKey;
use crate::policy::EnginePolicy;
use crate::spec::assessment::Assessment;

pub type VisibilityMap = BTreeMap<QuestionKey, bool>;

/// Visibility of every question, walked in document order.
///
/// A rule pointing at the question itself or at a later question never
/// resolves. With `cascade_hidden`, the answer of a hidden dependency is
/// ignored.
pub fn resolve_visibility(
    assessment: &Assessment,
    answers: &AnswerSet,
    policy: &EnginePolicy,
) -> VisibilityMap {
    let mut map = VisibilityMap::new();

    for (key, question) in assessment.questions() {
        let visible = match &question.conditional {
            None => true,
            Some(rule) => match rule.dependency() {
                Some(dependency) if dependency < key => {
                    let hidden_dependency = policy.cascade_hidden
                        && !map.get(&dependency).copied().unwrap_or(false);
                    !hidden_dependency
                        && is_visible_with(question, answers, policy.multi_choice_match)
                }
                _ => false,
            },
        };
        map.insert(key, visible);
    }

    map
}

pub fn visible_count(visibility: &VisibilityMap) -> usize {
    visibility.values().filter(|visible| **visible).count()
}
