//! Reactive recomputation of visibility and errors for a fill session.
//!
//! [`reduce`] is a pure function of `(assessment, state, event, policy)`.
//! [`FormSession`] owns one state for surfaces that prefer a mutable handle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::answers::{AnswerSet, AnswerValue};
use crate::key::QuestionKey;
use crate::policy::EnginePolicy;
use crate::spec::assessment::Assessment;
use crate::validate::validate_field;
use crate::visibility::{VisibilityMap, resolve_visibility};

pub type ErrorMap = BTreeMap<QuestionKey, String>;

/// Input to the reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormEvent {
    /// The respondent edited one answer.
    Change { key: QuestionKey, value: AnswerValue },
    /// The respondent cleared one answer.
    Clear { key: QuestionKey },
    /// Recompute visibility only, e.g. after the assessment was edited.
    Refresh,
    /// Drop every answer and error.
    Reset,
}

/// Render state of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    Hidden,
    VisibleUntouched,
    VisibleValid,
    VisibleInvalid,
}

impl QuestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionState::Hidden => "hidden",
            QuestionState::VisibleUntouched => "visible_untouched",
            QuestionState::VisibleValid => "visible_valid",
            QuestionState::VisibleInvalid => "visible_invalid",
        }
    }
}

/// Everything a fill session carries between events.
///
/// Answers and errors of questions that become hidden are kept until they
/// are explicitly overwritten or cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub visibility: VisibilityMap,
    #[serde(default)]
    pub errors: ErrorMap,
    /// Visible questions edited since they were last revealed.
    #[serde(default)]
    pub touched: BTreeSet<QuestionKey>,
}

impl FormState {
    /// Fresh state for `answers` with visibility resolved and no errors.
    pub fn new(assessment: &Assessment, answers: AnswerSet, policy: &EnginePolicy) -> Self {
        let visibility = resolve_visibility(assessment, &answers, policy);
        Self {
            answers,
            visibility,
            errors: ErrorMap::new(),
            touched: BTreeSet::new(),
        }
    }

    pub fn is_visible(&self, key: &QuestionKey) -> bool {
        self.visibility.get(key).copied().unwrap_or(false)
    }

    pub fn error(&self, key: &QuestionKey) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// `None` when `key` addresses no question of the assessment.
    pub fn question_state(&self, key: &QuestionKey) -> Option<QuestionState> {
        let visible = self.visibility.get(key).copied()?;
        Some(if !visible {
            QuestionState::Hidden
        } else if !self.touched.contains(key) {
            QuestionState::VisibleUntouched
        } else if self.errors.contains_key(key) {
            QuestionState::VisibleInvalid
        } else {
            QuestionState::VisibleValid
        })
    }

    pub fn question_states(&self) -> BTreeMap<QuestionKey, QuestionState> {
        self.visibility
            .keys()
            .filter_map(|key| self.question_state(key).map(|state| (*key, state)))
            .collect()
    }
}

/// Applies `event` and returns the next state.
pub fn reduce(
    assessment: &Assessment,
    state: &FormState,
    event: &FormEvent,
    policy: &EnginePolicy,
) -> FormState {
    let mut next = state.clone();
    let mut changed = None;

    match event {
        FormEvent::Change { key, value } => {
            if assessment.question(*key).is_some() {
                next.answers.insert(*key, value.clone());
                changed = Some(*key);
            } else {
                warn!(key = %key, "ignoring change for unknown question");
            }
        }
        FormEvent::Clear { key } => {
            next.answers.remove(key);
            next.errors.remove(key);
            next.touched.remove(key);
        }
        FormEvent::Refresh => {}
        FormEvent::Reset => next = FormState::default(),
    }

    next.visibility = resolve_visibility(assessment, &next.answers, policy);
    let cleared = VisibilityMap::new();
    let previous = if matches!(event, FormEvent::Reset) {
        &cleared
    } else {
        &state.visibility
    };
    apply_transitions(assessment, previous, &mut next, policy);

    if let Some(key) = changed
        && next.is_visible(&key)
    {
        next.touched.insert(key);
        revalidate(assessment, &mut next, key);
    }

    // Errors of questions removed from the assessment have nowhere to render.
    next.errors.retain(|key, _| next.visibility.contains_key(key));
    next.touched.retain(|key| next.visibility.get(key).copied().unwrap_or(false));

    next
}

fn apply_transitions(
    assessment: &Assessment,
    previous: &VisibilityMap,
    next: &mut FormState,
    policy: &EnginePolicy,
) {
    let transitions = next
        .visibility
        .iter()
        .filter_map(|(key, visible)| {
            let was_visible = previous.get(key).copied();
            (was_visible.is_some() && was_visible != Some(*visible)).then_some((*key, *visible))
        })
        .collect::<Vec<_>>();

    for (key, visible) in transitions {
        if visible {
            debug!(key = %key, "question revealed");
            if policy.revalidate_on_reveal && next.answers.contains(&key) {
                revalidate(assessment, next, key);
            }
        } else {
            debug!(key = %key, "question hidden; answer retained");
            next.touched.remove(&key);
        }
    }
}

fn revalidate(assessment: &Assessment, state: &mut FormState, key: QuestionKey) {
    let Some(question) = assessment.question(key) else {
        return;
    };
    match validate_field(question, state.answers.get(&key)) {
        Some(violation) => {
            debug!(key = %key, code = violation.code(), "answer invalid");
            state.errors.insert(key, violation.to_string());
        }
        None => {
            state.errors.remove(&key);
        }
    }
}

/// A fill session bound to one assessment.
#[derive(Debug, Clone)]
pub struct FormSession {
    assessment: Assessment,
    policy: EnginePolicy,
    state: FormState,
}

impl FormSession {
    pub fn new(assessment: Assessment, policy: EnginePolicy) -> Self {
        Self::with_answers(assessment, policy, AnswerSet::new())
    }

    pub fn with_answers(assessment: Assessment, policy: EnginePolicy, answers: AnswerSet) -> Self {
        let state = FormState::new(&assessment, answers, &policy);
        Self {
            assessment,
            policy,
            state,
        }
    }

    pub fn apply(&mut self, event: &FormEvent) -> &FormState {
        self.state = reduce(&self.assessment, &self.state, event, &self.policy);
        &self.state
    }

    pub fn change(&mut self, key: QuestionKey, value: impl Into<AnswerValue>) -> &FormState {
        self.apply(&FormEvent::Change {
            key,
            value: value.into(),
        })
    }

    /// Swaps in an edited assessment, keeping the session's answers.
    pub fn replace_assessment(&mut self, assessment: Assessment) -> &FormState {
        self.assessment = assessment;
        self.apply(&FormEvent::Refresh)
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn into_state(self) -> FormState {
        self.state
    }
}
