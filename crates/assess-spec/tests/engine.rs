use assess_spec::{
    AnswerSet, Assessment, Condition, EnginePolicy, FieldViolation, FormEvent, FormSession,
    FormState, NumericValidation, Question, QuestionKey, QuestionKind, QuestionState, Section,
    TextValidation, is_visible, reduce, resolve_visibility, validate_answers, validate_field,
};

fn fixture() -> Assessment {
    serde_json::from_str(include_str!("../tests/fixtures/screening.json")).expect("deserialize")
}

fn key(raw: &str) -> QuestionKey {
    raw.parse().expect("question key")
}

fn short_text(min_length: Option<usize>) -> Question {
    Question::new(
        "q",
        "Name",
        QuestionKind::ShortText {
            validation: TextValidation {
                min_length,
                max_length: None,
            },
        },
    )
}

#[test]
fn contains_rule_matches_substring() {
    let question = short_text(None).with_conditional("0-0", Condition::Contains, "Yes");
    let yes = AnswerSet::new().with(key("0-0"), "Yes, absolutely");
    let no = AnswerSet::new().with(key("0-0"), "No");
    assert!(is_visible(&question, &yes));
    assert!(!is_visible(&question, &no));
}

#[test]
fn required_and_length_messages() {
    let mut required = short_text(None);
    required.required = true;
    assert_eq!(
        validate_field(&required, Some(&"".into())).map(|v| v.to_string()),
        Some("This field is required".to_string())
    );
    assert_eq!(validate_field(&required, None), Some(FieldViolation::Required));
    assert_eq!(validate_field(&required, Some(&"x".into())), None);

    let min_five = short_text(Some(5));
    assert_eq!(
        validate_field(&min_five, Some(&"abc".into())).map(|v| v.to_string()),
        Some("Must be at least 5 characters".to_string())
    );
    assert_eq!(validate_field(&min_five, Some(&"abcdef".into())), None);
}

#[test]
fn numeric_range_messages() {
    let question = Question::new(
        "n",
        "Score",
        QuestionKind::Numeric {
            validation: NumericValidation {
                min: Some(0.0),
                max: Some(100.0),
            },
        },
    );
    assert_eq!(
        validate_field(&question, Some(&"150".into())).map(|v| v.to_string()),
        Some("Must be no more than 100".to_string())
    );
    assert_eq!(
        validate_field(&question, Some(&"-1".into())).map(|v| v.to_string()),
        Some("Must be at least 0".to_string())
    );
    assert_eq!(validate_field(&question, Some(&"50".into())), None);
}

#[test]
fn initial_visibility_follows_rules() {
    let assessment = fixture();
    let visibility = resolve_visibility(&assessment, &AnswerSet::new(), &EnginePolicy::default());
    let visible = visibility
        .iter()
        .filter(|(_, visible)| **visible)
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();
    assert_eq!(visible, vec!["0-0", "1-0", "1-2", "1-3"]);
}

#[test]
fn change_reveals_dependents_and_validates_only_the_edited_question() {
    let assessment = fixture();
    let mut session = FormSession::new(assessment, EnginePolicy::default());

    let state = session.change(key("0-0"), "Yes");
    assert!(state.is_visible(&key("0-1")));
    assert!(!state.is_visible(&key("0-2")));
    // Revealed but untouched required question has no error yet.
    assert_eq!(state.error(&key("0-1")), None);
    assert_eq!(
        state.question_state(&key("0-1")),
        Some(QuestionState::VisibleUntouched)
    );

    let state = session.change(key("0-1"), "99");
    assert_eq!(state.error(&key("0-1")), Some("Must be no more than 40"));
    assert_eq!(
        state.question_state(&key("0-1")),
        Some(QuestionState::VisibleInvalid)
    );

    let state = session.change(key("0-1"), "7");
    assert_eq!(state.error(&key("0-1")), None);
    assert_eq!(
        state.question_state(&key("0-1")),
        Some(QuestionState::VisibleValid)
    );
}

#[test]
fn hiding_a_question_keeps_its_answer_and_error() {
    let mut session = FormSession::new(fixture(), EnginePolicy::default());
    session.change(key("0-0"), "Yes");
    session.change(key("0-1"), "99");

    let state = session.change(key("0-0"), "No");
    assert!(!state.is_visible(&key("0-1")));
    assert_eq!(state.answers.get(&key("0-1")), Some(&"99".into()));
    assert_eq!(state.error(&key("0-1")), Some("Must be no more than 40"));
    assert_eq!(state.question_state(&key("0-1")), Some(QuestionState::Hidden));
    assert!(state.touched.contains(&key("0-0")));
    assert!(!state.touched.contains(&key("0-1")));

    let state = session.change(key("0-0"), "Yes");
    assert_eq!(state.answers.get(&key("0-1")), Some(&"99".into()));
    assert_eq!(
        state.question_state(&key("0-1")),
        Some(QuestionState::VisibleUntouched)
    );
}

#[test]
fn reveal_does_not_revalidate_by_default() {
    let mut session = FormSession::with_answers(
        fixture(),
        EnginePolicy::default(),
        AnswerSet::new().with(key("0-1"), "99"),
    );
    let state = session.change(key("0-0"), "Yes");
    assert_eq!(state.error(&key("0-1")), None);
}

#[test]
fn reveal_revalidates_retained_answers_when_enabled() {
    let policy = EnginePolicy {
        revalidate_on_reveal: true,
        ..EnginePolicy::default()
    };
    let mut session = FormSession::with_answers(
        fixture(),
        policy,
        AnswerSet::new().with(key("0-1"), "99"),
    );
    let state = session.change(key("0-0"), "Yes");
    assert_eq!(state.error(&key("0-1")), Some("Must be no more than 40"));
}

#[test]
fn multi_choice_dependency_uses_joined_string() {
    let mut session = FormSession::new(fixture(), EnginePolicy::default());
    let state = session.change(key("1-0"), vec!["Async", "Embedded"]);
    assert!(state.is_visible(&key("1-1")));

    let state = session.change(key("1-0"), Vec::<String>::new());
    assert!(!state.is_visible(&key("1-1")));
    assert_eq!(state.error(&key("1-0")), Some("This field is required"));
}

#[test]
fn refresh_is_idempotent() {
    let assessment = fixture();
    let policy = EnginePolicy::default();
    let mut state = FormState::new(&assessment, AnswerSet::new(), &policy);
    for (raw, value) in [("0-0", "Yes"), ("0-1", "120"), ("1-2", "cv.pdf")] {
        state = reduce(
            &assessment,
            &state,
            &FormEvent::Change {
                key: key(raw),
                value: value.into(),
            },
            &policy,
        );
    }

    let once = reduce(&assessment, &state, &FormEvent::Refresh, &policy);
    let twice = reduce(&assessment, &once, &FormEvent::Refresh, &policy);
    assert_eq!(once, state);
    assert_eq!(once, twice);
}

#[test]
fn change_for_unknown_question_is_ignored() {
    let assessment = fixture();
    let policy = EnginePolicy::default();
    let state = FormState::new(&assessment, AnswerSet::new(), &policy);
    let next = reduce(
        &assessment,
        &state,
        &FormEvent::Change {
            key: key("9-9"),
            value: "x".into(),
        },
        &policy,
    );
    assert_eq!(next, state);
}

#[test]
fn clear_and_reset_drop_answers() {
    let mut session = FormSession::new(fixture(), EnginePolicy::default());
    session.change(key("1-3"), "https://example.dev");
    session.change(key("1-2"), "");

    let state = session.apply(&FormEvent::Clear { key: key("1-2") });
    assert!(!state.answers.contains(&key("1-2")));
    assert_eq!(state.error(&key("1-2")), None);
    assert_eq!(
        state.question_state(&key("1-2")),
        Some(QuestionState::VisibleUntouched)
    );

    let state = session.apply(&FormEvent::Reset);
    assert!(state.answers.is_empty());
    assert!(state.errors.is_empty());
    assert_eq!(state.visibility.len(), 7);
}

#[test]
fn forward_references_never_resolve() {
    let assessment = Assessment::new("job", "Forward").with_section(
        Section::new("s", "Only")
            .with_question(short_text(None).with_conditional("0-1", Condition::Equals, "go"))
            .with_question(short_text(None)),
    );
    let answers = AnswerSet::new().with(key("0-1"), "go");
    let visibility = resolve_visibility(&assessment, &answers, &EnginePolicy::default());
    assert_eq!(visibility.get(&key("0-0")), Some(&false));
    assert_eq!(visibility.get(&key("0-1")), Some(&true));
}

#[test]
fn cascade_hidden_ignores_answers_of_hidden_dependencies() {
    let assessment = Assessment::new("job", "Chain").with_section(
        Section::new("s", "Chain")
            .with_question(short_text(None))
            .with_question(short_text(None).with_conditional("0-0", Condition::Equals, "a"))
            .with_question(short_text(None).with_conditional("0-1", Condition::Equals, "b")),
    );
    let answers = AnswerSet::new()
        .with(key("0-0"), "z")
        .with(key("0-1"), "b");

    let retained = resolve_visibility(&assessment, &answers, &EnginePolicy::default());
    assert_eq!(retained.get(&key("0-2")), Some(&true));

    let policy = EnginePolicy {
        cascade_hidden: true,
        ..EnginePolicy::default()
    };
    let cascaded = resolve_visibility(&assessment, &answers, &policy);
    assert_eq!(cascaded.get(&key("0-2")), Some(&false));
}

#[test]
fn submission_validation_skips_hidden_questions() {
    let assessment = fixture();
    let answers = AnswerSet::new()
        .with(key("0-0"), "No")
        .with(key("0-1"), "999")
        .with(key("1-0"), vec!["Async"])
        .with(key("1-2"), "resume.pdf");
    let result = validate_answers(&assessment, &answers, &EnginePolicy::default());
    assert!(result.valid, "{result:?}");

    let answers = answers.with(key("0-2"), "too short").with(key("5-0"), "stray");
    let result = validate_answers(&assessment, &answers, &EnginePolicy::default());
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].key, key("0-2"));
    assert_eq!(result.errors[0].code, "min_length");
    assert_eq!(result.unknown_keys, vec![key("5-0")]);
}

#[test]
fn submission_validation_lists_missing_required() {
    let result = validate_answers(&fixture(), &AnswerSet::new(), &EnginePolicy::default());
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec![key("0-0"), key("1-0"), key("1-2")]);
}

#[test]
fn assessment_round_trips_through_json() {
    let assessment = fixture();
    let json = serde_json::to_string(&assessment).expect("serialize");
    let restored: Assessment = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, assessment);

    let ids = restored
        .questions()
        .map(|(_, question)| question.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["0-0", "0-1", "0-2", "1-0", "1-1", "1-2", "1-3"]);
    assert_eq!(restored.sections[0].description.as_deref(), Some("Tell us about your experience"));
}

#[test]
fn unknown_condition_tags_deserialize_and_hide() {
    let question: Question = serde_json::from_value(serde_json::json!({
        "id": "x",
        "type": "short-text",
        "text": "Hidden",
        "conditional": { "dependsOn": "0-0", "condition": "starts-with", "value": "a" }
    }))
    .expect("deserialize");
    let answers = AnswerSet::new().with(key("0-0"), "abc");
    assert!(!is_visible(&question, &answers));
}
