use assess_spec::{
    AnswerSet, Assessment, AssessmentDraft, AssessmentStore, EnginePolicy, QuestionKey,
    StoreError,
};
use serde_json::json;
use tempfile::TempDir;

fn fixture() -> Assessment {
    serde_json::from_str(include_str!("../tests/fixtures/screening.json")).expect("deserialize")
}

#[test]
fn put_creates_then_merges() {
    let mut store = AssessmentStore::new();
    assert!(store.get("job-1").is_none());

    let created = store.put("job-1", AssessmentDraft::from(fixture()));
    assert!(created.is_created());
    let id = created.assessment().id.clone();
    assert!(!id.is_empty());
    assert_eq!(created.assessment().job_id, "job-1");

    let updated = store.put(
        "job-1",
        AssessmentDraft {
            title: Some("Renamed".into()),
            sections: None,
        },
    );
    assert!(!updated.is_created());
    let stored = store.get("job-1").expect("stored");
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.sections, fixture().sections);
}

#[test]
fn delete_reports_missing_jobs() {
    let mut store = AssessmentStore::new();
    store.put("job-1", AssessmentDraft::default());
    assert!(store.delete("job-1").is_ok());
    assert!(store.is_empty());
    assert!(matches!(store.delete("job-1"), Err(StoreError::NotFound(job)) if job == "job-1"));
}

#[test]
fn submit_requires_valid_answers() {
    let mut store = AssessmentStore::new();
    store.put("job-1", AssessmentDraft::from(fixture()));
    let policy = EnginePolicy::default();

    let err = store
        .submit("job-1", "cand-1", AnswerSet::new(), &policy)
        .expect_err("empty answers are rejected");
    match err {
        StoreError::InvalidSubmission { result, .. } => {
            assert_eq!(result.missing_required.len(), 3);
        }
        other => panic!("unexpected error {other}"),
    }

    let answers = AnswerSet::new()
        .with(QuestionKey::new(0, 0), "No")
        .with(QuestionKey::new(1, 0), vec!["CLI tools"])
        .with(QuestionKey::new(1, 2), "resume.pdf");
    let submission = store
        .submit("job-1", "cand-1", answers.clone(), &policy)
        .expect("valid submission");
    assert_eq!(submission.responses, answers);
    assert_eq!(store.submissions("job-1").count(), 1);

    assert!(matches!(
        store.submit("job-2", "cand-1", answers, &policy),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn snapshot_round_trip_keeps_order_and_fields() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("store.json");

    let mut store = AssessmentStore::load(&path).expect("missing file is empty");
    assert!(store.is_empty());
    store.put("job-1", AssessmentDraft::from(fixture()));
    store.save(&path).expect("save");

    let restored = AssessmentStore::load(&path).expect("load");
    assert_eq!(restored, store);
    let original = fixture();
    let loaded = restored.get("job-1").expect("stored");
    assert_eq!(loaded.title, original.title);
    assert_eq!(loaded.sections, original.sections);
}

#[test]
fn put_stamps_creation_and_update_times() {
    let mut store = AssessmentStore::new();
    let created = store.put("job-1", AssessmentDraft::from(fixture()));
    let created_at = created.assessment().created_at.expect("created at");
    assert_eq!(created.assessment().updated_at, Some(created_at));

    let updated = store.put(
        "job-1",
        AssessmentDraft {
            title: Some("Renamed".into()),
            sections: None,
        },
    );
    assert_eq!(updated.assessment().created_at, Some(created_at));
    let updated_at = updated.assessment().updated_at.expect("updated at");
    assert!(updated_at >= created_at);

    let answers = AnswerSet::new()
        .with(QuestionKey::new(0, 0), "No")
        .with(QuestionKey::new(1, 0), vec!["CLI tools"])
        .with(QuestionKey::new(1, 2), "resume.pdf");
    let submission = store
        .submit("job-1", "cand-1", answers, &EnginePolicy::default())
        .expect("valid submission");
    assert!(submission.submitted_at.is_some());
}

#[test]
fn stored_timestamps_survive_round_trip_and_merge() {
    let document = json!({
        "assessments": {
            "job-7": {
                "id": "1717000000000",
                "jobId": "job-7",
                "title": "Imported",
                "sections": [],
                "createdAt": "2024-05-29T16:26:40Z",
                "updatedAt": "2024-05-30T08:00:00Z"
            }
        },
        "submissions": [{
            "id": "s1",
            "assessmentId": "1717000000000",
            "jobId": "job-7",
            "candidateId": "cand-1",
            "responses": {},
            "submittedAt": "2024-05-31T10:00:00Z"
        }]
    });
    let mut store: AssessmentStore = serde_json::from_value(document.clone()).expect("load");
    assert_eq!(serde_json::to_value(&store).expect("encode"), document);

    store.put(
        "job-7",
        AssessmentDraft {
            title: Some("Imported again".into()),
            sections: None,
        },
    );
    let record = serde_json::to_value(store.get("job-7").expect("stored")).expect("encode");
    assert_eq!(record["createdAt"], "2024-05-29T16:26:40Z");
    assert_ne!(record["updatedAt"], "2024-05-30T08:00:00Z");
}

#[test]
fn list_filters_by_title_newest_first() {
    let mut store: AssessmentStore = serde_json::from_value(json!({
        "assessments": {
            "job-1": { "jobId": "job-1", "title": "Backend Screening",
                       "createdAt": "2024-01-01T00:00:00Z" },
            "job-2": { "jobId": "job-2", "title": "frontend SCREENING",
                       "createdAt": "2024-03-01T00:00:00Z" },
            "job-3": { "jobId": "job-3", "title": "Design Review",
                       "createdAt": "2024-02-01T00:00:00Z" }
        }
    }))
    .expect("load");
    store.put("job-4", AssessmentDraft::from(fixture()));

    let jobs = |search: Option<&str>| {
        store
            .list(search)
            .into_iter()
            .map(|assessment| assessment.job_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(jobs(Some("screening")), vec!["job-4", "job-2", "job-1"]);
    assert_eq!(jobs(Some("review")), vec!["job-3"]);
    assert_eq!(jobs(Some("")), vec!["job-4", "job-2", "job-3", "job-1"]);
    assert_eq!(jobs(None).len(), 4);
    assert!(jobs(Some("missing")).is_empty());
}
