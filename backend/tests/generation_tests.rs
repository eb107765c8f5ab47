mod support;

use std::collections::HashSet;
use std::time::Duration;

use support::*;
use timetable_rust::db::ScheduleRepository;
use timetable_rust::models::{
    DayDefinition, EducationLevel, EntryFilter, EntryType, ScheduleEntry, TimeGrid,
};
use timetable_rust::scheduler::ConflictRecord;
use timetable_rust::services::{
    AuditAction, GenerateOptions, GenerateRequest, GenerationSettings, ServiceError,
};

async fn college_entries(harness: &Harness) -> Vec<ScheduleEntry> {
    harness
        .repo
        .list_entries(EducationLevel::College, &EntryFilter::default())
        .await
        .unwrap()
}

fn slots(entries: &[ScheduleEntry]) -> Vec<(u8, String)> {
    let mut keys: Vec<_> = entries
        .iter()
        .map(|e| (e.day_index, e.start.format("%H:%M").to_string()))
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_first_fit_fills_days_in_order() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 4)],
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College).with_classes([SIXIEME_A]))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 4);
    assert_eq!(outcome.cohort_year_id, COLLEGE_CURRENT);
    assert!(outcome.conflicts_by_class.is_empty());
    assert!(outcome.skipped_class_ids.is_empty());

    let entries = college_entries(&harness).await;
    assert_eq!(
        slots(&entries),
        vec![
            (1, "08:00".to_string()),
            (1, "09:00".to_string()),
            (2, "08:00".to_string()),
            (2, "09:00".to_string()),
        ]
    );
    for entry in &entries {
        assert_eq!(entry.teacher_id, Some(DIALLO));
        assert_eq!(entry.subject_id, MATH);
        assert_eq!(entry.cohort_year_id, COLLEGE_CURRENT);
        assert_eq!(entry.entry_type, EntryType::Teaching);
        assert_eq!(entry.end - entry.start, chrono::Duration::hours(1));
    }
    assert_eq!(entries[0].day_name, "Lundi");
    assert_eq!(entries[3].day_name, "Mardi");
}

#[tokio::test]
async fn test_busy_teacher_moves_second_class_to_next_slot() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 1),
            requirement(DIALLO, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
        ],
    );

    let outcome = harness
        .service
        .generate(
            GenerateRequest::for_level(EducationLevel::College)
                .with_classes([SIXIEME_A, SIXIEME_B]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 2);
    assert_eq!(outcome.conflict_count(), 1);
    assert!(!outcome.conflicts_by_class.contains_key(&SIXIEME_A));

    match &outcome.conflicts_by_class[&SIXIEME_B][..] {
        [ConflictRecord::TeacherConflict {
            class_id,
            day_index,
            start,
            teacher_name,
            subject_name,
            occupied_by_class_id,
            occupied_by_class_name,
            ..
        }] => {
            assert_eq!(*class_id, SIXIEME_B);
            assert_eq!(*day_index, 1);
            assert_eq!(*start, hm("08:00"));
            assert_eq!(teacher_name.as_deref(), Some("Awa Diallo"));
            assert_eq!(subject_name.as_deref(), Some("Mathématiques"));
            assert_eq!(*occupied_by_class_id, SIXIEME_A);
            assert_eq!(occupied_by_class_name.as_deref(), Some("6e A"));
        }
        other => panic!("unexpected conflicts: {:?}", other),
    }

    let b_entries = harness
        .repo
        .list_entries(
            EducationLevel::College,
            &EntryFilter::for_cohort(COLLEGE_CURRENT).with_class(SIXIEME_B),
        )
        .await
        .unwrap();
    assert_eq!(slots(&b_entries), vec![(1, "09:00".to_string())]);
}

#[tokio::test]
async fn test_shortfall_is_reported_not_fatal() {
    let harness = Harness::new(
        two_slot_grid(4),
        vec![requirement(TRAORE, FRENCH, SIXIEME_A, COLLEGE_CURRENT, 10)],
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College).with_classes([SIXIEME_A]))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 8);
    match &outcome.conflicts_by_class[&SIXIEME_A][..] {
        [ConflictRecord::InsufficientSlots {
            needed,
            assigned,
            teacher_name,
            subject_name,
            ..
        }] => {
            assert_eq!((*needed, *assigned), (10, 8));
            assert_eq!(teacher_name.as_deref(), Some("Moussa Traoré"));
            assert_eq!(subject_name.as_deref(), Some("Français"));
        }
        other => panic!("unexpected conflicts: {:?}", other),
    }
}

#[tokio::test]
async fn test_conflict_report_wire_format() {
    let harness = Harness::new(
        two_slot_grid(1),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 2),
            requirement(DIALLO, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
        ],
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["generatedCount"], 2);
    assert_eq!(json["cohortYearId"], 1);
    let records = json["conflictsByClass"]["11"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["type"], "teacher_conflict");
    assert_eq!(records[0]["dayName"], "Lundi");
    assert_eq!(records[0]["start"], "08:00");
    assert_eq!(records[0]["end"], "09:00");
    assert_eq!(records[0]["occupiedByClassName"], "6e A");
    assert_eq!(records[1]["start"], "09:00");
    assert_eq!(records[2]["type"], "insufficient_slots");
    assert_eq!(records[2]["needed"], 1);
    assert_eq!(records[2]["assigned"], 0);
}

#[tokio::test]
async fn test_regeneration_replaces_entries() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 3),
            requirement(TRAORE, FRENCH, SIXIEME_A, COLLEGE_CURRENT, 2),
        ],
    );
    let request = GenerateRequest::for_level(EducationLevel::College).with_classes([SIXIEME_A]);

    harness.service.generate(request.clone()).await.unwrap();
    let first = slots(&college_entries(&harness).await);
    let outcome = harness.service.generate(request).await.unwrap();
    let second = slots(&college_entries(&harness).await);

    assert_eq!(outcome.generated_count, 5);
    assert_eq!(first, second);
    assert_eq!(harness.repo.entry_count(), 5);
}

#[tokio::test]
async fn test_partial_regeneration_respects_stored_commitments() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 1),
            requirement(DIALLO, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
        ],
    );
    harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College).with_classes([SIXIEME_B]))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 1);
    assert_eq!(outcome.conflicts_by_class[&SIXIEME_B].len(), 1);
    let b_entries = harness
        .repo
        .list_entries(
            EducationLevel::College,
            &EntryFilter::for_cohort(COLLEGE_CURRENT).with_class(SIXIEME_B),
        )
        .await
        .unwrap();
    assert_eq!(slots(&b_entries), vec![(1, "09:00".to_string())]);
    assert_eq!(harness.repo.entry_count(), 2);
}

#[tokio::test]
async fn test_concurrent_generations_are_serialized() {
    // Both runs read the stored commitments before either writes unless the
    // cohort lock orders them.
    let harness = Harness::yielding(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 1),
            requirement(DIALLO, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
        ],
    );
    let level = GenerateRequest::for_level(EducationLevel::College);

    let outcomes = futures::future::join_all([
        harness.service.generate(level.clone().with_classes([SIXIEME_A])),
        harness.service.generate(level.with_classes([SIXIEME_B])),
    ])
    .await;

    let outcomes: Vec<_> = outcomes.into_iter().map(|o| o.unwrap()).collect();
    assert_eq!(
        outcomes.iter().map(|o| o.conflict_count()).sum::<usize>(),
        1
    );
    let entries = college_entries(&harness).await;
    assert_eq!(entries.len(), 2);
    let booked: HashSet<_> = entries
        .iter()
        .map(|e| (e.teacher_id, e.slot_key()))
        .collect();
    assert_eq!(booked.len(), 2);
}

#[tokio::test]
async fn test_no_double_booking_on_default_grid() {
    let mut requirements = Vec::new();
    for class in [SIXIEME_A, SIXIEME_B] {
        requirements.push(requirement(DIALLO, MATH, class, COLLEGE_CURRENT, 20));
        requirements.push(requirement(TRAORE, FRENCH, class, COLLEGE_CURRENT, 20));
    }
    let harness = Harness::new(TimeGrid::default(), requirements);

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();
    let entries = college_entries(&harness).await;
    assert_eq!(outcome.generated_count, entries.len());

    let mut class_slots = HashSet::new();
    let mut teacher_slots = HashSet::new();
    for entry in &entries {
        assert!(class_slots.insert((entry.class_id, entry.slot_key())));
        assert!(teacher_slots.insert((entry.teacher_id, entry.slot_key())));
        assert!(harness
            .service
            .grid()
            .find_slot(entry.day_index, entry.start)
            .is_some_and(|s| s.is_teaching()));
    }
    // 6e B gets Diallo where 6e A has Traoré, and the other way round.
    assert_eq!(entries.len(), 80);
    assert_eq!(outcome.conflicts_by_class.len(), 1);
    assert_eq!(outcome.conflicts_by_class[&SIXIEME_B].len(), 20);
}

#[tokio::test]
async fn test_whole_level_in_class_id_order() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 1),
            requirement(TRAORE, MATH, SECONDE_A, LYCEE_CURRENT, 1),
        ],
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();

    // 6e A is processed first and keeps the first slot.
    assert!(!outcome.conflicts_by_class.contains_key(&SIXIEME_A));
    assert!(outcome.conflicts_by_class.contains_key(&SIXIEME_B));
    assert_eq!(
        harness
            .repo
            .list_entries(EducationLevel::Lycee, &EntryFilter::default())
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn test_explicit_cohort_year_and_room() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 2),
            requirement(TRAORE, FRENCH, SIXIEME_A, COLLEGE_PREVIOUS, 3),
        ],
    );

    let mut request = GenerateRequest::for_level(EducationLevel::College)
        .with_classes([SIXIEME_A])
        .with_cohort_year(COLLEGE_PREVIOUS);
    request.options = GenerateOptions {
        default_room: Some("B12".into()),
        ..request.options
    };
    let outcome = harness.service.generate(request).await.unwrap();

    assert_eq!(outcome.cohort_year_id, COLLEGE_PREVIOUS);
    assert_eq!(outcome.generated_count, 3);
    let entries = college_entries(&harness).await;
    assert!(entries
        .iter()
        .all(|e| e.cohort_year_id == COLLEGE_PREVIOUS && e.room == "B12"));
}

#[tokio::test]
async fn test_zero_budget_skips_every_class() {
    let harness = Harness::with_settings(
        two_slot_grid(6),
        vec![
            requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 1),
            requirement(TRAORE, MATH, SIXIEME_B, COLLEGE_CURRENT, 1),
        ],
        GenerationSettings {
            default_room: String::new(),
            max_duration: Some(Duration::ZERO),
        },
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 0);
    assert_eq!(outcome.skipped_class_ids, vec![SIXIEME_A, SIXIEME_B]);
    assert_eq!(harness.repo.entry_count(), 0);
}

#[tokio::test]
async fn test_duplicate_class_ids_are_generated_once() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 2)],
    );

    let outcome = harness
        .service
        .generate(
            GenerateRequest::for_level(EducationLevel::College)
                .with_classes([SIXIEME_A, SIXIEME_A]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 2);
    assert!(outcome.conflicts_by_class.is_empty());
}

#[tokio::test]
async fn test_rejects_invalid_requests() {
    let harness = Harness::new(two_slot_grid(6), vec![]);
    let college = || GenerateRequest::for_level(EducationLevel::College);

    let empty = harness
        .service
        .generate(college().with_classes(Vec::new()))
        .await;
    assert!(matches!(empty, Err(ServiceError::Validation(_))));

    let wrong_level = harness
        .service
        .generate(college().with_classes([SECONDE_A]))
        .await;
    assert!(matches!(wrong_level, Err(ServiceError::Validation(_))));

    let wrong_cohort = harness
        .service
        .generate(college().with_cohort_year(LYCEE_CURRENT))
        .await;
    assert!(matches!(wrong_cohort, Err(ServiceError::Validation(_))));

    let unknown = harness
        .service
        .generate(college().with_classes([timetable_rust::models::ClassId(99)]))
        .await;
    assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

    let no_cohort = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::Primaire))
        .await;
    assert!(matches!(no_cohort, Err(ServiceError::NotFound(_))));

    assert_eq!(harness.repo.entry_count(), 0);
    assert!(harness.audit.events().is_empty());
}

#[tokio::test]
async fn test_half_day_override_limits_slots() {
    let grid = TimeGrid::new(
        vec![
            DayDefinition {
                index: 1,
                name: "Lundi".into(),
                slots: None,
            },
            DayDefinition {
                index: 3,
                name: "Mercredi".into(),
                slots: Some(vec![]),
            },
        ],
        two_slot_grid(1).template().to_vec(),
    )
    .unwrap();
    let harness = Harness::new(
        grid,
        vec![requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 3)],
    );

    let outcome = harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 2);
    assert_eq!(outcome.conflict_count(), 1);
    assert!(college_entries(&harness)
        .await
        .iter()
        .all(|e| e.day_index == 1));
}

#[tokio::test]
async fn test_generation_emits_audit_event() {
    let harness = Harness::new(
        two_slot_grid(6),
        vec![requirement(DIALLO, MATH, SIXIEME_A, COLLEGE_CURRENT, 2)],
    );

    harness
        .service
        .generate(GenerateRequest::for_level(EducationLevel::College))
        .await
        .unwrap();

    let events = harness.audit.events();
    assert_eq!(harness.audit.actions(), vec![AuditAction::GenerationCompleted]);
    assert_eq!(events[0].level, EducationLevel::College);
    assert_eq!(events[0].cohort_year_id, COLLEGE_CURRENT);
    assert_eq!(events[0].details["generatedCount"], 2);
}
