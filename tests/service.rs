#![forbid(unsafe_code)]
mod common;

use common::{d, session_for, two_parent_family, weekly_draft, RecordingStore};
use garde::{
    CalendarEvent, Config, CustodyPattern, EventParent, EventType, FamilyId, ParentRole,
    RequestType, ScheduleDraft, ScheduleOutcome, Source, SwapDecision, SwapStatus,
};
use chrono::NaiveDate;
use std::sync::Arc;

#[test]
fn roles_follow_lexicographic_user_order() {
    let store = Arc::new(RecordingStore::default());
    let mut zed = session_for(&store, Config::default(), "zed", "Zed", None);
    let family_id = zed.create_family("Famille").unwrap();
    assert_eq!(zed.role().unwrap(), ParentRole::Parent1);

    let mut amy = session_for(&store, Config::default(), "amy", "Amy", None);
    amy.join_family(&family_id).unwrap();
    zed.sync().unwrap();

    assert_eq!(amy.role().unwrap(), ParentRole::Parent1);
    assert_eq!(zed.role().unwrap(), ParentRole::Parent2);
    assert_eq!(zed.display_name(ParentRole::Parent1), "Amy");

    let mut third = session_for(&store, Config::default(), "max", "Max", None);
    assert_eq!(third.join_family(&family_id).unwrap_err().code(), "family-full");
}

#[test]
fn operations_without_family_fail_with_missing_context() {
    let store = Arc::new(RecordingStore::default());
    let lonely = session_for(&store, Config::default(), "alice", "Alice", None);
    let ev = CalendarEvent::all_day("Foot", d(2024, 1, 8), EventType::Activity, EventParent::Both);
    assert_eq!(lonely.add_event(ev).unwrap_err().code(), "missing-family-context");
    assert_eq!(lonely.sync().unwrap_err().code(), "missing-family-context");

    let mut ghost = session_for(&store, Config::default(), "bob", "Bob", None);
    let err = ghost.join_family(&FamilyId::new("nope")).unwrap_err();
    assert_eq!(err.code(), "family-not-found");
}

#[test]
fn non_member_session_is_rejected() {
    let (store, alice, _bob) = two_parent_family(Config::default());
    let family_id = alice.family_id().unwrap().clone();
    let intruder = session_for(&store, Config::default(), "eve", "Eve", Some(&family_id));
    intruder.sync().unwrap();
    assert_eq!(intruder.role().unwrap_err().code(), "not-a-family-member");
}

#[test]
fn missing_display_names_fall_back_to_configured_defaults() {
    let mut config = Config::default();
    config.parent_names.parent2 = "Papa".into();
    let store = Arc::new(RecordingStore::default());
    let mut alice = session_for(&store, config.clone(), "alice", "Alice", None);
    let family_id = alice.create_family("Famille").unwrap();
    let mut bob = session_for(&store, config, "bob", "  ", None);
    bob.join_family(&family_id).unwrap();

    assert_eq!(bob.display_name(ParentRole::Parent1), "Alice");
    assert_eq!(bob.display_name(ParentRole::Parent2), "Papa");
}

#[test]
fn schedule_change_requires_the_other_parent() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    bob.sync().unwrap();

    let mut draft = ScheduleDraft::new("Alterné", CustodyPattern::WeekOnWeekOff, d(2024, 2, 4));
    draft.end_date = Some(d(2024, 12, 31));
    assert_eq!(
        bob.submit_schedule(draft).unwrap(),
        ScheduleOutcome::PendingApproval
    );

    // toujours l'ancien calendrier tant que rien n'est approuvé
    assert_eq!(bob.who_has(d(2024, 2, 15)).parent, Some(ParentRole::Parent2));
    assert_eq!(
        bob.approve_schedule_change().unwrap_err().code(),
        "requester-cannot-approve"
    );

    alice.sync().unwrap();
    let pending = alice
        .schedule()
        .as_ref()
        .clone()
        .unwrap()
        .pending_approval
        .unwrap();
    assert_eq!(pending.requested_by_name, "Bob");
    assert_eq!(
        alice.cancel_schedule_change().unwrap_err().code(),
        "only-requester-can-cancel"
    );

    alice.approve_schedule_change().unwrap();
    let schedule = alice.schedule().as_ref().clone().unwrap();
    assert_eq!(schedule.pattern, CustodyPattern::WeekOnWeekOff);
    assert!(schedule.pending_approval.is_none());
    // 2024-02-15 : deuxième semaine depuis le 2024-02-04
    assert_eq!(alice.who_has(d(2024, 2, 15)).parent, Some(ParentRole::Parent2));
    assert_eq!(alice.who_has(d(2024, 2, 5)).parent, Some(ParentRole::Parent1));
    assert_eq!(
        alice.approve_schedule_change().unwrap_err().code(),
        "no-pending-approval"
    );
}

#[test]
fn rejected_and_cancelled_schedule_changes_leave_schedule_untouched() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    bob.sync().unwrap();
    let before = alice.schedule().as_ref().clone().unwrap();

    let alt = ScheduleDraft::new("Alterné", CustodyPattern::WeekOnWeekOff, d(2024, 3, 3));
    bob.submit_schedule(alt.clone()).unwrap();
    alice.sync().unwrap();
    alice.reject_schedule_change().unwrap();
    assert_eq!(alice.schedule().as_ref().clone().unwrap(), before);

    bob.sync().unwrap();
    bob.submit_schedule(alt).unwrap();
    bob.cancel_schedule_change().unwrap();
    alice.sync().unwrap();
    assert_eq!(alice.schedule().as_ref().clone().unwrap(), before);
}

#[test]
fn approved_schedule_purges_stale_custody_events_in_batches() {
    let mut config = Config::default();
    config.batch_limit = 2;
    let (store, alice, bob) = two_parent_family(config);

    for day in 5..10 {
        let ev = CalendarEvent::all_day("Garde", d(2024, 3, day), EventType::Custody, EventParent::Parent1);
        alice.add_event(ev).unwrap();
    }
    let before_start = CalendarEvent::all_day("Garde", d(2024, 2, 1), EventType::Custody, EventParent::Parent2);
    let school = CalendarEvent::all_day("École", d(2024, 3, 6), EventType::School, EventParent::Both);
    alice.add_event(before_start.clone()).unwrap();
    alice.add_event(school.clone()).unwrap();

    bob.sync().unwrap();
    bob.submit_schedule(ScheduleDraft::new("Alterné", CustodyPattern::WeekOnWeekOff, d(2024, 3, 3)))
        .unwrap();
    alice.sync().unwrap();
    store.delete_batches.lock().unwrap().clear();
    alice.approve_schedule_change().unwrap();

    assert_eq!(*store.delete_batches.lock().unwrap(), vec![2, 2, 1]);
    let remaining: Vec<_> = alice.events().iter().map(|e| e.id.clone()).collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&before_start.id));
    assert!(remaining.contains(&school.id));
}

#[test]
fn swap_approval_creates_two_overrides_and_removal_is_idempotent() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    bob.sync().unwrap();

    // lundi 2024-01-08 est à alice (parent1), jeudi 2024-01-11 à bob
    let request = alice
        .request_swap(RequestType::Swap, d(2024, 1, 8), Some(d(2024, 1, 11)), "mariage")
        .unwrap();
    assert_eq!(request.status, SwapStatus::Pending);
    assert_eq!(request.target_name, "Bob");

    bob.sync().unwrap();
    assert_eq!(bob.pending_swaps_for_me().len(), 1);
    let approved = bob
        .respond_to_swap(&request.id, SwapDecision::Approve, Some("ok".into()))
        .unwrap();
    assert_eq!(approved.status, SwapStatus::Approved);

    alice.sync().unwrap();
    let overrides: Vec<CalendarEvent> = alice
        .events()
        .iter()
        .filter(|e| e.swap_request_id.as_ref() == Some(&request.id))
        .cloned()
        .collect();
    assert_eq!(overrides.len(), 2);
    let on = |date: NaiveDate| overrides.iter().find(|e| e.first_day() == date).unwrap().parent_id;
    assert_eq!(on(d(2024, 1, 8)), EventParent::Parent2);
    assert_eq!(on(d(2024, 1, 11)), EventParent::Parent1);

    let monday = alice.who_has(d(2024, 1, 8));
    assert_eq!(monday.parent, Some(ParentRole::Parent2));
    assert!(matches!(monday.source, Source::Override(_)));
    assert_eq!(alice.who_has(d(2024, 1, 11)).parent, Some(ParentRole::Parent1));

    assert_eq!(
        bob.respond_to_swap(&request.id, SwapDecision::Reject, None)
            .unwrap_err()
            .code(),
        "swap-request-not-pending"
    );
    assert_eq!(alice.cancel_swap(&request.id).unwrap_err().code(), "swap-request-not-pending");

    assert_eq!(alice.remove_swap_overrides(&request.id).unwrap(), 2);
    assert_eq!(alice.remove_swap_overrides(&request.id).unwrap(), 0);
    assert_eq!(alice.who_has(d(2024, 1, 8)).parent, Some(ParentRole::Parent1));
}

#[test]
fn unsaved_swap_approval_removes_its_overrides() {
    let (store, alice, bob) = two_parent_family(Config::default());
    let request = alice
        .request_swap(RequestType::Swap, d(2024, 1, 8), Some(d(2024, 1, 11)), "")
        .unwrap();
    bob.sync().unwrap();

    // les overrides s'écrivent, puis l'enregistrement de la demande échoue
    store.set_fail_swap_writes(true);
    let err = bob
        .respond_to_swap(&request.id, SwapDecision::Approve, None)
        .unwrap_err();
    assert_eq!(err.code(), "storage-failure");

    assert!(bob.events().iter().all(|e| e.swap_request_id.is_none()));
    let mirrored = bob.swap_requests();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].status, SwapStatus::Pending);

    store.set_fail_swap_writes(false);
    bob.sync().unwrap();
    assert!(bob.events().iter().all(|e| e.swap_request_id.is_none()));
    assert_eq!(bob.swap_requests()[0].status, SwapStatus::Pending);
    assert_eq!(bob.who_has(d(2024, 1, 8)).parent, Some(ParentRole::Parent1));

    // la demande reste utilisable
    bob.respond_to_swap(&request.id, SwapDecision::Approve, None).unwrap();
    assert_eq!(bob.who_has(d(2024, 1, 8)).parent, Some(ParentRole::Parent2));
}

#[test]
fn swap_validation_errors() {
    let (_store, alice, _bob) = two_parent_family(Config::default());

    let not_mine = alice.request_swap(RequestType::OneWay, d(2024, 1, 11), None, "");
    assert_eq!(not_mine.unwrap_err().code(), "swap-invalid-original-day");

    let missing = alice.request_swap(RequestType::Swap, d(2024, 1, 8), None, "");
    assert_eq!(missing.unwrap_err().code(), "swap-missing-proposed-day");

    let same = alice.request_swap(RequestType::Swap, d(2024, 1, 8), Some(d(2024, 1, 9)), "");
    assert_eq!(same.unwrap_err().code(), "swap-proposed-same-parent");

    let before_start = alice.request_swap(RequestType::OneWay, d(2023, 12, 31), None, "");
    assert_eq!(before_start.unwrap_err().code(), "swap-invalid-original-day");

    let one_way = alice
        .request_swap(RequestType::OneWay, d(2024, 1, 8), Some(d(2024, 1, 9)), "")
        .unwrap();
    assert_eq!(one_way.proposed_date, None);
}

#[test]
fn swap_permissions_and_one_way_flow() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    let request = alice
        .request_swap(RequestType::OneWay, d(2024, 1, 9), None, "voyage")
        .unwrap();

    assert_eq!(
        alice
            .respond_to_swap(&request.id, SwapDecision::Approve, None)
            .unwrap_err()
            .code(),
        "only-target-can-respond"
    );

    bob.sync().unwrap();
    assert_eq!(bob.cancel_swap(&request.id).unwrap_err().code(), "only-requester-can-cancel");
    bob.respond_to_swap(&request.id, SwapDecision::Approve, None).unwrap();
    let overrides = bob
        .events()
        .iter()
        .filter(|e| e.swap_request_id.as_ref() == Some(&request.id))
        .count();
    assert_eq!(overrides, 1);
    assert_eq!(bob.who_has(d(2024, 1, 9)).parent, Some(ParentRole::Parent2));
}

#[test]
fn rejected_or_cancelled_swaps_leave_no_overrides() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    let first = alice
        .request_swap(RequestType::Swap, d(2024, 1, 8), Some(d(2024, 1, 12)), "")
        .unwrap();
    let second = alice
        .request_swap(RequestType::OneWay, d(2024, 1, 9), None, "")
        .unwrap();

    bob.sync().unwrap();
    let rejected = bob.respond_to_swap(&first.id, SwapDecision::Reject, None).unwrap();
    assert_eq!(rejected.status, SwapStatus::Rejected);

    alice.sync().unwrap();
    let cancelled = alice.cancel_swap(&second.id).unwrap();
    assert_eq!(cancelled.status, SwapStatus::Cancelled);
    assert!(alice.events().iter().all(|e| e.swap_request_id.is_none()));
    assert_eq!(alice.who_has(d(2024, 1, 8)).parent, Some(ParentRole::Parent1));

    let unknown = alice.cancel_swap(&garde::SwapRequestId::new("missing"));
    assert_eq!(unknown.unwrap_err().code(), "swap-request-not-found");
}

#[test]
fn failed_write_rolls_back_local_mirror() {
    let (store, alice, _bob) = two_parent_family(Config::default());
    let events = alice.subscribe_events();
    let initial = events.recv().unwrap();
    assert!(initial.is_empty());

    store.set_offline(true);
    let ev = CalendarEvent::all_day("Dentiste", d(2024, 1, 8), EventType::Medical, EventParent::Parent1);
    let err = alice.add_event(ev).unwrap_err();
    assert_eq!(err.code(), "storage-failure");

    // publication optimiste puis retour arrière
    assert_eq!(events.recv().unwrap().len(), 1);
    assert!(events.recv().unwrap().is_empty());
    assert!(alice.events().is_empty());

    let swap = alice.request_swap(RequestType::OneWay, d(2024, 1, 8), None, "");
    assert_eq!(swap.unwrap_err().code(), "storage-failure");
    assert!(alice.swap_requests().is_empty());

    store.set_offline(false);
    alice.sync().unwrap();
    assert!(alice.events().is_empty());
}

#[test]
fn first_schedule_is_applied_directly_and_validated() {
    let store = Arc::new(RecordingStore::default());
    let mut alice = session_for(&store, Config::default(), "alice", "Alice", None);
    alice.create_family("Famille").unwrap();
    assert_eq!(alice.submit_schedule(weekly_draft()).unwrap(), ScheduleOutcome::Applied);
    assert_eq!(alice.who_has(d(2024, 1, 7)).parent, Some(ParentRole::Parent1));

    let mut bad = weekly_draft();
    bad.end_date = Some(d(2023, 1, 1));
    assert_eq!(alice.submit_schedule(bad).unwrap_err().code(), "invalid-date-range");
}

#[test]
fn remove_unknown_event_fails() {
    let (_store, alice, _bob) = two_parent_family(Config::default());
    let err = alice.remove_event(&garde::EventId::new("nope")).unwrap_err();
    assert_eq!(err.code(), "event-not-found");

    let ev = CalendarEvent::all_day("Foot", d(2024, 1, 13), EventType::Activity, EventParent::Parent2);
    let id = alice.add_event(ev).unwrap();
    alice.remove_event(&id).unwrap();
    assert!(alice.events().is_empty());
}
