#![forbid(unsafe_code)]
mod common;

use common::{d, two_parent_family, weekly_draft};
use garde::{
    daily_overview, prepare_handoff_reminder, CalendarEvent, Config, CustodyCalendar,
    CustodySchedule, EventParent, EventType, ParentNames, ParentRole, RequestType, Source,
    TextReminder, TRANSITION_HORIZON_DAYS,
};

#[test]
fn handoff_reminder_text() {
    let schedule = CustodySchedule::from_draft(weekly_draft()).unwrap();
    let cal = CustodyCalendar::new(Some(&schedule), &[]);
    let reminder = prepare_handoff_reminder(
        &cal,
        None,
        &ParentNames::default(),
        d(2024, 1, 7),
        1,
        TRANSITION_HORIZON_DAYS,
        &TextReminder,
    )
    .unwrap();

    assert_eq!(reminder.to_parent, ParentRole::Parent2);
    assert_eq!(reminder.handoff_date, d(2024, 1, 11));
    assert_eq!(reminder.notice_on, d(2024, 1, 10));
    insta::assert_snapshot!(reminder.content, @r###"
Bonjour Parent 2,

La garde passe de Parent 1 à Parent 2 le 2024-01-11 (jeudi).
Rappel prévu le 2024-01-10.

Pensez à préparer les affaires des enfants.
"###);
}

#[test]
fn notice_never_precedes_today() {
    let schedule = CustodySchedule::from_draft(weekly_draft()).unwrap();
    let cal = CustodyCalendar::new(Some(&schedule), &[]);
    let reminder = prepare_handoff_reminder(
        &cal,
        None,
        &ParentNames::default(),
        d(2024, 1, 10),
        5,
        TRANSITION_HORIZON_DAYS,
        &TextReminder,
    )
    .unwrap();
    assert_eq!(reminder.handoff_date, d(2024, 1, 11));
    assert_eq!(reminder.notice_on, d(2024, 1, 10));
}

#[test]
fn no_reminder_without_handoff() {
    let cal = CustodyCalendar::new(None, &[]);
    let res = prepare_handoff_reminder(
        &cal,
        None,
        &ParentNames::default(),
        d(2024, 1, 7),
        1,
        TRANSITION_HORIZON_DAYS,
        &TextReminder,
    );
    assert!(res.is_err());
}

#[test]
fn reminder_search_honours_the_given_horizon() {
    let schedule = CustodySchedule::from_draft(weekly_draft()).unwrap();
    let cal = CustodyCalendar::new(Some(&schedule), &[]);
    let names = ParentNames::default();

    // passation le 2024-01-11, quatre jours après le 2024-01-07
    let short = prepare_handoff_reminder(&cal, None, &names, d(2024, 1, 7), 1, 3, &TextReminder);
    let err = short.unwrap_err().to_string();
    assert_eq!(err, "no custody handoff within 3 days of 2024-01-07");

    let exact = prepare_handoff_reminder(&cal, None, &names, d(2024, 1, 7), 1, 4, &TextReminder)
        .unwrap();
    assert_eq!(exact.handoff_date, d(2024, 1, 11));
}

#[test]
fn daily_overview_collects_the_day() {
    let (_store, alice, bob) = two_parent_family(Config::default());
    let foot = CalendarEvent::all_day("Foot", d(2024, 1, 8), EventType::Activity, EventParent::Both);
    alice.add_event(foot).unwrap();
    alice
        .request_swap(RequestType::OneWay, d(2024, 1, 9), None, "")
        .unwrap();
    bob.sync().unwrap();

    let overview = daily_overview(&bob, d(2024, 1, 8));
    assert_eq!(overview.parent, Some(ParentRole::Parent1));
    assert_eq!(overview.parent_name.as_deref(), Some("Alice"));
    assert_eq!(overview.source, Source::Schedule);
    assert_eq!(overview.events.len(), 1);
    assert_eq!(overview.pending_swaps, 1);
    assert!(!overview.pending_schedule_change);
    let next = overview.next_transition.unwrap();
    assert_eq!(next.date, d(2024, 1, 11));
    assert_eq!(next.to_parent, ParentRole::Parent2);
}
