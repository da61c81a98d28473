use crate::custody::{Source, Transition};
use crate::model::{CalendarEvent, ParentRole, SwapStatus};
use crate::service::FamilyService;
use chrono::NaiveDate;

/// Résumé d'une journée pour l'écran d'accueil.
#[derive(Debug, Clone)]
pub struct DailyOverview {
    pub date: NaiveDate,
    pub parent: Option<ParentRole>,
    pub parent_name: Option<String>,
    pub source: Source,
    pub events: Vec<CalendarEvent>,
    pub next_transition: Option<Transition>,
    pub pending_swaps: usize,
    pub pending_schedule_change: bool,
}

pub fn daily_overview(service: &FamilyService, date: NaiveDate) -> DailyOverview {
    let resolution = service.who_has(date);
    let events = service.with_calendar(|cal| cal.events_on(date).into_iter().cloned().collect());
    let pending_swaps = service
        .swap_requests()
        .iter()
        .filter(|r| r.status == SwapStatus::Pending)
        .count();
    let pending_schedule_change = service
        .schedule()
        .as_ref()
        .as_ref()
        .is_some_and(|s| s.pending_approval.is_some());

    DailyOverview {
        date,
        parent: resolution.parent,
        parent_name: resolution.parent.map(|role| service.display_name(role)),
        source: resolution.source,
        events,
        next_transition: service.next_transition(date),
        pending_swaps,
        pending_schedule_change,
    }
}
