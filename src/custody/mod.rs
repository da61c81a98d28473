mod overrides;
mod resolve;
mod transition;
mod types;

pub use resolve::resolve_parent;
pub use transition::{next_transition, next_transition_within, TRANSITION_HORIZON_DAYS};
pub use types::{Resolution, Source, Transition};

use crate::model::{CalendarEvent, CustodySchedule, ParentRole};
use chrono::NaiveDate;

/// Vue en lecture seule : calendrier actif + événements, avec priorité aux overrides.
#[derive(Debug, Clone, Copy)]
pub struct CustodyCalendar<'a> {
    schedule: Option<&'a CustodySchedule>,
    events: &'a [CalendarEvent],
}

impl<'a> CustodyCalendar<'a> {
    pub fn new(schedule: Option<&'a CustodySchedule>, events: &'a [CalendarEvent]) -> Self {
        Self { schedule, events }
    }

    pub fn schedule(&self) -> Option<&'a CustodySchedule> {
        self.schedule
    }

    /// Parent du jour : un override concret l'emporte sur le calcul.
    pub fn resolve(&self, date: NaiveDate) -> Resolution {
        if let Some((event, parent)) = overrides::override_for(self.events, date) {
            return Resolution {
                date,
                parent: Some(parent),
                source: Source::Override(event.id.clone()),
            };
        }
        Resolution {
            date,
            parent: resolve_parent(self.schedule, date),
            source: Source::Schedule,
        }
    }

    pub fn parent_on(&self, date: NaiveDate) -> Option<ParentRole> {
        self.resolve(date).parent
    }

    pub fn next_transition(&self, date: NaiveDate, current: Option<ParentRole>) -> Option<Transition> {
        next_transition(date, current, |day| self.parent_on(day))
    }

    pub fn next_transition_within(
        &self,
        date: NaiveDate,
        current: Option<ParentRole>,
        horizon_days: u32,
    ) -> Option<Transition> {
        next_transition_within(date, current, horizon_days, |day| self.parent_on(day))
    }

    /// Résolutions jour par jour sur `[from, to]` (vide si `to < from`).
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> Vec<Resolution> {
        from.iter_days()
            .take_while(|day| *day <= to)
            .map(|day| self.resolve(day))
            .collect()
    }

    /// Événements (tous types) couvrant la journée, triés par début.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&'a CalendarEvent> {
        let mut out: Vec<&CalendarEvent> = self.events.iter().filter(|e| e.covers(date)).collect();
        out.sort_by_key(|e| e.start);
        out
    }
}
