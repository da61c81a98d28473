use super::Transition;
use crate::model::ParentRole;
use chrono::{Days, NaiveDate};

/// Horizon de recherche d'un changement de garde, en jours.
pub const TRANSITION_HORIZON_DAYS: u32 = 60;

/// Premier jour après `date` dont le parent résolu est défini et différent de
/// `current`. Recherche bornée à [`TRANSITION_HORIZON_DAYS`].
pub fn next_transition<F>(date: NaiveDate, current: Option<ParentRole>, lookup: F) -> Option<Transition>
where
    F: Fn(NaiveDate) -> Option<ParentRole>,
{
    next_transition_within(date, current, TRANSITION_HORIZON_DAYS, lookup)
}

pub fn next_transition_within<F>(
    date: NaiveDate,
    current: Option<ParentRole>,
    horizon_days: u32,
    lookup: F,
) -> Option<Transition>
where
    F: Fn(NaiveDate) -> Option<ParentRole>,
{
    (1..=u64::from(horizon_days))
        .map_while(|offset| date.checked_add_days(Days::new(offset)))
        .find_map(|day| match lookup(day) {
            Some(parent) if Some(parent) != current => Some(Transition {
                date: day,
                to_parent: parent,
            }),
            _ => None,
        })
}
