use crate::model::{CalendarEvent, ParentRole};
use chrono::NaiveDate;

/// Override applicable à `date`. Un override lié à un échange passe devant un
/// simple événement de garde ; à rang égal, le plus tôt commencé gagne.
pub(super) fn override_for(
    events: &[CalendarEvent],
    date: NaiveDate,
) -> Option<(&CalendarEvent, ParentRole)> {
    let mut best: Option<(&CalendarEvent, ParentRole)> = None;

    for event in events.iter().filter(|e| e.covers(date)) {
        // `both` ne remplace rien
        let Some(parent) = event.override_parent() else {
            continue;
        };
        best = match best {
            Some((current, _)) if !beats(event, current) => best,
            _ => Some((event, parent)),
        };
    }

    best
}

fn beats(candidate: &CalendarEvent, current: &CalendarEvent) -> bool {
    let rank = |e: &CalendarEvent| u8::from(e.swap_request_id.is_some());
    match rank(candidate).cmp(&rank(current)) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.start < current.start,
    }
}
