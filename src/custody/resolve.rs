use crate::model::{CustodyPattern, CustodySchedule, ParentRole, WeekdaySet};
use chrono::{Datelike, NaiveDate};

/// Parent ayant la garde à `date` d'après le seul calendrier (sans overrides).
///
/// `None` si le calendrier est absent, inactif, ou si la date sort de
/// `[start_date, end_date]` (bornes incluses). Jours : 0 = dimanche .. 6 = samedi.
pub fn resolve_parent(schedule: Option<&CustodySchedule>, date: NaiveDate) -> Option<ParentRole> {
    let schedule = schedule.filter(|s| s.is_active)?;
    if date < schedule.start_date {
        return None;
    }
    if schedule.end_date.is_some_and(|end| date > end) {
        return None;
    }

    let elapsed_days = date.signed_duration_since(schedule.start_date).num_days();
    let week_index = elapsed_days / 7;
    let weekday = date.weekday().num_days_from_sunday() as u8;

    match schedule.pattern {
        CustodyPattern::Weekly | CustodyPattern::Custom => {
            pick(&schedule.parent1_days, &schedule.parent2_days, weekday)
        }
        CustodyPattern::Biweekly => {
            // semaine impaire sans alternative : on répète la semaine paire
            if week_index % 2 == 0 || !schedule.has_alt_days() {
                pick(&schedule.parent1_days, &schedule.parent2_days, weekday)
            } else {
                pick(
                    &schedule.biweekly_alt_parent1_days,
                    &schedule.biweekly_alt_parent2_days,
                    weekday,
                )
            }
        }
        CustodyPattern::WeekOnWeekOff => {
            if week_index % 2 == 0 {
                Some(ParentRole::Parent1)
            } else {
                Some(ParentRole::Parent2)
            }
        }
    }
}

fn pick(parent1: &WeekdaySet, parent2: &WeekdaySet, weekday: u8) -> Option<ParentRole> {
    if parent1.contains(&weekday) {
        Some(ParentRole::Parent1)
    } else if parent2.contains(&weekday) {
        Some(ParentRole::Parent2)
    } else {
        None
    }
}
