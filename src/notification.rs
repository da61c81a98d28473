use crate::config::ParentNames;
use crate::custody::{CustodyCalendar, Transition};
use crate::model::{Family, ParentRole};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Days, NaiveDate};

const JOURS: [&str; 7] = [
    "dimanche", "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi",
];

/// Rappel de passation de garde.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub to_parent: ParentRole,
    pub to_name: String,
    pub handoff_date: NaiveDate,
    pub notice_on: NaiveDate,
    pub content: String,
}

/// Permet de customiser le rendu du message (texte, SMS, push...).
pub trait ReminderRenderer {
    fn render(&self, from_name: &str, to_name: &str, transition: &Transition, notice_on: NaiveDate)
        -> String;
}

/// Gabarit texte simple.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReminder;

impl ReminderRenderer for TextReminder {
    fn render(
        &self,
        from_name: &str,
        to_name: &str,
        transition: &Transition,
        notice_on: NaiveDate,
    ) -> String {
        format!(
            "Bonjour {to},\n\nLa garde passe de {from} à {to} le {date} ({weekday}).\nRappel prévu le {notice}.\n\nPensez à préparer les affaires des enfants.\n",
            to = to_name,
            from = from_name,
            date = transition.date,
            weekday = JOURS[transition.date.weekday().num_days_from_sunday() as usize],
            notice = notice_on,
        )
    }
}

/// Prépare le rappel de la prochaine passation après `today`, cherchée sur
/// `horizon_days` jours.
pub fn prepare_handoff_reminder(
    calendar: &CustodyCalendar<'_>,
    family: Option<&Family>,
    names: &ParentNames,
    today: NaiveDate,
    days_before: u32,
    horizon_days: u32,
    renderer: &dyn ReminderRenderer,
) -> Result<Reminder> {
    let current = calendar.parent_on(today);
    let Some(transition) = calendar.next_transition_within(today, current, horizon_days) else {
        bail!("no custody handoff within {horizon_days} days of {today}");
    };

    let notice_on = transition
        .date
        .checked_sub_days(Days::new(u64::from(days_before)))
        .context("notice date out of range")?
        .max(today);

    let from_name = match current {
        Some(role) => names.display_name(family, role),
        None => "aucun parent".to_string(),
    };
    let to_name = names.display_name(family, transition.to_parent);
    let content = renderer.render(&from_name, &to_name, &transition, notice_on);

    Ok(Reminder {
        to_parent: transition.to_parent,
        to_name,
        handoff_date: transition.date,
        notice_on,
        content,
    })
}
