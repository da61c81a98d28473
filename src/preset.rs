use crate::model::{CustodyPattern, ParentRole, ScheduleDraft};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use std::fs;
use std::path::Path;

/// Modèle de calendrier prêt à l'emploi.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "weekdays-weekends",
        name: "Semaine / week-end",
        description: "parent1 du lundi au jeudi, parent2 du vendredi au dimanche",
    },
    Preset {
        id: "week-on-week-off",
        name: "Une semaine sur deux",
        description: "semaines entières alternées à partir de la date de début",
    },
    Preset {
        id: "alternate-weekends",
        name: "Un week-end sur deux",
        description: "parent1 en semaine, week-ends alternés avec parent2",
    },
    Preset {
        id: "2-2-5-5",
        name: "2-2-5-5",
        description: "lundi-mardi parent1, mercredi-jeudi parent2, week-ends longs alternés",
    },
];

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Construit le brouillon d'un modèle intégré.
///
/// Les modèles bihebdomadaires découpent la semaine en blocs du lundi au
/// dimanche : leur date de début est ramenée au lundi qui la précède.
pub fn preset_draft(id: &str, start_date: NaiveDate) -> Result<ScheduleDraft> {
    let preset = find_preset(id).with_context(|| format!("unknown preset: {id}"))?;
    let (pattern, p1, p2, alt1, alt2): (CustodyPattern, &[u8], &[u8], &[u8], &[u8]) = match preset.id {
        "weekdays-weekends" => (CustodyPattern::Weekly, &[1, 2, 3, 4], &[5, 6, 0], &[], &[]),
        "week-on-week-off" => (CustodyPattern::WeekOnWeekOff, &[], &[], &[], &[]),
        "alternate-weekends" => (
            CustodyPattern::Biweekly,
            &[1, 2, 3, 4, 5],
            &[6, 0],
            &[0, 1, 2, 3, 4, 5, 6],
            &[],
        ),
        "2-2-5-5" => (
            CustodyPattern::Biweekly,
            &[1, 2, 5, 6, 0],
            &[3, 4],
            &[1, 2],
            &[3, 4, 5, 6, 0],
        ),
        other => bail!("preset without definition: {other}"),
    };

    let start_date = match pattern {
        CustodyPattern::Biweekly => week_start(start_date)?,
        _ => start_date,
    };
    let mut draft = ScheduleDraft::new(preset.name, pattern, start_date);
    for day in p1 {
        draft.assign_day(ParentRole::Parent1, *day)?;
    }
    for day in p2 {
        draft.assign_day(ParentRole::Parent2, *day)?;
    }
    for day in alt1 {
        draft.assign_alt_day(ParentRole::Parent1, *day)?;
    }
    for day in alt2 {
        draft.assign_alt_day(ParentRole::Parent2, *day)?;
    }
    draft.validate()?;
    Ok(draft)
}

fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back))
        .with_context(|| format!("no monday before {date}"))
}

pub fn load_draft_from_file<P: AsRef<Path>>(path: P) -> Result<ScheduleDraft> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let draft: ScheduleDraft =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    draft.validate()?;
    Ok(draft)
}

pub fn export_draft_json<P: AsRef<Path>>(path: P, draft: &ScheduleDraft) -> Result<()> {
    let json = serde_json::to_string_pretty(draft)?;
    fs::write(path, json)?;
    Ok(())
}
