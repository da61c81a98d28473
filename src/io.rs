use crate::custody::CustodyCalendar;
use crate::model::{CalendarEvent, EventParent, EventType, ParentRole};
use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

/// Import d'événements depuis CSV: header `title,start,end,type,parent[,all_day]`.
///
/// `start`/`end` en RFC3339 UTC ou `YYYY-MM-DD` (une date de fin est incluse).
pub fn import_events_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<CalendarEvent>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let title = rec.get(0).context("missing title")?.trim();
        if title.is_empty() {
            bail!("invalid event row (empty title)");
        }
        let (start, start_was_date) = parse_point(rec.get(1).context("missing start")?.trim())?;
        let (mut end, end_was_date) = parse_point(rec.get(2).context("missing end")?.trim())?;
        if end_was_date {
            end += Duration::days(1);
        }
        let event_type: EventType = rec
            .get(3)
            .context("missing type")?
            .parse()
            .map_err(anyhow::Error::msg)?;
        let parent: EventParent = rec
            .get(4)
            .context("missing parent")?
            .parse()
            .map_err(anyhow::Error::msg)?;

        let mut event = CalendarEvent::new(title, start, end, event_type, parent)
            .with_context(|| format!("invalid range for event {title}"))?;
        event.is_all_day = start_was_date && end_was_date;
        if let Some(flag) = rec.get(5) {
            let flag = flag.trim();
            if !flag.is_empty() {
                event.is_all_day = parse_bool(flag)
                    .with_context(|| format!("invalid all_day value for event {title}"))?;
            }
        }
        out.push(event);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_point(raw: &str) -> anyhow::Result<(DateTime<Utc>, bool)> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok((dt, false));
    }
    let date = parse_date(raw)?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight conversion")?;
    Ok((Utc.from_utc_datetime(&datetime), true))
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date: {raw}"))
}

/// Export CSV du calendrier résolu sur `[from, to]`:
/// header `date,weekday,parent,parent_name,source`.
pub fn export_custody_csv<P, F>(
    path: P,
    calendar: &CustodyCalendar<'_>,
    from: NaiveDate,
    to: NaiveDate,
    name_of: F,
) -> anyhow::Result<usize>
where
    P: AsRef<Path>,
    F: Fn(ParentRole) -> String,
{
    if to < from {
        bail!("end date must be after start date");
    }
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "weekday", "parent", "parent_name", "source"])?;
    let days = calendar.range(from, to);
    for day in &days {
        let date = day.date.to_string();
        let weekday = day.date.weekday().num_days_from_sunday().to_string();
        let (parent, name) = match day.parent {
            Some(role) => (role.as_str(), name_of(role)),
            None => ("", String::new()),
        };
        w.write_record([
            date.as_str(),
            weekday.as_str(),
            parent,
            name.as_str(),
            day.source.label(),
        ])?;
    }
    w.flush()?;
    Ok(days.len())
}
