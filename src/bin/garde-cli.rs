#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use garde::{
    daily_overview, io,
    model::{CalendarEvent, CustodyPattern, EventParent, EventType, ParentRole, RequestType},
    notification::{prepare_handoff_reminder, TextReminder},
    preset, Backend, Config, EventId, FamilyId, FamilyService, ScheduleDraft, ScheduleOutcome,
    Session, SwapDecision, SwapRequestId, UserId,
};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de garde alternée (fichiers JSON, sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier de configuration JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Répertoire de données (remplace la configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Identifiant du parent connecté
    #[arg(long, global = true, default_value = "")]
    user: String,

    /// Nom affiché du parent connecté
    #[arg(long, global = true, default_value = "")]
    name: String,

    /// Famille courante
    #[arg(long, global = true)]
    family: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer une famille (affiche son identifiant)
    FamilyCreate {
        #[arg(long)]
        family_name: String,
    },

    /// Rejoindre la famille donnée par --family
    FamilyJoin,

    /// Lister les modèles de calendrier intégrés
    Presets,

    /// Proposer (ou appliquer) un calendrier de garde
    ScheduleSet {
        /// Modèle intégré (voir `presets`)
        #[arg(long, conflicts_with_all = ["file", "pattern"])]
        preset: Option<String>,
        /// Brouillon JSON
        #[arg(long, conflicts_with = "pattern")]
        file: Option<PathBuf>,
        #[arg(long)]
        pattern: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// YYYY-MM-DD (incluse)
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value = "Calendrier de garde")]
        schedule_name: String,
        /// liste "0,1,2" (0 = dimanche)
        #[arg(long, default_value = "")]
        parent1_days: String,
        #[arg(long, default_value = "")]
        parent2_days: String,
        #[arg(long, default_value = "")]
        alt_parent1_days: String,
        #[arg(long, default_value = "")]
        alt_parent2_days: String,
    },

    /// Afficher le calendrier actif (JSON)
    ScheduleShow,

    /// Approuver le changement de calendrier en attente
    ScheduleApprove,

    /// Refuser le changement de calendrier en attente
    ScheduleReject,

    /// Annuler sa propre demande de changement
    ScheduleCancel,

    /// Quel parent a la garde à une date
    Who {
        #[arg(long)]
        date: Option<String>,
    },

    /// Prochain changement de garde
    Next {
        #[arg(long)]
        date: Option<String>,
    },

    /// Ajouter un événement
    EventAdd {
        #[arg(long)]
        title: String,
        /// RFC3339 UTC
        #[arg(long)]
        start: String,
        /// RFC3339 UTC
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "other")]
        kind: String,
        #[arg(long, default_value = "both")]
        parent: String,
    },

    /// Importer des événements depuis un CSV
    EventImport {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Supprimer un événement
    EventRemove {
        #[arg(long)]
        id: String,
    },

    /// Lister les événements
    Events,

    /// Demander un échange (swap) ou un don de jour (one-way)
    SwapRequest {
        #[arg(long, default_value = "swap")]
        kind: String,
        #[arg(long)]
        original: String,
        #[arg(long)]
        proposed: Option<String>,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Répondre à une demande d'échange
    SwapRespond {
        #[arg(long)]
        id: String,
        #[arg(long, conflicts_with = "reject")]
        approve: bool,
        #[arg(long)]
        reject: bool,
        #[arg(long)]
        note: Option<String>,
    },

    /// Annuler sa demande d'échange
    SwapCancel {
        #[arg(long)]
        id: String,
    },

    /// Lister les demandes d'échange
    Swaps,

    /// Résumé de la journée
    Overview {
        #[arg(long)]
        date: Option<String>,
    },

    /// Exporter le calendrier résolu en CSV
    Export {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        out: PathBuf,
    },

    /// Générer un rappel de passation
    Notify {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 1)]
        days_before: u32,
        /// Fichier de sortie (texte brut)
        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_days(raw: &str) -> Result<Vec<u8>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().with_context(|| format!("invalid weekday: {s}")))
        .collect()
}

fn date_or_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => io::parse_date(raw),
        None => Ok(Utc::now().date_naive()),
    }
}

fn role_label(service: &FamilyService, role: Option<ParentRole>) -> String {
    match role {
        Some(role) => format!("{} ({})", role, service.display_name(role)),
        None => "-".to_string(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    // chaque invocation repartirait d'un stockage vide
    if config.backend == Backend::Memory {
        bail!("the memory backend keeps nothing between runs; use the json backend with the CLI");
    }

    if let Commands::Presets = cli.cmd {
        for p in preset::PRESETS {
            println!("{} | {} | {}", p.id, p.name, p.description);
        }
        return Ok(());
    }

    if cli.user.trim().is_empty() {
        bail!("--user is required");
    }
    let mut session = Session::new(UserId::new(cli.user.trim()), cli.name.trim());
    if let Some(family) = &cli.family {
        session = session.with_family(FamilyId::new(family));
    }

    let store = config.open_store()?;
    let mut service = FamilyService::new(store, config, session);

    match &cli.cmd {
        Commands::FamilyCreate { family_name } => {
            let id = service.create_family(family_name)?;
            println!("{id}");
            return Ok(());
        }
        Commands::FamilyJoin => {
            let id = service.family_id()?.clone();
            service.join_family(&id)?;
            println!("joined {id} as {}", service.role()?);
            return Ok(());
        }
        _ => service.sync()?,
    }

    match cli.cmd {
        Commands::FamilyCreate { .. } | Commands::FamilyJoin | Commands::Presets => {}
        Commands::ScheduleSet {
            preset,
            file,
            pattern,
            start,
            end,
            schedule_name,
            parent1_days,
            parent2_days,
            alt_parent1_days,
            alt_parent2_days,
        } => {
            let mut draft = if let Some(id) = preset {
                let start = start.context("--start is required with --preset")?;
                preset::preset_draft(&id, io::parse_date(&start)?)?
            } else if let Some(path) = file {
                preset::load_draft_from_file(path)?
            } else {
                let pattern: CustodyPattern = pattern
                    .context("--pattern, --preset or --file is required")?
                    .parse()
                    .map_err(anyhow::Error::msg)?;
                let start = start.context("--start is required")?;
                let mut draft = ScheduleDraft::new(schedule_name, pattern, io::parse_date(&start)?);
                for day in parse_days(&parent1_days)? {
                    draft.assign_day(ParentRole::Parent1, day)?;
                }
                for day in parse_days(&parent2_days)? {
                    draft.assign_day(ParentRole::Parent2, day)?;
                }
                for day in parse_days(&alt_parent1_days)? {
                    draft.assign_alt_day(ParentRole::Parent1, day)?;
                }
                for day in parse_days(&alt_parent2_days)? {
                    draft.assign_alt_day(ParentRole::Parent2, day)?;
                }
                draft
            };
            if let Some(end) = end {
                draft.end_date = Some(io::parse_date(&end)?);
            }
            match service.submit_schedule(draft)? {
                ScheduleOutcome::Applied => println!("schedule applied"),
                ScheduleOutcome::PendingApproval => println!("schedule awaiting approval"),
            }
        }
        Commands::ScheduleShow => {
            let schedule = service.schedule();
            match schedule.as_ref() {
                Some(schedule) => println!("{}", serde_json::to_string_pretty(schedule)?),
                None => println!("no schedule"),
            }
        }
        Commands::ScheduleApprove => {
            service.approve_schedule_change()?;
            println!("schedule change approved");
        }
        Commands::ScheduleReject => {
            service.reject_schedule_change()?;
            println!("schedule change rejected");
        }
        Commands::ScheduleCancel => {
            service.cancel_schedule_change()?;
            println!("schedule change cancelled");
        }
        Commands::Who { date } => {
            let date = date_or_today(date.as_deref())?;
            let resolution = service.who_has(date);
            println!(
                "{} | {} | {}",
                date,
                role_label(&service, resolution.parent),
                resolution.source.label()
            );
        }
        Commands::Next { date } => {
            let date = date_or_today(date.as_deref())?;
            match service.next_transition(date) {
                Some(t) => println!("{} → {}", t.date, role_label(&service, Some(t.to_parent))),
                None => println!(
                    "no change within {} days",
                    service.config().transition_horizon_days
                ),
            }
        }
        Commands::EventAdd {
            title,
            start,
            end,
            kind,
            parent,
        } => {
            let event_type: EventType = kind.parse().map_err(anyhow::Error::msg)?;
            let parent: EventParent = parent.parse().map_err(anyhow::Error::msg)?;
            let event = CalendarEvent::new(title, start.parse()?, end.parse()?, event_type, parent)?;
            let id = service.add_event(event)?;
            println!("{id}");
        }
        Commands::EventImport { csv } => {
            let events = io::import_events_csv(csv)?;
            let count = events.len();
            for event in events {
                service.add_event(event)?;
            }
            println!("imported {count} event(s)");
        }
        Commands::EventRemove { id } => {
            service.remove_event(&EventId::new(id))?;
            println!("event removed");
        }
        Commands::Events => {
            let mut events: Vec<CalendarEvent> = service.events().as_ref().clone();
            events.sort_by_key(|e| e.start);
            for e in &events {
                println!(
                    "{} | {} → {} | {:?} | {:?} | {}",
                    e.id,
                    e.start.to_rfc3339(),
                    e.end.to_rfc3339(),
                    e.event_type,
                    e.parent_id,
                    e.title
                );
            }
        }
        Commands::SwapRequest {
            kind,
            original,
            proposed,
            reason,
        } => {
            let request_type: RequestType = kind.parse().map_err(anyhow::Error::msg)?;
            let original = io::parse_date(&original)?;
            let proposed = proposed.as_deref().map(io::parse_date).transpose()?;
            let request = service.request_swap(request_type, original, proposed, &reason)?;
            println!("{}", request.id);
        }
        Commands::SwapRespond {
            id,
            approve,
            reject,
            note,
        } => {
            let decision = match (approve, reject) {
                (true, false) => SwapDecision::Approve,
                (false, true) => SwapDecision::Reject,
                _ => bail!("use exactly one of --approve or --reject"),
            };
            let request = service.respond_to_swap(&SwapRequestId::new(id), decision, note)?;
            println!("{} {:?}", request.id, request.status);
        }
        Commands::SwapCancel { id } => {
            let request = service.cancel_swap(&SwapRequestId::new(id))?;
            println!("{} {:?}", request.id, request.status);
        }
        Commands::Swaps => {
            for r in service.swap_requests().iter() {
                println!(
                    "{} | {:?} | {:?} | {} → {} | {} | {}",
                    r.id,
                    r.request_type,
                    r.status,
                    r.requester_name,
                    r.target_name,
                    r.original_date,
                    r.proposed_date.map(|d| d.to_string()).unwrap_or_default()
                );
            }
        }
        Commands::Overview { date } => {
            let date = date_or_today(date.as_deref())?;
            let overview = daily_overview(&service, date);
            println!("{} | {}", overview.date, role_label(&service, overview.parent));
            for e in &overview.events {
                println!("  {} | {:?}", e.title, e.event_type);
            }
            if let Some(t) = overview.next_transition {
                println!("next: {} → {}", t.date, role_label(&service, Some(t.to_parent)));
            }
            println!("pending swaps: {}", overview.pending_swaps);
            if overview.pending_schedule_change {
                println!("schedule change awaiting approval");
            }
        }
        Commands::Export { from, to, out } => {
            let from = io::parse_date(&from)?;
            let to = io::parse_date(&to)?;
            let rows = service.with_calendar(|cal| {
                io::export_custody_csv(&out, cal, from, to, |role| service.display_name(role))
            })?;
            println!("exported {rows} day(s)");
        }
        Commands::Notify {
            date,
            days_before,
            out,
        } => {
            let today = date_or_today(date.as_deref())?;
            let family = service.family()?;
            let reminder = service.with_calendar(|cal| {
                prepare_handoff_reminder(
                    cal,
                    Some(&family),
                    &service.config().parent_names,
                    today,
                    days_before,
                    service.config().transition_horizon_days,
                    &TextReminder,
                )
            })?;
            std::fs::write(&out, &reminder.content)?;
            println!(
                "Reminder generated for {} (handoff {}) on {}",
                reminder.to_name, reminder.handoff_date, reminder.notice_on
            );
        }
    }

    Ok(())
}
