#![forbid(unsafe_code)]
//! Garde : bibliothèque de coordination de garde alternée (sans BD).
//!
//! - Résolution du parent de garde pour une date (motifs hebdo, bihebdo, semaine sur deux).
//! - Overrides par événements de garde et échanges de jours approuvés.
//! - Changements de calendrier soumis à l'approbation de l'autre parent.
//! - Stockage fichiers (JSON/CSV) ou mémoire ; miroirs locaux à remplacement complet.

pub mod config;
pub mod custody;
pub mod error;
pub mod io;
pub mod model;
pub mod notification;
pub mod overview;
pub mod preset;
pub mod service;
pub mod state;
pub mod storage;
pub mod swap;

pub use config::{Backend, Config, ParentNames};
pub use custody::{
    next_transition, resolve_parent, CustodyCalendar, Resolution, Source, Transition,
    TRANSITION_HORIZON_DAYS,
};
pub use error::CustodyError;
pub use model::{
    CalendarEvent, CustodyPattern, CustodySchedule, EventId, EventParent, EventType, Family,
    FamilyId, Member, ParentRole, PendingApproval, RequestType, ScheduleDraft, SwapRequest,
    SwapRequestId, SwapStatus, UserId,
};
pub use notification::{prepare_handoff_reminder, Reminder, ReminderRenderer, TextReminder};
pub use overview::{daily_overview, DailyOverview};
pub use service::{FamilyService, ScheduleOutcome, Session};
pub use state::{apply_optimistic, LiveState};
pub use storage::{FamilyDocument, FamilyStore, JsonStore, MemoryStore};
pub use swap::{validate_swap, SwapDecision};
