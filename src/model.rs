use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CustodyError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort d'une famille (agrégat propriétaire du calendrier)
    FamilyId
);
string_id!(
    /// Identifiant d'un compte parent
    UserId
);
string_id!(ScheduleId);
string_id!(EventId);
string_id!(SwapRequestId);

/// Rôle stable d'un parent dans la famille (pas un niveau de permission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRole {
    Parent1,
    Parent2,
}

impl ParentRole {
    pub fn other(self) -> Self {
        match self {
            ParentRole::Parent1 => ParentRole::Parent2,
            ParentRole::Parent2 => ParentRole::Parent1,
        }
    }
    pub fn as_str(self) -> &'static str {
        match self {
            ParentRole::Parent1 => "parent1",
            ParentRole::Parent2 => "parent2",
        }
    }
}

impl fmt::Display for ParentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent1" | "1" => Ok(ParentRole::Parent1),
            "parent2" | "2" => Ok(ParentRole::Parent2),
            other => Err(format!("unknown parent role: {other}")),
        }
    }
}

/// Motif récurrent de garde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyPattern {
    Weekly,
    Biweekly,
    WeekOnWeekOff,
    Custom,
}

impl FromStr for CustodyPattern {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weekly" => Ok(CustodyPattern::Weekly),
            "biweekly" => Ok(CustodyPattern::Biweekly),
            "week_on_week_off" => Ok(CustodyPattern::WeekOnWeekOff),
            "custom" => Ok(CustodyPattern::Custom),
            other => Err(format!("unknown custody pattern: {other}")),
        }
    }
}

/// Ensemble de jours de semaine (0 = dimanche .. 6 = samedi).
pub type WeekdaySet = BTreeSet<u8>;

/// Tous les champs qu'un parent peut proposer pour un calendrier de garde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    pub name: String,
    pub pattern: CustodyPattern,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub parent1_days: WeekdaySet,
    #[serde(default)]
    pub parent2_days: WeekdaySet,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub biweekly_alt_parent1_days: WeekdaySet,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub biweekly_alt_parent2_days: WeekdaySet,
}

impl ScheduleDraft {
    pub fn new<N: Into<String>>(name: N, pattern: CustodyPattern, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            pattern,
            start_date,
            end_date: None,
            parent1_days: WeekdaySet::new(),
            parent2_days: WeekdaySet::new(),
            biweekly_alt_parent1_days: WeekdaySet::new(),
            biweekly_alt_parent2_days: WeekdaySet::new(),
        }
    }

    /// Ajoute un jour à un parent en le retirant de l'autre.
    pub fn assign_day(&mut self, role: ParentRole, day: u8) -> Result<(), CustodyError> {
        check_weekday(day)?;
        let (mine, theirs) = match role {
            ParentRole::Parent1 => (&mut self.parent1_days, &mut self.parent2_days),
            ParentRole::Parent2 => (&mut self.parent2_days, &mut self.parent1_days),
        };
        theirs.remove(&day);
        mine.insert(day);
        Ok(())
    }

    /// Même chose pour les semaines impaires d'un motif `biweekly`.
    pub fn assign_alt_day(&mut self, role: ParentRole, day: u8) -> Result<(), CustodyError> {
        check_weekday(day)?;
        let (mine, theirs) = match role {
            ParentRole::Parent1 => (
                &mut self.biweekly_alt_parent1_days,
                &mut self.biweekly_alt_parent2_days,
            ),
            ParentRole::Parent2 => (
                &mut self.biweekly_alt_parent2_days,
                &mut self.biweekly_alt_parent1_days,
            ),
        };
        theirs.remove(&day);
        mine.insert(day);
        Ok(())
    }

    pub fn has_alt_days(&self) -> bool {
        !self.biweekly_alt_parent1_days.is_empty() || !self.biweekly_alt_parent2_days.is_empty()
    }

    pub fn validate(&self) -> Result<(), CustodyError> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(CustodyError::InvalidDateRange);
            }
        }
        for set in [
            &self.parent1_days,
            &self.parent2_days,
            &self.biweekly_alt_parent1_days,
            &self.biweekly_alt_parent2_days,
        ] {
            for day in set {
                check_weekday(*day)?;
            }
        }
        if let Some(day) = self.parent1_days.intersection(&self.parent2_days).next() {
            return Err(CustodyError::ScheduleDaysOverlap(*day));
        }
        if let Some(day) = self
            .biweekly_alt_parent1_days
            .intersection(&self.biweekly_alt_parent2_days)
            .next()
        {
            return Err(CustodyError::ScheduleDaysOverlap(*day));
        }
        Ok(())
    }
}

fn check_weekday(day: u8) -> Result<(), CustodyError> {
    if day > 6 {
        return Err(CustodyError::InvalidWeekday(day));
    }
    Ok(())
}

/// Changement de calendrier en attente de confirmation par l'autre parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    #[serde(flatten)]
    pub draft: ScheduleDraft,
    pub requested_by: UserId,
    pub requested_by_name: String,
    pub requested_at: DateTime<Utc>,
}

/// Calendrier de garde actif de la famille (`settings/custodySchedule`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodySchedule {
    pub id: ScheduleId,
    pub name: String,
    pub pattern: CustodyPattern,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub parent1_days: WeekdaySet,
    #[serde(default)]
    pub parent2_days: WeekdaySet,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub biweekly_alt_parent1_days: WeekdaySet,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub biweekly_alt_parent2_days: WeekdaySet,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_approval: Option<PendingApproval>,
}

fn default_active() -> bool {
    true
}

impl CustodySchedule {
    /// Crée un calendrier actif après validation du brouillon.
    pub fn from_draft(draft: ScheduleDraft) -> Result<Self, CustodyError> {
        draft.validate()?;
        Ok(Self {
            id: ScheduleId::random(),
            name: draft.name,
            pattern: draft.pattern,
            start_date: draft.start_date,
            end_date: draft.end_date,
            parent1_days: draft.parent1_days,
            parent2_days: draft.parent2_days,
            biweekly_alt_parent1_days: draft.biweekly_alt_parent1_days,
            biweekly_alt_parent2_days: draft.biweekly_alt_parent2_days,
            is_active: true,
            pending_approval: None,
        })
    }

    /// Remplace les champs actifs (l'id et l'état d'approbation sont conservés).
    pub fn apply_draft(&mut self, draft: ScheduleDraft) -> Result<(), CustodyError> {
        draft.validate()?;
        self.name = draft.name;
        self.pattern = draft.pattern;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.parent1_days = draft.parent1_days;
        self.parent2_days = draft.parent2_days;
        self.biweekly_alt_parent1_days = draft.biweekly_alt_parent1_days;
        self.biweekly_alt_parent2_days = draft.biweekly_alt_parent2_days;
        Ok(())
    }

    pub fn draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            name: self.name.clone(),
            pattern: self.pattern,
            start_date: self.start_date,
            end_date: self.end_date,
            parent1_days: self.parent1_days.clone(),
            parent2_days: self.parent2_days.clone(),
            biweekly_alt_parent1_days: self.biweekly_alt_parent1_days.clone(),
            biweekly_alt_parent2_days: self.biweekly_alt_parent2_days.clone(),
        }
    }

    pub fn has_alt_days(&self) -> bool {
        !self.biweekly_alt_parent1_days.is_empty() || !self.biweekly_alt_parent2_days.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Custody,
    Pickup,
    Dropoff,
    School,
    Activity,
    Medical,
    Holiday,
    Vacation,
    Other,
}

impl FromStr for EventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "custody" => Ok(EventType::Custody),
            "pickup" => Ok(EventType::Pickup),
            "dropoff" => Ok(EventType::Dropoff),
            "school" => Ok(EventType::School),
            "activity" => Ok(EventType::Activity),
            "medical" => Ok(EventType::Medical),
            "holiday" => Ok(EventType::Holiday),
            "vacation" => Ok(EventType::Vacation),
            "other" => Ok(EventType::Other),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// Parent concerné par un événement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventParent {
    Parent1,
    Parent2,
    Both,
}

impl EventParent {
    /// `Both` n'est pas un parent concret.
    pub fn role(self) -> Option<ParentRole> {
        match self {
            EventParent::Parent1 => Some(ParentRole::Parent1),
            EventParent::Parent2 => Some(ParentRole::Parent2),
            EventParent::Both => None,
        }
    }
}

impl From<ParentRole> for EventParent {
    fn from(role: ParentRole) -> Self {
        match role {
            ParentRole::Parent1 => EventParent::Parent1,
            ParentRole::Parent2 => EventParent::Parent2,
        }
    }
}

impl FromStr for EventParent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(EventParent::Both),
            other => other.parse::<ParentRole>().map(EventParent::from),
        }
    }
}

/// Événement du calendrier familial (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub parent_id: EventParent,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_request_id: Option<SwapRequestId>,
}

impl CalendarEvent {
    /// Crée un événement en validant que `end > start`.
    pub fn new<T: Into<String>>(
        title: T,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        event_type: EventType,
        parent_id: EventParent,
    ) -> Result<Self, CustodyError> {
        if end <= start {
            return Err(CustodyError::InvalidEventRange);
        }
        Ok(Self {
            id: EventId::random(),
            title: title.into(),
            start,
            end,
            event_type,
            parent_id,
            is_all_day: false,
            swap_request_id: None,
        })
    }

    /// Événement sur une journée entière `[date 00:00, date+1 00:00)`.
    pub fn all_day<T: Into<String>>(
        title: T,
        date: NaiveDate,
        event_type: EventType,
        parent_id: EventParent,
    ) -> Self {
        let start = midnight_utc(date);
        Self {
            id: EventId::random(),
            title: title.into(),
            start,
            end: start + Duration::days(1),
            event_type,
            parent_id,
            is_all_day: true,
            swap_request_id: None,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Dernier jour couvert ; une fin pile à minuit exclut ce jour.
    pub fn last_day(&self) -> NaiveDate {
        let end = self.end.date_naive();
        if midnight_utc(end) == self.end && end > self.first_day() {
            end.pred_opt().unwrap_or(end)
        } else {
            end
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    /// Parent imposé par l'événement s'il remplace le calendrier calculé.
    pub fn override_parent(&self) -> Option<ParentRole> {
        if self.event_type == EventType::Custody || self.swap_request_id.is_some() {
            self.parent_id.role()
        } else {
            None
        }
    }
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    Swap,
    OneWay,
}

impl FromStr for RequestType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "swap" => Ok(RequestType::Swap),
            "one-way" | "oneway" => Ok(RequestType::OneWay),
            other => Err(format!("unknown request type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}

/// Demande d'échange de jour de garde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub id: SwapRequestId,
    pub requester_id: UserId,
    pub requester_name: String,
    pub target_id: UserId,
    pub target_name: String,
    pub original_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_date: Option<NaiveDate>,
    pub request_type: RequestType,
    #[serde(default)]
    pub reason: String,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_note: Option<String>,
}

/// Membre (compte parent) d'une famille.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
}

/// Famille : deux comptes parents liés au plus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Family {
    pub const MAX_MEMBERS: usize = 2;

    pub fn new<N: Into<String>>(name: N, founder: Member) -> Self {
        Self {
            id: FamilyId::random(),
            name: name.into(),
            members: vec![founder],
        }
    }

    pub fn member(&self, user: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| &m.user_id == user)
    }

    pub fn is_member(&self, user: &UserId) -> bool {
        self.member(user).is_some()
    }

    pub fn add_member(&mut self, member: Member) -> Result<(), CustodyError> {
        if self.is_member(&member.user_id) {
            return Ok(());
        }
        if self.members.len() >= Self::MAX_MEMBERS {
            return Err(CustodyError::FamilyFull);
        }
        self.members.push(member);
        Ok(())
    }

    /// Rôle d'un membre : identifiants triés lexicographiquement, le premier est `parent1`.
    pub fn role_of(&self, user: &UserId) -> Option<ParentRole> {
        let mut ids: Vec<&UserId> = self.members.iter().map(|m| &m.user_id).collect();
        ids.sort();
        match ids.iter().position(|id| *id == user)? {
            0 => Some(ParentRole::Parent1),
            1 => Some(ParentRole::Parent2),
            _ => None,
        }
    }

    pub fn member_with_role(&self, role: ParentRole) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| self.role_of(&m.user_id) == Some(role))
    }

    pub fn other_member(&self, user: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| &m.user_id != user)
    }
}
