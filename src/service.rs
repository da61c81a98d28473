//! Façade d'une session parent sur sa famille : miroirs locaux + écritures
//! optimistes vers le backend choisi à la construction.

use crate::config::Config;
use crate::custody::{CustodyCalendar, Resolution, Transition};
use crate::error::CustodyError;
use crate::model::{
    CalendarEvent, CustodySchedule, EventId, EventType, Family, FamilyId, Member, ParentRole,
    PendingApproval, RequestType, ScheduleDraft, SwapRequest, SwapRequestId, SwapStatus, UserId,
};
use crate::state::{apply_optimistic, LiveState};
use crate::storage::FamilyStore;
use crate::swap::{self, SwapDecision};
use chrono::{NaiveDate, Utc};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Utilisateur authentifié et famille courante.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub family_id: Option<FamilyId>,
}

impl Session {
    pub fn new<N: Into<String>>(user_id: UserId, display_name: N) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            family_id: None,
        }
    }

    pub fn with_family(mut self, family_id: FamilyId) -> Self {
        self.family_id = Some(family_id);
        self
    }
}

/// Effet d'une soumission de calendrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Applied,
    PendingApproval,
}

pub struct FamilyService {
    store: Box<dyn FamilyStore>,
    config: Config,
    session: Session,
    family: LiveState<Option<Family>>,
    schedule: LiveState<Option<CustodySchedule>>,
    events: LiveState<Vec<CalendarEvent>>,
    swaps: LiveState<Vec<SwapRequest>>,
}

impl FamilyService {
    pub fn new(store: Box<dyn FamilyStore>, config: Config, session: Session) -> Self {
        Self {
            store,
            config,
            session,
            family: LiveState::default(),
            schedule: LiveState::default(),
            events: LiveState::default(),
            swaps: LiveState::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn family_id(&self) -> Result<&FamilyId, CustodyError> {
        self.session
            .family_id
            .as_ref()
            .ok_or(CustodyError::MissingFamilyContext)
    }

    /// Crée une famille dont l'utilisateur courant est le premier membre.
    pub fn create_family(&mut self, name: &str) -> Result<FamilyId, CustodyError> {
        let founder = Member {
            user_id: self.session.user_id.clone(),
            display_name: self.session.display_name.clone(),
        };
        let family = Family::new(name, founder);
        self.store.create_family(&family)?;
        info!(family = %family.id, "family created");
        self.session.family_id = Some(family.id.clone());
        self.sync()?;
        Ok(family.id)
    }

    /// Rejoint une famille existante (deux parents au plus).
    pub fn join_family(&mut self, id: &FamilyId) -> Result<(), CustodyError> {
        let mut family = self
            .store
            .load_family(id)?
            .ok_or_else(|| CustodyError::FamilyNotFound(id.to_string()))?;
        family.add_member(Member {
            user_id: self.session.user_id.clone(),
            display_name: self.session.display_name.clone(),
        })?;
        self.store.save_family(&family)?;
        info!(family = %id, user = %self.session.user_id, "joined family");
        self.session.family_id = Some(id.clone());
        self.sync()
    }

    /// Relit toutes les collections et remplace les miroirs.
    pub fn sync(&self) -> Result<(), CustodyError> {
        let id = self.family_id()?;
        let family = self
            .store
            .load_family(id)?
            .ok_or_else(|| CustodyError::FamilyNotFound(id.to_string()))?;
        let schedule = self.store.load_schedule(id)?;
        let events = self.store.list_events(id)?;
        let swaps = self.store.list_swap_requests(id)?;
        debug!(
            family = %id,
            events = events.len(),
            swaps = swaps.len(),
            "snapshot received"
        );
        self.family.publish(Some(family));
        self.schedule.publish(schedule);
        self.events.publish(events);
        self.swaps.publish(swaps);
        Ok(())
    }

    pub fn family(&self) -> Result<Family, CustodyError> {
        let id = self.family_id()?;
        let family = self
            .family
            .snapshot()
            .as_ref()
            .clone()
            .ok_or_else(|| CustodyError::FamilyNotFound(id.to_string()))?;
        if !family.is_member(&self.session.user_id) {
            return Err(CustodyError::NotAFamilyMember);
        }
        Ok(family)
    }

    pub fn role(&self) -> Result<ParentRole, CustodyError> {
        self.family()?
            .role_of(&self.session.user_id)
            .ok_or(CustodyError::NotAFamilyMember)
    }

    pub fn display_name(&self, role: ParentRole) -> String {
        let family = self.family.snapshot();
        self.config.parent_names.display_name(family.as_ref().as_ref(), role)
    }

    pub fn schedule(&self) -> Arc<Option<CustodySchedule>> {
        self.schedule.snapshot()
    }

    pub fn events(&self) -> Arc<Vec<CalendarEvent>> {
        self.events.snapshot()
    }

    pub fn swap_requests(&self) -> Arc<Vec<SwapRequest>> {
        self.swaps.snapshot()
    }

    pub fn subscribe_schedule(&self) -> Receiver<Arc<Option<CustodySchedule>>> {
        self.schedule.subscribe()
    }

    pub fn subscribe_events(&self) -> Receiver<Arc<Vec<CalendarEvent>>> {
        self.events.subscribe()
    }

    pub fn subscribe_swap_requests(&self) -> Receiver<Arc<Vec<SwapRequest>>> {
        self.swaps.subscribe()
    }

    /// Exécute `f` sur une vue cohérente des snapshots courants.
    pub fn with_calendar<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&CustodyCalendar<'_>) -> R,
    {
        let schedule = self.schedule.snapshot();
        let events = self.events.snapshot();
        let calendar = CustodyCalendar::new(schedule.as_ref().as_ref(), &events);
        f(&calendar)
    }

    pub fn who_has(&self, date: NaiveDate) -> Resolution {
        self.with_calendar(|cal| cal.resolve(date))
    }

    pub fn next_transition(&self, date: NaiveDate) -> Option<Transition> {
        let horizon = self.config.transition_horizon_days;
        self.with_calendar(|cal| cal.next_transition_within(date, cal.parent_on(date), horizon))
    }

    // --- événements ---

    pub fn add_event(&self, event: CalendarEvent) -> Result<EventId, CustodyError> {
        self.family()?;
        let id = self.family_id()?;
        let event_id = event.id.clone();
        let stored = event.clone();
        apply_optimistic(
            &self.events,
            |events| events.push(event),
            |_| self.store.put_events(id, std::slice::from_ref(&stored)),
        )?;
        debug!(event = %event_id, "event added");
        Ok(event_id)
    }

    pub fn remove_event(&self, event_id: &EventId) -> Result<(), CustodyError> {
        self.family()?;
        if !self.events.snapshot().iter().any(|e| &e.id == event_id) {
            return Err(CustodyError::EventNotFound(event_id.to_string()));
        }
        self.delete_events_batched(std::slice::from_ref(event_id))
    }

    /// Supprime par lots de `batch_limit` identifiants.
    fn delete_events_batched(&self, ids: &[EventId]) -> Result<(), CustodyError> {
        if ids.is_empty() {
            return Ok(());
        }
        let family_id = self.family_id()?;
        let limit = self.config.batch_limit.max(1);
        apply_optimistic(
            &self.events,
            |events| events.retain(|e| !ids.contains(&e.id)),
            |_| {
                for chunk in ids.chunks(limit) {
                    self.store.delete_events(family_id, chunk)?;
                }
                Ok(())
            },
        )?;
        debug!(count = ids.len(), batches = ids.len().div_ceil(limit), "events deleted");
        Ok(())
    }

    /// Supprime les événements de garde simples (hors échanges) à partir de `from`.
    pub fn purge_stale_custody_events(&self, from: NaiveDate) -> Result<usize, CustodyError> {
        let stale: Vec<EventId> = self
            .events
            .snapshot()
            .iter()
            .filter(|e| {
                e.event_type == EventType::Custody
                    && e.swap_request_id.is_none()
                    && e.first_day() >= from
            })
            .map(|e| e.id.clone())
            .collect();
        self.delete_events_batched(&stale)?;
        if !stale.is_empty() {
            info!(count = stale.len(), from = %from, "stale custody events purged");
        }
        Ok(stale.len())
    }

    // --- calendrier de garde et approbations ---

    /// Applique directement le brouillon s'il n'y a pas encore de calendrier ou
    /// pas d'autre parent ; sinon le place en attente d'approbation.
    pub fn submit_schedule(&self, draft: ScheduleDraft) -> Result<ScheduleOutcome, CustodyError> {
        draft.validate()?;
        let family = self.family()?;
        let role = self.role()?;
        let current = self.schedule.snapshot();

        match current.as_ref() {
            Some(_) if family.members.len() > 1 => {
                let pending = PendingApproval {
                    draft,
                    requested_by: self.session.user_id.clone(),
                    requested_by_name: self.display_name(role),
                    requested_at: Utc::now(),
                };
                self.update_schedule(|schedule| schedule.pending_approval = Some(pending))?;
                info!(user = %self.session.user_id, "schedule change awaiting approval");
                Ok(ScheduleOutcome::PendingApproval)
            }
            Some(existing) => {
                let mut next = existing.clone();
                next.apply_draft(draft)?;
                next.pending_approval = None;
                self.activate_schedule(next)?;
                Ok(ScheduleOutcome::Applied)
            }
            None => {
                self.activate_schedule(CustodySchedule::from_draft(draft)?)?;
                Ok(ScheduleOutcome::Applied)
            }
        }
    }

    pub fn approve_schedule_change(&self) -> Result<(), CustodyError> {
        let pending = self.pending_for_response()?;
        let mut next = self
            .schedule
            .snapshot()
            .as_ref()
            .clone()
            .ok_or(CustodyError::NoActiveSchedule)?;
        next.apply_draft(pending.draft)?;
        next.pending_approval = None;
        self.activate_schedule(next)?;
        info!(user = %self.session.user_id, "schedule change approved");
        Ok(())
    }

    pub fn reject_schedule_change(&self) -> Result<(), CustodyError> {
        self.pending_for_response()?;
        self.update_schedule(|schedule| schedule.pending_approval = None)?;
        info!(user = %self.session.user_id, "schedule change rejected");
        Ok(())
    }

    pub fn cancel_schedule_change(&self) -> Result<(), CustodyError> {
        self.family()?;
        let pending = self.current_pending()?;
        if pending.requested_by != self.session.user_id {
            return Err(CustodyError::OnlyRequesterCanCancel);
        }
        self.update_schedule(|schedule| schedule.pending_approval = None)?;
        info!(user = %self.session.user_id, "schedule change cancelled");
        Ok(())
    }

    fn current_pending(&self) -> Result<PendingApproval, CustodyError> {
        let schedule = self.schedule.snapshot();
        let schedule = schedule.as_ref().as_ref().ok_or(CustodyError::NoActiveSchedule)?;
        schedule
            .pending_approval
            .clone()
            .ok_or(CustodyError::NoPendingApproval)
    }

    fn pending_for_response(&self) -> Result<PendingApproval, CustodyError> {
        self.family()?;
        let pending = self.current_pending()?;
        if pending.requested_by == self.session.user_id {
            return Err(CustodyError::RequesterCannotApprove);
        }
        Ok(pending)
    }

    fn update_schedule<F>(&self, f: F) -> Result<(), CustodyError>
    where
        F: FnOnce(&mut CustodySchedule),
    {
        let id = self.family_id()?;
        if self.schedule.snapshot().is_none() {
            return Err(CustodyError::NoActiveSchedule);
        }
        apply_optimistic(
            &self.schedule,
            |schedule| {
                if let Some(schedule) = schedule.as_mut() {
                    f(schedule);
                }
            },
            |schedule| match schedule {
                Some(schedule) => self.store.save_schedule(id, schedule),
                None => Ok(()),
            },
        )
    }

    fn activate_schedule(&self, schedule: CustodySchedule) -> Result<(), CustodyError> {
        let id = self.family_id()?;
        let from = schedule.start_date;
        apply_optimistic(
            &self.schedule,
            |current| *current = Some(schedule),
            |current| match current {
                Some(schedule) => self.store.save_schedule(id, schedule),
                None => Ok(()),
            },
        )?;
        info!(family = %id, start = %from, "custody schedule active");
        self.purge_stale_custody_events(from)?;
        Ok(())
    }

    // --- échanges ---

    pub fn request_swap(
        &self,
        request_type: RequestType,
        original_date: NaiveDate,
        proposed_date: Option<NaiveDate>,
        reason: &str,
    ) -> Result<SwapRequest, CustodyError> {
        let family = self.family()?;
        let role = self.role()?;
        let target = family
            .other_member(&self.session.user_id)
            .ok_or(CustodyError::MissingOtherParent)?;

        self.with_calendar(|cal| {
            swap::validate_swap(cal, role, request_type, original_date, proposed_date)
        })?;

        let request = SwapRequest {
            id: SwapRequestId::random(),
            requester_id: self.session.user_id.clone(),
            requester_name: self.display_name(role),
            target_id: target.user_id.clone(),
            target_name: self.display_name(role.other()),
            original_date,
            proposed_date: match request_type {
                RequestType::Swap => proposed_date,
                RequestType::OneWay => None,
            },
            request_type,
            reason: reason.to_string(),
            status: SwapStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            response_note: None,
        };

        let id = self.family_id()?;
        let stored = request.clone();
        apply_optimistic(
            &self.swaps,
            |swaps| swaps.push(stored),
            |_| self.store.put_swap_request(id, &request),
        )?;
        info!(request = %request.id, original = %original_date, "swap requested");
        Ok(request)
    }

    fn find_swap(&self, request_id: &SwapRequestId) -> Result<SwapRequest, CustodyError> {
        self.swaps
            .snapshot()
            .iter()
            .find(|r| &r.id == request_id)
            .cloned()
            .ok_or_else(|| CustodyError::SwapRequestNotFound(request_id.to_string()))
    }

    pub fn respond_to_swap(
        &self,
        request_id: &SwapRequestId,
        decision: SwapDecision,
        note: Option<String>,
    ) -> Result<SwapRequest, CustodyError> {
        let family = self.family()?;
        let mut request = self.find_swap(request_id)?;
        swap::ensure_can_respond(&request, &self.session.user_id)?;

        request.status = decision.status();
        request.responded_at = Some(Utc::now());
        request.response_note = note;

        match decision {
            SwapDecision::Approve => {
                let requester_role = family
                    .role_of(&request.requester_id)
                    .ok_or(CustodyError::NotAFamilyMember)?;
                let overrides = swap::override_events_for(&request, requester_role);
                let family_id = self.family_id()?;
                let added = overrides.clone();
                apply_optimistic(
                    &self.events,
                    |events| events.extend(added),
                    |_| self.store.put_events(family_id, &overrides),
                )?;
                if let Err(err) = self.save_swap(&request) {
                    // compensation : les overrides ne doivent pas survivre à un statut non enregistré
                    let ids: Vec<EventId> = overrides.iter().map(|e| e.id.clone()).collect();
                    if let Err(cleanup) = self.delete_events_batched(&ids) {
                        warn!(error = %cleanup, "could not remove swap overrides after failure");
                    }
                    return Err(err);
                }
            }
            SwapDecision::Reject => {
                self.save_swap(&request)?;
                self.remove_swap_overrides(request_id)?;
            }
        }

        info!(request = %request.id, status = ?request.status, "swap answered");
        Ok(request)
    }

    pub fn cancel_swap(&self, request_id: &SwapRequestId) -> Result<SwapRequest, CustodyError> {
        self.family()?;
        let mut request = self.find_swap(request_id)?;
        swap::ensure_can_cancel(&request, &self.session.user_id)?;
        request.status = SwapStatus::Cancelled;
        request.responded_at = Some(Utc::now());
        self.save_swap(&request)?;
        self.remove_swap_overrides(request_id)?;
        info!(request = %request.id, "swap cancelled");
        Ok(request)
    }

    /// Retire les overrides liés à une demande ; sans effet s'il n'y en a pas.
    pub fn remove_swap_overrides(&self, request_id: &SwapRequestId) -> Result<usize, CustodyError> {
        let ids: Vec<EventId> = self
            .events
            .snapshot()
            .iter()
            .filter(|e| e.swap_request_id.as_ref() == Some(request_id))
            .map(|e| e.id.clone())
            .collect();
        self.delete_events_batched(&ids)?;
        Ok(ids.len())
    }

    fn save_swap(&self, request: &SwapRequest) -> Result<(), CustodyError> {
        let id = self.family_id()?;
        let updated = request.clone();
        apply_optimistic(
            &self.swaps,
            |swaps| match swaps.iter_mut().find(|r| r.id == updated.id) {
                Some(slot) => *slot = updated,
                None => swaps.push(updated),
            },
            |_| self.store.put_swap_request(id, request),
        )
    }

    pub fn pending_swaps_for_me(&self) -> Vec<SwapRequest> {
        self.swaps
            .snapshot()
            .iter()
            .filter(|r| r.status == SwapStatus::Pending && r.target_id == self.session.user_id)
            .cloned()
            .collect()
    }
}
