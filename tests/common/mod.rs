#![allow(dead_code)]
use anyhow::bail;
use chrono::NaiveDate;
use garde::{
    model::{CalendarEvent, CustodySchedule, EventId, Family, FamilyId, SwapRequest},
    Config, CustodyPattern, FamilyService, FamilyStore, MemoryStore, ParentRole, ScheduleDraft,
    Session, UserId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Backend mémoire qui enregistre les lots de suppression et peut refuser les écritures.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub delete_batches: Mutex<Vec<usize>>,
    pub offline: AtomicBool,
    /// Ne refuse que les écritures de demandes d'échange.
    pub fail_swap_writes: AtomicBool,
}

impl RecordingStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_fail_swap_writes(&self, fail: bool) {
        self.fail_swap_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("backend unreachable");
        }
        Ok(())
    }
}

impl FamilyStore for RecordingStore {
    fn create_family(&self, family: &Family) -> anyhow::Result<()> {
        self.check()?;
        self.inner.create_family(family)
    }
    fn load_family(&self, id: &FamilyId) -> anyhow::Result<Option<Family>> {
        self.inner.load_family(id)
    }
    fn save_family(&self, family: &Family) -> anyhow::Result<()> {
        self.check()?;
        self.inner.save_family(family)
    }
    fn load_schedule(&self, id: &FamilyId) -> anyhow::Result<Option<CustodySchedule>> {
        self.inner.load_schedule(id)
    }
    fn save_schedule(&self, id: &FamilyId, schedule: &CustodySchedule) -> anyhow::Result<()> {
        self.check()?;
        self.inner.save_schedule(id, schedule)
    }
    fn list_events(&self, id: &FamilyId) -> anyhow::Result<Vec<CalendarEvent>> {
        self.inner.list_events(id)
    }
    fn put_events(&self, id: &FamilyId, events: &[CalendarEvent]) -> anyhow::Result<()> {
        self.check()?;
        self.inner.put_events(id, events)
    }
    fn delete_events(&self, id: &FamilyId, ids: &[EventId]) -> anyhow::Result<()> {
        self.check()?;
        self.delete_batches.lock().unwrap().push(ids.len());
        self.inner.delete_events(id, ids)
    }
    fn list_swap_requests(&self, id: &FamilyId) -> anyhow::Result<Vec<SwapRequest>> {
        self.inner.list_swap_requests(id)
    }
    fn put_swap_request(&self, id: &FamilyId, request: &SwapRequest) -> anyhow::Result<()> {
        self.check()?;
        if self.fail_swap_writes.load(Ordering::SeqCst) {
            bail!("swap request write refused");
        }
        self.inner.put_swap_request(id, request)
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Calendrier hebdo : parent1 dim-mer, parent2 jeu-sam, à partir du dimanche 2024-01-07.
pub fn weekly_draft() -> ScheduleDraft {
    let mut draft = ScheduleDraft::new("Hebdo", CustodyPattern::Weekly, d(2024, 1, 7));
    for day in [0, 1, 2, 3] {
        draft.assign_day(ParentRole::Parent1, day).unwrap();
    }
    for day in [4, 5, 6] {
        draft.assign_day(ParentRole::Parent2, day).unwrap();
    }
    draft
}

pub fn session_for(
    store: &Arc<RecordingStore>,
    config: Config,
    user: &str,
    name: &str,
    family: Option<&FamilyId>,
) -> FamilyService {
    let mut session = Session::new(UserId::new(user), name);
    if let Some(id) = family {
        session = session.with_family(id.clone());
    }
    FamilyService::new(Box::new(Arc::clone(store)), config, session)
}

/// Famille à deux parents ("alice" < "bob" : alice = parent1), calendrier hebdo actif.
pub fn two_parent_family(config: Config) -> (Arc<RecordingStore>, FamilyService, FamilyService) {
    let store = Arc::new(RecordingStore::default());
    let mut alice = session_for(&store, config.clone(), "alice", "Alice", None);
    let family_id = alice.create_family("Famille Martin").unwrap();
    alice.submit_schedule(weekly_draft()).unwrap();

    let mut bob = session_for(&store, config, "bob", "Bob", None);
    bob.join_family(&family_id).unwrap();
    alice.sync().unwrap();
    (store, alice, bob)
}
