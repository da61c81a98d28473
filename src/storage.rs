use crate::model::{CalendarEvent, CustodySchedule, EventId, Family, FamilyId, SwapRequest};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Tout ce qui est persisté pour une famille.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyDocument {
    pub family: Family,
    #[serde(default)]
    pub custody_schedule: Option<CustodySchedule>,
    #[serde(default)]
    pub calendar_events: Vec<CalendarEvent>,
    #[serde(default)]
    pub swap_requests: Vec<SwapRequest>,
}

impl FamilyDocument {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            custody_schedule: None,
            calendar_events: Vec::new(),
            swap_requests: Vec::new(),
        }
    }

    fn upsert_events(&mut self, events: &[CalendarEvent]) {
        for event in events {
            match self.calendar_events.iter_mut().find(|e| e.id == event.id) {
                Some(slot) => *slot = event.clone(),
                None => self.calendar_events.push(event.clone()),
            }
        }
    }

    fn upsert_swap_request(&mut self, request: &SwapRequest) {
        match self.swap_requests.iter_mut().find(|r| r.id == request.id) {
            Some(slot) => *slot = request.clone(),
            None => self.swap_requests.push(request.clone()),
        }
    }
}

/// Accès au stockage d'une famille. Les lectures renvoient des collections
/// complètes ; `delete_events` correspond à un lot (taille bornée par l'appelant).
pub trait FamilyStore {
    fn create_family(&self, family: &Family) -> anyhow::Result<()>;
    fn load_family(&self, id: &FamilyId) -> anyhow::Result<Option<Family>>;
    fn save_family(&self, family: &Family) -> anyhow::Result<()>;

    fn load_schedule(&self, id: &FamilyId) -> anyhow::Result<Option<CustodySchedule>>;
    fn save_schedule(&self, id: &FamilyId, schedule: &CustodySchedule) -> anyhow::Result<()>;

    fn list_events(&self, id: &FamilyId) -> anyhow::Result<Vec<CalendarEvent>>;
    fn put_events(&self, id: &FamilyId, events: &[CalendarEvent]) -> anyhow::Result<()>;
    fn delete_events(&self, id: &FamilyId, ids: &[EventId]) -> anyhow::Result<()>;

    fn list_swap_requests(&self, id: &FamilyId) -> anyhow::Result<Vec<SwapRequest>>;
    fn put_swap_request(&self, id: &FamilyId, request: &SwapRequest) -> anyhow::Result<()>;
}

/// Plusieurs sessions peuvent partager un même backend.
impl<S: FamilyStore + ?Sized> FamilyStore for Arc<S> {
    fn create_family(&self, family: &Family) -> anyhow::Result<()> {
        (**self).create_family(family)
    }
    fn load_family(&self, id: &FamilyId) -> anyhow::Result<Option<Family>> {
        (**self).load_family(id)
    }
    fn save_family(&self, family: &Family) -> anyhow::Result<()> {
        (**self).save_family(family)
    }
    fn load_schedule(&self, id: &FamilyId) -> anyhow::Result<Option<CustodySchedule>> {
        (**self).load_schedule(id)
    }
    fn save_schedule(&self, id: &FamilyId, schedule: &CustodySchedule) -> anyhow::Result<()> {
        (**self).save_schedule(id, schedule)
    }
    fn list_events(&self, id: &FamilyId) -> anyhow::Result<Vec<CalendarEvent>> {
        (**self).list_events(id)
    }
    fn put_events(&self, id: &FamilyId, events: &[CalendarEvent]) -> anyhow::Result<()> {
        (**self).put_events(id, events)
    }
    fn delete_events(&self, id: &FamilyId, ids: &[EventId]) -> anyhow::Result<()> {
        (**self).delete_events(id, ids)
    }
    fn list_swap_requests(&self, id: &FamilyId) -> anyhow::Result<Vec<SwapRequest>> {
        (**self).list_swap_requests(id)
    }
    fn put_swap_request(&self, id: &FamilyId, request: &SwapRequest) -> anyhow::Result<()> {
        (**self).put_swap_request(id, request)
    }
}

/// Un fichier JSON par famille dans un répertoire ; écritures atomiques.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let base_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    /// Seuls `[A-Za-z0-9_-]` sont acceptés : l'id ne sort jamais de `base_dir`.
    fn path_for(&self, id: &FamilyId) -> anyhow::Result<PathBuf> {
        let raw = id.as_str();
        let safe = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            anyhow::bail!("invalid family id: {raw:?}");
        }
        Ok(self.base_dir.join(format!("{raw}.json")))
    }

    fn read(&self, id: &FamilyId) -> anyhow::Result<Option<FamilyDocument>> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let doc = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(doc))
    }

    fn write(&self, doc: &FamilyDocument) -> anyhow::Result<()> {
        let path = self.path_for(&doc.family.id)?;
        let json = serde_json::to_vec_pretty(doc)?;
        let mut tmp = NamedTempFile::new_in(&self.base_dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).with_context(|| "atomic rename")?;
        tracing::debug!(path = %path.display(), "family document saved");
        Ok(())
    }

    fn modify<F>(&self, id: &FamilyId, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut FamilyDocument),
    {
        let mut doc = self
            .read(id)?
            .ok_or_else(|| anyhow!("unknown family: {id}"))?;
        f(&mut doc);
        self.write(&doc)
    }

    fn require(&self, id: &FamilyId) -> anyhow::Result<FamilyDocument> {
        self.read(id)?.ok_or_else(|| anyhow!("unknown family: {id}"))
    }
}

impl FamilyStore for JsonStore {
    fn create_family(&self, family: &Family) -> anyhow::Result<()> {
        if self.path_for(&family.id)?.exists() {
            anyhow::bail!("family already exists: {}", family.id);
        }
        self.write(&FamilyDocument::new(family.clone()))
    }

    fn load_family(&self, id: &FamilyId) -> anyhow::Result<Option<Family>> {
        Ok(self.read(id)?.map(|doc| doc.family))
    }

    fn save_family(&self, family: &Family) -> anyhow::Result<()> {
        self.modify(&family.id, |doc| doc.family = family.clone())
    }

    fn load_schedule(&self, id: &FamilyId) -> anyhow::Result<Option<CustodySchedule>> {
        Ok(self.require(id)?.custody_schedule)
    }

    fn save_schedule(&self, id: &FamilyId, schedule: &CustodySchedule) -> anyhow::Result<()> {
        self.modify(id, |doc| doc.custody_schedule = Some(schedule.clone()))
    }

    fn list_events(&self, id: &FamilyId) -> anyhow::Result<Vec<CalendarEvent>> {
        Ok(self.require(id)?.calendar_events)
    }

    fn put_events(&self, id: &FamilyId, events: &[CalendarEvent]) -> anyhow::Result<()> {
        self.modify(id, |doc| doc.upsert_events(events))
    }

    fn delete_events(&self, id: &FamilyId, ids: &[EventId]) -> anyhow::Result<()> {
        self.modify(id, |doc| doc.calendar_events.retain(|e| !ids.contains(&e.id)))
    }

    fn list_swap_requests(&self, id: &FamilyId) -> anyhow::Result<Vec<SwapRequest>> {
        Ok(self.require(id)?.swap_requests)
    }

    fn put_swap_request(&self, id: &FamilyId, request: &SwapRequest) -> anyhow::Result<()> {
        self.modify(id, |doc| doc.upsert_swap_request(request))
    }
}

/// Stockage en mémoire du processus.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<FamilyId, FamilyDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_doc<R, F>(&self, id: &FamilyId, f: F) -> anyhow::Result<R>
    where
        F: FnOnce(&mut FamilyDocument) -> R,
    {
        let mut docs = self.docs.lock().unwrap_or_else(|p| p.into_inner());
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| anyhow!("unknown family: {id}"))?;
        Ok(f(doc))
    }
}

impl FamilyStore for MemoryStore {
    fn create_family(&self, family: &Family) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().unwrap_or_else(|p| p.into_inner());
        if docs.contains_key(&family.id) {
            anyhow::bail!("family already exists: {}", family.id);
        }
        docs.insert(family.id.clone(), FamilyDocument::new(family.clone()));
        Ok(())
    }

    fn load_family(&self, id: &FamilyId) -> anyhow::Result<Option<Family>> {
        let docs = self.docs.lock().unwrap_or_else(|p| p.into_inner());
        Ok(docs.get(id).map(|doc| doc.family.clone()))
    }

    fn save_family(&self, family: &Family) -> anyhow::Result<()> {
        self.with_doc(&family.id, |doc| doc.family = family.clone())
    }

    fn load_schedule(&self, id: &FamilyId) -> anyhow::Result<Option<CustodySchedule>> {
        self.with_doc(id, |doc| doc.custody_schedule.clone())
    }

    fn save_schedule(&self, id: &FamilyId, schedule: &CustodySchedule) -> anyhow::Result<()> {
        self.with_doc(id, |doc| doc.custody_schedule = Some(schedule.clone()))
    }

    fn list_events(&self, id: &FamilyId) -> anyhow::Result<Vec<CalendarEvent>> {
        self.with_doc(id, |doc| doc.calendar_events.clone())
    }

    fn put_events(&self, id: &FamilyId, events: &[CalendarEvent]) -> anyhow::Result<()> {
        self.with_doc(id, |doc| doc.upsert_events(events))
    }

    fn delete_events(&self, id: &FamilyId, ids: &[EventId]) -> anyhow::Result<()> {
        self.with_doc(id, |doc| doc.calendar_events.retain(|e| !ids.contains(&e.id)))
    }

    fn list_swap_requests(&self, id: &FamilyId) -> anyhow::Result<Vec<SwapRequest>> {
        self.with_doc(id, |doc| doc.swap_requests.clone())
    }

    fn put_swap_request(&self, id: &FamilyId, request: &SwapRequest) -> anyhow::Result<()> {
        self.with_doc(id, |doc| doc.upsert_swap_request(request))
    }
}
