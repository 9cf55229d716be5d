use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::heuristics::RefinedBatch;
use crate::imaging::Rotation;
use crate::llm_extract::ScanFields;
use crate::material::{
    KEY_ARRIVAL, KEY_BATCH, KEY_FILM, KEY_SUPPLIER, KEY_THICKNESS, KEY_WIDTH, Material,
};

/// The uploaded checksheet photo, as received.
#[derive(Debug)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub digest: String,
    pub filename: String,
}

/// Last successful extraction and what it was made from.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub fields: ScanFields,
    pub batch: RefinedBatch,
    pub material: Material,
    pub rotation: Rotation,
    pub digest: String,
    pub duration: Duration,
}

impl ScanResult {
    /// Correction-form pre-fill: the extracted fields plus the refined batch,
    /// its arrival date, the size label and the matched supplier.
    pub fn form_values(&self) -> ScanFields {
        let profile = self.material.profile();
        let get = |key: &str| self.fields.get(key).map(String::as_str).unwrap_or_default();

        let mut values = self.fields.clone();
        values.insert(
            KEY_FILM.to_string(),
            profile.film_label(get(KEY_WIDTH), get(KEY_THICKNESS)),
        );
        values.insert(KEY_BATCH.to_string(), self.batch.canonical.clone());
        values.insert(KEY_ARRIVAL.to_string(), self.batch.arrival.to_string());
        values.insert(
            KEY_SUPPLIER.to_string(),
            profile.pick_supplier(get(KEY_SUPPLIER)).to_string(),
        );
        values
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Warning(String),
    Error(String),
}

/// State of one operator's form.
#[derive(Debug, Default)]
pub struct Session {
    pub photo: Option<Photo>,
    pub rotation: Rotation,
    pub material: Material,
    pub scan: Option<ScanResult>,
    /// Set after a successful append; blocks a second send of the same scan.
    pub submitted: bool,
    flashes: Vec<Flash>,
}

impl Session {
    /// A new photo invalidates the rotation and any scan of the old one.
    pub fn set_photo(&mut self, photo: Photo) {
        self.photo = Some(photo);
        self.rotation = Rotation::default();
        self.scan = None;
    }

    pub fn rotate(&mut self) {
        self.rotation = self.rotation.turned();
    }

    pub fn begin_analysis(&mut self) {
        self.submitted = false;
    }

    pub fn store_scan(&mut self, scan: ScanResult) {
        self.scan = Some(scan);
    }

    /// Record a successful append and drop the scan it came from.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
        self.scan = None;
    }

    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

struct Slot {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

/// Independent per-operator sessions keyed by cookie id.
pub struct SessionStore {
    slots: DashMap<Uuid, Slot>,
    idle: Duration,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            idle,
        }
    }

    /// Look up `id`, or open a fresh session when it is missing or expired.
    /// The returned flag is true for a new session.
    pub fn open(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Session>>, bool) {
        self.prune();

        if let Some(id) = id {
            if let Some(mut slot) = self.slots.get_mut(&id) {
                slot.last_seen = Instant::now();
                return (id, Arc::clone(&slot.session), false);
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::default()));
        self.slots.insert(
            id,
            Slot {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        info!(session = %id, active = self.slots.len(), "Session opened");
        (id, session, true)
    }

    fn prune(&self) {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.last_seen.elapsed() < self.idle);
        let dropped = before.saturating_sub(self.slots.len());
        if dropped > 0 {
            info!(dropped, "Idle sessions pruned");
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
