//! Resource coordinator
//!
//! Owns the per-slot entry list and the manifest, answers presentation
//! commands, and applies dispatcher completions. All methods take `&mut self`;
//! callers drive it from a single task (see [`Coordinator::run`]).
//!
//! Entries carry a stable [`EntryId`] and fetches are keyed by it rather than
//! by slot index. A completion for an entry that has since been removed is
//! discarded, and one for an entry that has shifted lands on its new index.

use crate::config::GridConfig;
use crate::dispatcher::{FetchDispatcher, FetchEvent, FetchEvents};
use crate::manifest::Manifest;
use crate::settings::SettingsStore;
use crate::source::ResourceSource;
use crate::store::{generate_resource_name, ResourceStore};
use image::DynamicImage;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Stable identity of an entry, independent of its current slot index
pub type EntryId = u64;

/// What the presentation layer should show for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Loading,
    Loaded,
    Failed,
}

/// Per-slot view state
#[derive(Debug, Clone)]
pub struct Entry {
    id: EntryId,
    image: Option<DynamicImage>,
    error: Option<String>,
}

impl Entry {
    fn new(id: EntryId) -> Self {
        Self {
            id,
            image: None,
            error: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> EntryState {
        match (&self.image, &self.error) {
            (Some(_), _) => EntryState::Loaded,
            (None, Some(_)) => EntryState::Failed,
            (None, None) => EntryState::Loading,
        }
    }

    fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
        self.error = None;
    }

    fn set_error(&mut self, error: String) {
        self.image = None;
        self.error = Some(error);
    }
}

/// Receiver of entry list updates
pub trait Presenter: Send {
    fn entries_changed(&mut self, entries: &[Entry]);
}

/// Inbound events from the presentation layer
#[derive(Debug)]
pub enum Command {
    VisibleSlotsChanged(Vec<usize>),
    /// Selecting a slot removes it
    SlotSelected(usize),
    /// Full reset; the sender is signalled once fetches have been resubmitted
    RefreshRequested(oneshot::Sender<()>),
}

pub struct Coordinator {
    entries: Vec<Entry>,
    next_id: EntryId,
    slot_count: usize,
    manifest: Manifest,
    store: ResourceStore,
    dispatcher: FetchDispatcher<EntryId>,
    presenter: Box<dyn Presenter>,
    /// Completions still owed per id. An id can be resubmitted while its
    /// previous completion is queued, so this counts rather than flags.
    awaiting: HashMap<EntryId, usize>,
}

impl Coordinator {
    /// Build a coordinator and attach the presenter, which immediately
    /// receives the initial (all loading) entry list.
    pub fn new(
        manifest: Manifest,
        store: ResourceStore,
        dispatcher: FetchDispatcher<EntryId>,
        presenter: Box<dyn Presenter>,
        slot_count: usize,
    ) -> Self {
        let mut coordinator = Self {
            entries: Vec::new(),
            next_id: 0,
            slot_count,
            manifest,
            store,
            dispatcher,
            presenter,
            awaiting: HashMap::new(),
        };
        coordinator.reset_entries();
        coordinator.notify();
        coordinator
    }

    /// Wire up store, manifest and dispatcher from configuration.
    /// Must be called inside a tokio runtime.
    pub fn from_config<S: ResourceSource>(
        config: &GridConfig,
        settings: Box<dyn SettingsStore>,
        source: S,
        presenter: Box<dyn Presenter>,
    ) -> (Self, FetchEvents<EntryId>) {
        let manifest = Manifest::load(settings, &config.manifest_key);
        let store = ResourceStore::new(config.resources_dir());
        let (dispatcher, events) = FetchDispatcher::spawn(source);
        let coordinator = Self::new(manifest, store, dispatcher, presenter, config.slot_count);
        (coordinator, events)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Whether any submitted fetch has yet to report back
    pub fn has_outstanding(&self) -> bool {
        !self.awaiting.is_empty()
    }

    /// Serve visible slots from the cache where possible, fetch the rest.
    /// Slots are handled in ascending order so earlier items resolve first.
    pub fn on_visible_slots_changed(&mut self, slots: &[usize]) {
        let mut slots = slots.to_vec();
        slots.sort_unstable();
        slots.dedup();

        let mut changed = false;
        for slot in slots {
            let Some(id) = self.entries.get(slot).map(Entry::id) else {
                log::debug!("Ignoring visible slot {} beyond {} entries", slot, self.entries.len());
                continue;
            };
            match self.cached_image(slot) {
                Some(image) => {
                    self.entries[slot].set_image(image);
                    changed = true;
                }
                None => self.request(id),
            }
        }

        if changed {
            self.notify();
        }
    }

    /// Remove a slot: its cached file, manifest record and entry. Later slots
    /// shift down by one. In-flight fetches are not cancelled.
    pub fn on_slot_removed(&mut self, slot: usize) {
        if slot >= self.entries.len() {
            log::debug!("Ignoring removal of slot {} beyond {} entries", slot, self.entries.len());
            return;
        }
        if let Some(name) = self.manifest.remove_at(slot) {
            self.store.remove(&name);
        }
        let entry = self.entries.remove(slot);
        log::info!("Removed slot {} (entry {})", slot, entry.id);
        self.notify();
    }

    /// Drop every cached resource and refill as many slots as were cached
    pub fn on_full_reset(&mut self) {
        let previous = self.manifest.len();
        for name in self.manifest.names() {
            self.store.remove(name);
        }
        self.manifest.clear();
        self.reset_entries();
        log::info!(
            "Reset to {} entries, refetching {} slots",
            self.entries.len(),
            previous
        );
        self.notify();

        for slot in 0..previous {
            if let Some(id) = self.entries.get(slot).map(Entry::id) {
                self.request(id);
            }
        }
    }

    /// Apply one dispatcher completion
    pub fn handle_event(&mut self, event: FetchEvent<EntryId>) {
        let id = event.key();
        if let Some(count) = self.awaiting.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.awaiting.remove(&id);
            }
        }

        let Some(slot) = self.slot_of(id) else {
            log::debug!("Discarding fetch result for removed entry {}", id);
            return;
        };

        match event {
            FetchEvent::Loaded { bytes, image, .. } => self.did_load(slot, &bytes, image),
            FetchEvent::Failed { error, .. } => self.entries[slot].set_error(error.to_string()),
        }
        self.notify();
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::VisibleSlotsChanged(slots) => self.on_visible_slots_changed(&slots),
            Command::SlotSelected(slot) => self.on_slot_removed(slot),
            Command::RefreshRequested(done) => {
                self.on_full_reset();
                if done.send(()).is_err() {
                    log::debug!("Refresh requester went away before completion");
                }
            }
        }
    }

    /// Process commands and fetch completions until the command channel closes
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        events: &mut FetchEvents<EntryId>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
    }

    /// Apply completions until every submitted fetch has reported back
    pub async fn settle(&mut self, events: &mut FetchEvents<EntryId>) {
        while self.has_outstanding() {
            match events.recv().await {
                Some(event) => self.handle_event(event),
                None => {
                    let outstanding: usize = self.awaiting.values().sum();
                    log::warn!("Fetch worker stopped with {} outstanding", outstanding);
                    self.awaiting.clear();
                }
            }
        }
    }

    fn did_load(&mut self, slot: usize, bytes: &[u8], image: DynamicImage) {
        let name = generate_resource_name();
        // A failed save only skips the manifest; the image is still shown
        if self.store.save(bytes, &name).is_ok() {
            // An in-bounds set overwrites; the displaced file is unreachable
            let displaced = self.manifest.get(slot).map(str::to_string);
            self.manifest.set(slot, &name);
            if let Some(displaced) = displaced {
                self.store.remove(&displaced);
            }
        }
        self.entries[slot].set_image(image);
    }

    fn cached_image(&self, slot: usize) -> Option<DynamicImage> {
        let name = self.manifest.get(slot)?;
        let bytes = self.store.read(name).ok()?;
        match image::load_from_memory(&bytes) {
            Ok(image) => {
                log::debug!("Cache hit for slot {} ({})", slot, name);
                Some(image)
            }
            Err(e) => {
                log::warn!("Cached file {} is not a decodable image: {}", name, e);
                None
            }
        }
    }

    fn request(&mut self, id: EntryId) {
        if self.dispatcher.load_resource(id) {
            *self.awaiting.entry(id).or_insert(0) += 1;
        }
    }

    fn slot_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn reset_entries(&mut self) {
        self.entries = (0..self.slot_count)
            .map(|offset| Entry::new(self.next_id + offset as EntryId))
            .collect();
        self.next_id += self.slot_count as EntryId;
    }

    fn notify(&mut self) {
        self.presenter.entries_changed(&self.entries);
    }
}
