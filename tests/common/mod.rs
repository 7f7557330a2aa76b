//! Shared fixtures for integration tests

#![allow(dead_code)]

use grid_cache::{
    Coordinator, Entry, EntryId, EntryState, FetchDispatcher, FetchError, FetchEvents, Manifest,
    MemorySettings, Presenter, ResourceSource, ResourceStore, SettingsStore, SourceResponse,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const KEY: &str = "resource_list";

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 200, 10]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Source replaying scripted responses, then succeeding with a PNG.
/// Clones share their script and counters.
#[derive(Clone)]
pub struct MockSource {
    inner: Arc<MockState>,
}

struct MockState {
    script: Mutex<VecDeque<SourceResponse>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
}

impl MockSource {
    pub fn new() -> Self {
        Self::scripted(vec![])
    }

    pub fn scripted(script: Vec<SourceResponse>) -> Self {
        Self {
            inner: Arc::new(MockState {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                delay: Duration::from_millis(5),
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub fn max_active(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }
}

impl ResourceSource for MockSource {
    async fn fetch(&self) -> Result<SourceResponse, FetchError> {
        let state = &self.inner;
        let now = state.active.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_active.fetch_max(now, Ordering::SeqCst);
        state.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(state.delay).await;

        let next = state.script.lock().unwrap().pop_front();
        state.active.fetch_sub(1, Ordering::SeqCst);
        Ok(next.unwrap_or_else(|| SourceResponse {
            status: 200,
            body: png_bytes(),
        }))
    }
}

/// Presenter recording the state of every update it receives
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub updates: Arc<Mutex<Vec<Vec<EntryState>>>>,
}

impl RecordingPresenter {
    pub fn count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last(&self) -> Vec<EntryState> {
        self.updates.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Presenter for RecordingPresenter {
    fn entries_changed(&mut self, entries: &[Entry]) {
        self.updates
            .lock()
            .unwrap()
            .push(entries.iter().map(Entry::state).collect());
    }
}

/// Everything a coordinator test needs to inspect afterwards
pub struct Harness {
    pub coordinator: Coordinator,
    pub events: FetchEvents<EntryId>,
    pub source: MockSource,
    pub settings: MemorySettings,
    pub presenter: RecordingPresenter,
    pub store: ResourceStore,
    pub temp_dir: TempDir,
}

/// Build a coordinator whose manifest starts with `cached`, each name backed by
/// a real image file in the resources directory.
pub fn harness(source: MockSource, slot_count: usize, cached: &[&str]) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let resources = temp_dir.path().join("Resources");
    harness_in(temp_dir, resources, source, slot_count, cached, MemorySettings::new())
}

pub fn harness_in(
    temp_dir: TempDir,
    resources: std::path::PathBuf,
    source: MockSource,
    slot_count: usize,
    cached: &[&str],
    mut settings: MemorySettings,
) -> Harness {
    let store = ResourceStore::new(&resources);
    if !cached.is_empty() {
        let names: Vec<String> = cached.iter().map(|s| s.to_string()).collect();
        settings.set(KEY, &names).unwrap();
        for name in cached {
            store.save(&png_bytes(), name).unwrap();
        }
    }

    let presenter = RecordingPresenter::default();
    let manifest = Manifest::load(Box::new(settings.clone()), KEY);
    let (dispatcher, events) = FetchDispatcher::spawn(source.clone());
    let coordinator = Coordinator::new(
        manifest,
        ResourceStore::new(&resources),
        dispatcher,
        Box::new(presenter.clone()),
        slot_count,
    );

    Harness {
        coordinator,
        events,
        source,
        settings,
        presenter,
        store,
        temp_dir,
    }
}

pub fn states(coordinator: &Coordinator) -> Vec<EntryState> {
    coordinator.entries().iter().map(Entry::state).collect()
}
