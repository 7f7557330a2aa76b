//! Grid Cache - image grid backend
//!
//! Fetches images for a fixed number of grid slots one request at a time,
//! caches them on disk and remembers which file belongs to which slot across
//! restarts.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod manifest;
pub mod settings;
pub mod source;
pub mod store;

pub use config::{EndpointConfig, GridConfig};
pub use coordinator::{Command, Coordinator, Entry, EntryId, EntryState, Presenter};
pub use dispatcher::{FetchDispatcher, FetchEvent, FetchEvents};
pub use error::{FetchError, GridError, Result, StoreError};
pub use manifest::Manifest;
pub use settings::{JsonSettings, MemorySettings, SettingsStore};
pub use source::{HttpSource, ResourceSource, SourceResponse};
pub use store::ResourceStore;
