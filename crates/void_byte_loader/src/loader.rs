//! Byte Loader - one deferred, byte-encoded model
//!
//! A loader owns its raw bytes from acquisition until its load finishes,
//! then releases them. The load runs once, on a background task started by
//! the scheduler, and always ends in a terminal state even when decoding
//! fails or panics.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::ResourceMatch;
use crate::decoder::{DecodeContext, ModelDecoder};
use crate::error::Result;
use crate::source::{self, ResourceSource};
use crate::state::{LoadState, StateCell};
use crate::task::LoadTask;

/// Type-erased view of a loader, as seen by the registry and scheduler
pub trait ByteLoad: Send + Sync {
    /// Loader name
    fn name(&self) -> &str;

    /// Bytes file name (or suffix) to look up
    fn bytes_file_name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> LoadState;

    /// Whether raw bytes are currently held
    fn has_bytes(&self) -> bool;

    /// Locate and read this loader's bytes
    fn acquire_bytes(&self, source: &dyn ResourceSource, matching: ResourceMatch) -> Result<usize>;

    /// Decode the bytes. Never fails; the outcome is recorded in the state.
    /// Only the first call loads; any other call returns immediately.
    fn run_load(&self);

    /// Mark the loader failed without running it
    fn fail(&self, reason: String);

    /// Record the background task running this loader
    fn begin_load(&self, task: LoadTask);

    /// Undo [`ByteLoad::begin_load`] after the task could not start
    fn abort_load(&self);

    /// The background task, if one was dispatched
    fn task(&self) -> Option<LoadTask>;

    /// Check if the loader reached a terminal state
    fn is_loaded(&self) -> bool {
        self.state().is_loaded()
    }
}

/// A loader for one model type
pub struct ByteLoader<D: ModelDecoder> {
    name: String,
    bytes_file_name: String,
    decoder: D,
    state: StateCell,
    /// Set by the first `run_load`; later calls return immediately
    started: AtomicBool,
    bytes: Mutex<Option<Vec<u8>>>,
    result: Mutex<Option<Arc<D::Model>>>,
    failure: Mutex<Option<String>>,
    task: Mutex<Option<LoadTask>>,
}

impl<D: ModelDecoder> ByteLoader<D> {
    /// Create a loader
    pub fn new(name: impl Into<String>, bytes_file_name: impl Into<String>, decoder: D) -> Self {
        Self {
            name: name.into(),
            bytes_file_name: bytes_file_name.into(),
            decoder,
            state: StateCell::new(),
            started: AtomicBool::new(false),
            bytes: Mutex::new(None),
            result: Mutex::new(None),
            failure: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Create a loader wrapped in an `Arc`, ready for registration
    pub fn shared(name: impl Into<String>, bytes_file_name: impl Into<String>, decoder: D) -> Arc<Self> {
        Arc::new(Self::new(name, bytes_file_name, decoder))
    }

    /// Provide bytes directly instead of looking them up
    pub fn set_bytes(&self, bytes: Vec<u8>) {
        if self.state.get() == LoadState::Pending {
            *self.bytes.lock() = Some(bytes);
        } else {
            log::warn!("{} already started loading, ignoring new bytes", self.name);
        }
    }

    /// Size of the held bytes, if any
    pub fn bytes_len(&self) -> Option<usize> {
        self.bytes.lock().as_ref().map(Vec::len)
    }

    /// Failure message of a failed load
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    /// Gets the result of the loader, waiting for loading to finish if need be.
    ///
    /// Returns `None` if the load failed. A loader that was never dispatched
    /// returns its current (empty) result without blocking.
    pub fn load_result(&self) -> Option<Arc<D::Model>> {
        if let Some(task) = self.task() {
            task.wait();
        }
        self.result.lock().clone()
    }

    /// Like [`ByteLoader::load_result`] but gives up after `timeout`
    pub fn load_result_timeout(&self, timeout: Duration) -> Option<Arc<D::Model>> {
        if let Some(task) = self.task() {
            if !task.wait_timeout(timeout) {
                return None;
            }
        }
        self.result.lock().clone()
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<D::Model, String> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = DecodeContext::new(&self.name, bytes);
            self.decoder.decode(&mut ctx)
        }));

        match outcome {
            Ok(Ok(model)) => Ok(model),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

impl<D: ModelDecoder> ByteLoad for ByteLoader<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_file_name(&self) -> &str {
        &self.bytes_file_name
    }

    fn state(&self) -> LoadState {
        self.state.get()
    }

    fn has_bytes(&self) -> bool {
        self.bytes.lock().is_some()
    }

    fn acquire_bytes(&self, source: &dyn ResourceSource, matching: ResourceMatch) -> Result<usize> {
        let resource = source::find_resource(source, &self.bytes_file_name, matching)?;
        let data = source::read_resource(source, &resource)?;
        let len = data.len();

        log::debug!("{} acquired {} bytes from '{}'", self.name, len, resource);
        self.set_bytes(data);
        Ok(len)
    }

    fn run_load(&self) {
        if self.state.get().is_loaded() || self.started.swap(true, Ordering::AcqRel) {
            log::debug!("{} is already {}, not loading again", self.name, self.state.get());
            return;
        }
        if !self.state.transition(LoadState::Loading) {
            return;
        }

        let bytes = self.bytes.lock().take();
        let outcome = match bytes {
            Some(bytes) => self.decode(&bytes),
            None => Err("no bytes to load".to_string()),
        };

        match outcome {
            Ok(model) => {
                *self.result.lock() = Some(Arc::new(model));
                log::info!("{} finished loading bytes", self.name);
                self.state.transition(LoadState::Succeeded);
            }
            Err(e) => {
                log::error!("{} failed loading bytes: {}", self.name, e);
                *self.failure.lock() = Some(e);
                self.state.transition(LoadState::Failed);
            }
        }
    }

    fn fail(&self, reason: String) {
        self.bytes.lock().take();
        *self.failure.lock() = Some(reason);
        self.state.transition(LoadState::Failed);
    }

    fn begin_load(&self, task: LoadTask) {
        *self.task.lock() = Some(task);
        self.state.transition(LoadState::Loading);
    }

    fn abort_load(&self) {
        self.task.lock().take();
        if self.state.get() == LoadState::Loading {
            self.state.transition(LoadState::Pending);
        }
    }

    fn task(&self) -> Option<LoadTask> {
        self.task.lock().clone()
    }
}

impl<D: ModelDecoder> std::fmt::Debug for ByteLoader<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteLoader")
            .field("name", &self.name)
            .field("bytes_file_name", &self.bytes_file_name)
            .field("state", &self.state.get())
            .field("bytes", &self.bytes_len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
