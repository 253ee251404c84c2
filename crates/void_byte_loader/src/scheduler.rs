//! Byte load scheduler
//!
//! Call [`ByteLoadScheduler::advance`] once per tick. Loaders are decoded
//! strictly one after another in registration order, each on its own
//! background thread, so at most one load is in flight at any time. The tick
//! never blocks: while a load is running it returns immediately.

use std::thread;
use std::time::Duration;

use crate::config::ByteLoadConfig;
use crate::registry::LoaderRegistry;
use crate::task::LoadTask;

/// Outcome of one scheduler tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Everything already loaded, nothing checked
    Idle,
    /// A load is still in flight
    Busy,
    /// A new load was started for the named loader
    Dispatched(String),
    /// Loaders remain pending but none holds bytes to load
    Stalled { pending: usize },
    /// No loader remains pending
    AllLoaded,
}

/// Scheduler state
pub struct ByteLoadScheduler {
    config: ByteLoadConfig,
    all_loaded: bool,
    current_task: Option<LoadTask>,
    dispatched: usize,
}

impl ByteLoadScheduler {
    /// Create a scheduler
    pub fn new(config: ByteLoadConfig) -> Self {
        Self {
            config,
            all_loaded: false,
            current_task: None,
            dispatched: 0,
        }
    }

    /// Whether every loader has finished. Never resets once set.
    pub fn all_loaded(&self) -> bool {
        self.all_loaded
    }

    /// The most recently dispatched task
    pub fn current_task(&self) -> Option<&LoadTask> {
        self.current_task.as_ref()
    }

    /// Number of loads started so far
    pub fn dispatched_count(&self) -> usize {
        self.dispatched
    }

    /// Check whether a dispatched load has not completed yet
    pub fn is_busy(&self) -> bool {
        self.current_task.as_ref().is_some_and(|task| !task.is_completed())
    }

    /// Advance the load sequence by at most one loader
    pub fn advance(&mut self, registry: &LoaderRegistry) -> Tick {
        if self.all_loaded && !self.config.recheck_after_all_loaded {
            return Tick::Idle;
        }

        if self.is_busy() {
            return Tick::Busy;
        }

        let Some(loader) = registry.next_eligible() else {
            let pending = registry.pending_count();
            if pending == 0 {
                if !self.all_loaded {
                    log::info!("All {} byte loaders finished", registry.len());
                }
                self.all_loaded = true;
                return Tick::AllLoaded;
            }
            return Tick::Stalled { pending };
        };

        let task = LoadTask::new(loader.name());
        loader.begin_load(task.clone());

        let worker = loader.clone();
        if let Err(e) = task.start(&self.config.thread_name, move || worker.run_load()) {
            log::error!("{}", e);
            loader.abort_load();
            return Tick::Busy;
        }

        log::debug!("Dispatched byte loader {}", loader.name());
        self.current_task = Some(task);
        self.dispatched += 1;
        Tick::Dispatched(loader.name().to_string())
    }

    /// Tick until the sequence settles (all loaded, idle or stalled),
    /// sleeping `poll_interval` between ticks while a load is running.
    pub fn run_until_settled(&mut self, registry: &LoaderRegistry, poll_interval: Duration) -> Tick {
        loop {
            match self.advance(registry) {
                Tick::Busy => thread::sleep(poll_interval),
                Tick::Dispatched(_) => {}
                settled => return settled,
            }
        }
    }
}

impl Default for ByteLoadScheduler {
    fn default() -> Self {
        Self::new(ByteLoadConfig::default())
    }
}
