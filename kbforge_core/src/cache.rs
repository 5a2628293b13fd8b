//! Lazily built, per-theme fact store cache.
//!
//! The slot moves between three states: absent, building and present. Only
//! one caller builds at a time; callers arriving while a build runs wait for
//! it and share its result. A failed build leaves the slot absent.

use std::sync::{Arc, Condvar, Mutex};

use crate::store::FactStore;

#[derive(Debug)]
enum Slot {
    Absent,
    Building,
    Present(Arc<FactStore>),
}

#[derive(Debug)]
struct State {
    slot: Slot,
    /// Bumped on every invalidation so a build started before it is discarded.
    generation: u64,
}

/// Error returned when the slot's lock was poisoned by a panicking builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poisoned;

#[derive(Debug)]
pub struct CacheSlot {
    state: Mutex<State>,
    ready: Condvar,
}

impl CacheSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Absent,
                generation: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Current generation. It changes on every invalidation.
    pub fn generation(&self) -> Result<u64, Poisoned> {
        Ok(self.state.lock().map_err(|_| Poisoned)?.generation)
    }

    /// Return the cached store, building it with `build` if absent.
    ///
    /// `generation` is the generation the caller saw when it picked what to
    /// build from. If the slot has been invalidated since, the store is built
    /// and returned but not cached.
    ///
    /// `build` runs without the lock held. Its error is handed back to the
    /// caller unchanged and the slot stays absent.
    pub fn get_or_build<E>(
        &self,
        generation: u64,
        build: impl FnOnce() -> Result<FactStore, E>,
    ) -> Result<Result<Arc<FactStore>, E>, Poisoned> {
        let mut state = self.state.lock().map_err(|_| Poisoned)?;
        loop {
            if state.generation != generation {
                drop(state);
                return Ok(build().map(Arc::new));
            }
            if let Slot::Present(store) = &state.slot {
                return Ok(Ok(Arc::clone(store)));
            }
            if matches!(state.slot, Slot::Absent) {
                break;
            }
            state = self.ready.wait(state).map_err(|_| Poisoned)?;
        }
        state.slot = Slot::Building;
        drop(state);

        let built = build();

        let mut state = self.state.lock().map_err(|_| Poisoned)?;
        let result = match built {
            Ok(store) => {
                let store = Arc::new(store);
                if state.generation == generation {
                    state.slot = Slot::Present(Arc::clone(&store));
                }
                Ok(store)
            }
            Err(e) => {
                if state.generation == generation {
                    state.slot = Slot::Absent;
                }
                Err(e)
            }
        };
        drop(state);
        self.ready.notify_all();
        Ok(result)
    }

    /// The cached store, if one is present.
    #[must_use]
    pub fn get(&self) -> Option<Arc<FactStore>> {
        match &self.state.lock().ok()?.slot {
            Slot::Present(store) => Some(Arc::clone(store)),
            Slot::Absent | Slot::Building => None,
        }
    }

    /// Drop the cached store. A build in flight finishes but is not kept.
    pub fn invalidate(&self) -> Result<(), Poisoned> {
        let mut state = self.state.lock().map_err(|_| Poisoned)?;
        state.slot = Slot::Absent;
        state.generation += 1;
        drop(state);
        self.ready.notify_all();
        Ok(())
    }
}

impl Default for CacheSlot {
    fn default() -> Self {
        Self::new()
    }
}
