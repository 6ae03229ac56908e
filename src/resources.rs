//! Name-keyed resource cache
//!
//! Entities acquire their rendering/audio handles once, at construction.
//! A handle stays loaded while any holder keeps it alive and is released
//! when the last holder drops it. The simulation never looks inside.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use log::debug;
use thiserror::Error;

use crate::tuning::{ConfigError, Tuning};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("unknown resource `{0}`")]
    Unknown(String),
}

/// Opaque shared handle
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    name: String,
    /// Increments every time a name is (re)loaded
    generation: u32,
}

impl ResourceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct CacheState {
    known: BTreeSet<String>,
    live: HashMap<String, Weak<ResourceHandle>>,
    loads: u32,
}

/// Cheap to clone; clones share one cache
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    state: Rc<RefCell<CacheState>>,
}

impl ResourceCache {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = CacheState {
            known: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Known names come from the `resources` list
    pub fn from_tuning(tuning: &Tuning) -> Result<Self, ConfigError> {
        Ok(Self::new(tuning.strings_at("resources")?))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.borrow().known.contains(name)
    }

    /// Shared handle for `name`, loading it if no holder is alive
    pub fn acquire(&self, name: &str) -> Result<Rc<ResourceHandle>, ResourceError> {
        let mut state = self.state.borrow_mut();
        if !state.known.contains(name) {
            return Err(ResourceError::Unknown(name.to_owned()));
        }
        if let Some(handle) = state.live.get(name).and_then(Weak::upgrade) {
            return Ok(handle);
        }

        state.loads += 1;
        let handle = Rc::new(ResourceHandle {
            name: name.to_owned(),
            generation: state.loads,
        });
        debug!("resource `{name}` loaded (generation {})", handle.generation);
        state.live.insert(name.to_owned(), Rc::downgrade(&handle));
        Ok(handle)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state
            .borrow()
            .live
            .get(name)
            .is_some_and(|h| h.strong_count() > 0)
    }

    /// Number of names currently held by at least one owner
    pub fn live_count(&self) -> usize {
        self.state
            .borrow()
            .live
            .values()
            .filter(|h| h.strong_count() > 0)
            .count()
    }

    pub fn load_count(&self) -> u32 {
        self.state.borrow().loads
    }

    /// Forget released entries; returns how many were dropped
    pub fn purge(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.live.len();
        state.live.retain(|_, h| h.strong_count() > 0);
        before - state.live.len()
    }
}
