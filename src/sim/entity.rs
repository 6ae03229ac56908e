//! Entity contract and the context threaded through every handler

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bus::MessageBus;
use super::message::Message;
use super::params::Params;

/// Unique per-world entity id, allocated in spawn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A simulated object
///
/// Deactivation is cooperative: once `is_active` returns false the entity
/// is dropped at the next compaction, but it still receives the rest of the
/// current tick's broadcasts.
pub trait Entity {
    fn is_active(&self) -> bool;

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>);

    /// Short kind name for logs and poses
    fn kind(&self) -> &'static str {
        "entity"
    }
}

/// Shared handle to an entity, used for direct (non-broadcast) messages
#[derive(Clone)]
pub struct EntityHandle(Rc<RefCell<dyn Entity>>);

impl EntityHandle {
    pub fn new(entity: Rc<RefCell<dyn Entity>>) -> Self {
        Self(entity)
    }

    /// Deliver `msg` to this entity only
    ///
    /// An entity already executing a handler further up the call stack
    /// cannot be re-entered; it is skipped and `false` is returned.
    pub fn send(&self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) -> bool {
        let Ok(mut entity) = self.0.try_borrow_mut() else {
            return false;
        };
        let previous = ctx.enter(self.clone());
        entity.handle_message(msg, params, ctx);
        ctx.leave(previous);
        true
    }

    /// Liveness; an entity in the middle of a handler counts as active
    pub fn is_active(&self) -> bool {
        self.0.try_borrow().map(|e| e.is_active()).unwrap_or(true)
    }

    pub fn ptr_eq(&self, other: &EntityHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<dyn Entity>> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn inner(&self) -> &Rc<RefCell<dyn Entity>> {
        &self.0
    }
}

impl<T: Entity + 'static> From<Rc<RefCell<T>>> for EntityHandle {
    fn from(entity: Rc<RefCell<T>>) -> Self {
        Self(entity)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(e) => write!(f, "EntityHandle({})", e.kind()),
            Err(_) => f.write_str("EntityHandle(<busy>)"),
        }
    }
}

/// Everything a handler may touch besides its own state and the bag
pub struct Context<'a> {
    pub bus: &'a MessageBus,
    /// World-owned RNG; the only randomness the simulation uses
    pub rng: &'a mut Pcg32,
    /// Frame number of the tick being processed
    pub frame: u64,
    /// Entity whose handler is currently running
    current: Option<EntityHandle>,
}

impl<'a> Context<'a> {
    pub fn new(bus: &'a MessageBus, rng: &'a mut Pcg32, frame: u64) -> Self {
        Self {
            bus,
            rng,
            frame,
            current: None,
        }
    }

    /// Broadcast from inside a handler
    pub fn publish(&mut self, msg: Message, params: &mut Params) {
        let bus = self.bus;
        bus.publish(msg, params, self);
    }

    /// Handle of the entity whose handler is running, for descriptors
    pub fn me(&self) -> Option<EntityHandle> {
        self.current.clone()
    }

    pub(crate) fn enter(&mut self, handle: EntityHandle) -> Option<EntityHandle> {
        self.current.replace(handle)
    }

    pub(crate) fn leave(&mut self, previous: Option<EntityHandle>) {
        self.current = previous;
    }
}
