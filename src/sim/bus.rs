//! Synchronous publish/subscribe dispatcher
//!
//! `publish` runs every subscriber's handler to completion, in subscription
//! order, before returning, and hands all of them the same param bag so
//! later recipients see earlier recipients' writes.
//!
//! Dispatch iterates over a snapshot of the subscriber list, so handlers may
//! subscribe, unsubscribe and publish freely:
//! - a subscriber added mid-dispatch joins from the next publish
//! - an unsubscribed entity is never invoked again, even later in the
//!   publish that removed it
//! - a nested publish reaches everyone except the entities whose handlers
//!   are still on the call stack (they are mutably borrowed)

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Weak;

use log::trace;

use super::entity::{Context, Entity, EntityHandle};
use super::message::Message;
use super::params::Params;

/// Ticket returned by [`MessageBus::subscribe`]
///
/// Ids only grow, so the subscriber list stays sorted by subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

#[derive(Default)]
pub struct MessageBus {
    subscribers: RefCell<Vec<(Subscription, Weak<RefCell<dyn Entity>>)>>,
    next: Cell<u64>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bus holds the entity weakly; its owner keeps it alive
    pub fn subscribe(&self, entity: &EntityHandle) -> Subscription {
        let sub = Subscription(self.next.get());
        self.next.set(sub.0 + 1);
        self.subscribers.borrow_mut().push((sub, entity.downgrade()));
        sub
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, sub: Subscription) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers.binary_search_by_key(&sub, |(s, _)| *s) {
            Ok(index) => {
                subscribers.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn is_subscribed(&self, sub: Subscription) -> bool {
        self.subscribers
            .borrow()
            .binary_search_by_key(&sub, |(s, _)| *s)
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Invoke every subscriber once, in subscription order
    pub fn publish(&self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        let snapshot: Vec<_> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(sub, entity)| (*sub, entity.clone()))
            .collect();

        let mut dead = false;
        for (sub, weak) in snapshot {
            if !self.is_subscribed(sub) {
                continue;
            }
            let Some(entity) = weak.upgrade() else {
                dead = true;
                continue;
            };
            let handle = EntityHandle::new(entity);
            if !handle.send(msg, params, ctx) {
                trace!("{msg:?}: skipping subscriber {sub:?} already in a handler");
            }
        }

        if dead {
            self.subscribers
                .borrow_mut()
                .retain(|(_, entity)| entity.strong_count() > 0);
        }
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("subscribers", &self.len())
            .field("next", &self.next.get())
            .finish()
    }
}
