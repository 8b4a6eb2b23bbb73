//! Scoped event subscriptions.
//!
//! A picker that opens asks the shared [`ListenerRegistry`] for the listeners
//! it needs and keeps the returned [`Subscription`]. Dropping the subscription
//! releases every listener it holds, so closing by any path (selection,
//! dismissal, external change, or dropping the picker) leaves nothing behind.
//! The host event loop asks the registry who is listening before routing an
//! event.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Pointer presses anywhere on screen.
    OutsidePointer,
    /// The cancellation key.
    CancelKey,
    /// Viewport resize, scroll at any level, trigger size change.
    LayoutChange,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [
        ListenerKind::OutsidePointer,
        ListenerKind::CancelKey,
        ListenerKind::LayoutChange,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub acquired: usize,
    pub released: usize,
}

#[derive(Debug)]
struct Entry {
    id: u64,
    owner: OwnerId,
    kind: ListenerKind,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: Vec<Entry>,
    next_id: u64,
    next_owner: u32,
    stats: ListenerStats,
}

/// Shared, single-threaded table of live listeners.
#[derive(Clone, Debug, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_owner(&self) -> OwnerId {
        let mut inner = self.inner.borrow_mut();
        let owner = OwnerId(inner.next_owner);
        inner.next_owner += 1;
        owner
    }

    pub fn subscribe(&self, owner: OwnerId, kinds: &[ListenerKind]) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let mut ids = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry { id, owner, kind });
            inner.stats.acquired += 1;
            ids.push(id);
        }
        Subscription {
            registry: self.clone(),
            ids,
        }
    }

    fn release(&self, ids: &[u64]) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| !ids.contains(&e.id));
        let removed = before - inner.entries.len();
        inner.stats.released += removed;
    }

    pub fn is_listening(&self, owner: OwnerId, kind: ListenerKind) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|e| e.owner == owner && e.kind == kind)
    }

    /// Owners currently listening for `kind`, in subscription order.
    pub fn listeners_for(&self, kind: ListenerKind) -> Vec<OwnerId> {
        let inner = self.inner.borrow();
        let mut owners: Vec<OwnerId> = Vec::new();
        for e in inner.entries.iter().filter(|e| e.kind == kind) {
            if !owners.contains(&e.owner) {
                owners.push(e.owner);
            }
        }
        owners
    }

    pub fn active_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn stats(&self) -> ListenerStats {
        self.inner.borrow().stats
    }
}

/// Listeners held by one owner. Released on drop.
#[derive(Debug)]
pub struct Subscription {
    registry: ListenerRegistry,
    ids: Vec<u64>,
}

impl Subscription {
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(&self.ids);
    }
}
