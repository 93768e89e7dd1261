//! Animator lifecycle listeners
//!
//! Listeners are shared (`Rc`) and identified by pointer, so the same
//! listener registered twice, or merged from several children into one
//! group, is only ever notified once per event.

use smallvec::SmallVec;
use std::rc::Rc;

/// Observer of an animator's lifecycle
///
/// All methods default to no-ops. `on_end` and `on_cancel` are exclusive:
/// an animator that is cancelled never reports `on_end`.
pub trait AnimatorListener {
    fn on_start(&self) {}
    fn on_end(&self) {}
    fn on_cancel(&self) {}
}

/// Deduplicated, ordered set of listeners
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: SmallVec<[Rc<dyn AnimatorListener>; 4]>,
}

fn same_listener(a: &Rc<dyn AnimatorListener>, b: &Rc<dyn AnimatorListener>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; returns `false` if it was already registered
    pub fn add(&mut self, listener: Rc<dyn AnimatorListener>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Remove a listener; returns `true` if it was registered
    pub fn remove(&mut self, listener: &Rc<dyn AnimatorListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        self.listeners.len() != before
    }

    pub fn contains(&self, listener: &Rc<dyn AnimatorListener>) -> bool {
        self.listeners.iter().any(|l| same_listener(l, listener))
    }

    /// Move every listener of `other` into this set, leaving `other` empty
    pub fn absorb(&mut self, other: &mut ListenerSet) {
        for listener in other.listeners.drain(..) {
            if !self.listeners.iter().any(|l| same_listener(l, &listener)) {
                self.listeners.push(listener);
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    // Listeners may mutate the owning animator's set while being notified,
    // so every emit iterates over a snapshot.

    pub fn emit_start(&self) {
        for listener in self.listeners.clone() {
            listener.on_start();
        }
    }

    pub fn emit_end(&self) {
        for listener in self.listeners.clone() {
            listener.on_end();
        }
    }

    pub fn emit_cancel(&self) {
        for listener in self.listeners.clone() {
            listener.on_cancel();
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        starts: Cell<u32>,
        ends: Cell<u32>,
        cancels: Cell<u32>,
    }

    impl AnimatorListener for Counter {
        fn on_start(&self) {
            self.starts.set(self.starts.get() + 1);
        }
        fn on_end(&self) {
            self.ends.set(self.ends.get() + 1);
        }
        fn on_cancel(&self) {
            self.cancels.set(self.cancels.get() + 1);
        }
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let counter = Rc::new(Counter::default());
        let mut set = ListenerSet::new();
        assert!(set.add(counter.clone()));
        assert!(!set.add(counter.clone()));

        set.emit_end();
        assert_eq!(counter.ends.get(), 1);
    }

    #[test]
    fn test_absorb_merges_without_duplicates() {
        let shared = Rc::new(Counter::default());
        let only_child = Rc::new(Counter::default());

        let mut group = ListenerSet::new();
        group.add(shared.clone());

        let mut child = ListenerSet::new();
        child.add(shared.clone());
        child.add(only_child.clone());

        group.absorb(&mut child);
        assert!(child.is_empty());
        assert_eq!(group.len(), 2);

        group.emit_start();
        group.emit_cancel();
        assert_eq!(shared.starts.get(), 1);
        assert_eq!(only_child.starts.get(), 1);
        assert_eq!(shared.cancels.get(), 1);
    }

    #[test]
    fn test_remove() {
        let counter: Rc<dyn AnimatorListener> = Rc::new(Counter::default());
        let mut set = ListenerSet::new();
        set.add(counter.clone());
        assert!(set.remove(&counter));
        assert!(!set.remove(&counter));
        assert!(set.is_empty());
    }
}
