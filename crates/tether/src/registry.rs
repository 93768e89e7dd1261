//! Hierarchy registry
//!
//! Elements live in a slot map and are referred to by [`ElementId`]. Host
//! elements are held weakly: once the host drops its element the entry is
//! treated as dead and is pruned the next time a lookup runs into it.
//!
//! Marks name elements within a [`ScopeId`]. An element whose leader mark
//! resolves to another element is one of that element's subordinates; the
//! leader keeps the subordinates in join order and hands them over when its
//! mark is reassigned.

use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::config::DragConfig;
use crate::error::{DragError, Result};
use crate::host::{HostElement, ScopeId};

new_key_type! {
    /// Handle to a registered element
    pub struct ElementId;
}

struct Entry {
    scope: ScopeId,
    host: Weak<dyn HostElement>,
    /// `mark` and `leader_mark` reflect the registry state, not the
    /// configuration the element was registered with
    config: DragConfig,
    subordinates: Vec<ElementId>,
}

/// Mark table and leader/subordinate relationships
#[derive(Default)]
pub struct HierarchyRegistry {
    elements: SlotMap<ElementId, Entry>,
    marks: FxHashMap<(ScopeId, String), ElementId>,
}

impl HierarchyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element
    ///
    /// Fails on an invalid configuration or a leader mark that does not
    /// resolve; nothing is registered in that case.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        host: Weak<dyn HostElement>,
        mut config: DragConfig,
    ) -> Result<ElementId> {
        config.validate()?;
        let mark = config.mark.take();
        let leader = config.leader_mark.take();

        // Checked before any mark changes hands
        if let Some(leader) = &leader {
            if mark.as_deref() == Some(leader.as_str()) {
                return Err(DragError::SelfLeadership(leader.clone()));
            }
            if self.resolve(scope, leader).is_none() {
                return Err(DragError::LeaderNotFound(leader.clone()));
            }
        }

        let id = self.elements.insert(Entry {
            scope,
            host,
            config,
            subordinates: Vec::new(),
        });
        if mark.is_some() {
            self.set_mark(id, mark)?;
        }
        if leader.is_some() {
            self.set_leader_mark(id, leader)?;
        }
        tracing::debug!(?id, ?scope, "HierarchyRegistry: registered");
        Ok(id)
    }

    /// Unregister an element, releasing its mark and leaving its leader
    pub fn remove(&mut self, id: ElementId) -> bool {
        if let Some(leader) = self.leader_of(id) {
            if let Some(entry) = self.elements.get_mut(leader) {
                entry.subordinates.retain(|s| *s != id);
            }
        }
        let Some(entry) = self.elements.remove(id) else {
            return false;
        };
        if let Some(mark) = entry.config.mark {
            let key = (entry.scope, mark);
            if self.marks.get(&key) == Some(&id) {
                self.marks.remove(&key);
            }
        }
        tracing::debug!(?id, "HierarchyRegistry: removed");
        true
    }

    /// Registered and its host element still exists
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.elements
            .get(id)
            .map(|entry| entry.host.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Look up a mark, pruning it if its holder is gone
    pub fn resolve(&mut self, scope: ScopeId, mark: &str) -> Option<ElementId> {
        let key = (scope, mark.to_owned());
        let id = *self.marks.get(&key)?;
        if self.is_alive(id) {
            return Some(id);
        }
        tracing::trace!(mark, "HierarchyRegistry: pruning dead mark");
        self.marks.remove(&key);
        None
    }

    fn lookup(&self, scope: ScopeId, mark: &str) -> Option<ElementId> {
        let id = *self.marks.get(&(scope, mark.to_owned()))?;
        self.is_alive(id).then_some(id)
    }

    /// Assign or clear an element's mark
    ///
    /// The element's own subordinates are dropped. If another live element
    /// held the mark, its subordinates are handed over and it loses the mark.
    pub fn set_mark(&mut self, id: ElementId, mark: Option<String>) -> Result<()> {
        let entry = self
            .elements
            .get_mut(id)
            .ok_or(DragError::UnknownElement(id))?;
        if entry.config.mark == mark {
            return Ok(());
        }
        let scope = entry.scope;
        entry.subordinates.clear();
        if let Some(old) = entry.config.mark.take() {
            let key = (scope, old);
            if self.marks.get(&key) == Some(&id) {
                self.marks.remove(&key);
            }
        }

        let Some(mark) = mark else {
            return Ok(());
        };
        let mut inherited = Vec::new();
        if let Some(previous) = self.resolve(scope, &mark) {
            if previous != id {
                if let Some(holder) = self.elements.get_mut(previous) {
                    inherited = std::mem::take(&mut holder.subordinates);
                    holder.config.mark = None;
                }
                tracing::debug!(
                    mark = %mark,
                    from = ?previous,
                    to = ?id,
                    count = inherited.len(),
                    "HierarchyRegistry: handing over subordinates"
                );
            }
        }
        inherited.retain(|s| *s != id);

        self.marks.insert((scope, mark.clone()), id);
        if let Some(entry) = self.elements.get_mut(id) {
            entry.config.mark = Some(mark);
            entry.subordinates = inherited;
        }
        Ok(())
    }

    /// Follow the element marked `leader`, or stop following with `None`
    ///
    /// The new leader must already be registered in the same scope.
    pub fn set_leader_mark(&mut self, id: ElementId, leader: Option<String>) -> Result<()> {
        let entry = self.elements.get(id).ok_or(DragError::UnknownElement(id))?;
        let scope = entry.scope;

        let new_leader = match &leader {
            Some(mark) => {
                if entry.config.mark.as_deref() == Some(mark.as_str()) {
                    return Err(DragError::SelfLeadership(mark.clone()));
                }
                let leader_id = self
                    .resolve(scope, mark)
                    .ok_or_else(|| DragError::LeaderNotFound(mark.clone()))?;
                if leader_id == id {
                    return Err(DragError::SelfLeadership(mark.clone()));
                }
                Some(leader_id)
            }
            None => None,
        };

        if let Some(old) = self.leader_of(id) {
            if let Some(entry) = self.elements.get_mut(old) {
                entry.subordinates.retain(|s| *s != id);
            }
        }

        if let Some(leader_id) = new_leader {
            let mut subordinates = self
                .elements
                .get(leader_id)
                .map(|entry| entry.subordinates.clone())
                .unwrap_or_default();
            subordinates.retain(|s| *s != id && self.is_alive(*s));
            subordinates.push(id);
            if let Some(entry) = self.elements.get_mut(leader_id) {
                entry.subordinates = subordinates;
            }
        }

        if let Some(entry) = self.elements.get_mut(id) {
            entry.config.leader_mark = leader;
        }
        Ok(())
    }

    /// Change the element's position among its siblings
    pub fn set_sort(&mut self, id: ElementId, sort: i32) -> Result<()> {
        if sort < 0 {
            return Err(DragError::NegativeSort(sort));
        }
        let entry = self
            .elements
            .get_mut(id)
            .ok_or(DragError::UnknownElement(id))?;
        entry.config.sort = sort;
        Ok(())
    }

    /// The live leader this element follows
    pub fn leader_of(&self, id: ElementId) -> Option<ElementId> {
        let entry = self.elements.get(id)?;
        let mark = entry.config.leader_mark.as_deref()?;
        self.lookup(entry.scope, mark)
    }

    /// Subordinates in join order, dead ones included
    pub fn subordinates(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map(|entry| entry.subordinates.as_slice())
            .unwrap_or(&[])
    }

    /// Live subordinates ordered by `sort`, ties kept in join order
    pub fn sorted_subordinates(&self, id: ElementId) -> Vec<ElementId> {
        let mut live: Vec<ElementId> = self
            .subordinates(id)
            .iter()
            .copied()
            .filter(|s| self.is_alive(*s))
            .collect();
        live.sort_by_key(|s| self.elements.get(*s).map(|e| e.config.sort).unwrap_or(0));
        live
    }

    pub fn host(&self, id: ElementId) -> Option<Rc<dyn HostElement>> {
        self.elements.get(id)?.host.upgrade()
    }

    pub fn config(&self, id: ElementId) -> Option<&DragConfig> {
        self.elements.get(id).map(|entry| &entry.config)
    }

    pub fn mark(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id)?.config.mark.as_deref()
    }

    pub fn scope(&self, id: ElementId) -> Option<ScopeId> {
        self.elements.get(id).map(|entry| entry.scope)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl std::fmt::Debug for HierarchyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyRegistry")
            .field("elements", &self.elements.len())
            .field("marks", &self.marks.len())
            .finish()
    }
}
