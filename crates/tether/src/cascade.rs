//! Cascade planning
//!
//! Before a disappear animation starts, the leader/subordinate tree below the
//! vanishing element is walked once and flattened into a [`CascadePlan`]. The
//! plan is immutable; the engine turns it into an animator set.
//!
//! The walk is depth-first and pre-order. Each element's own cascade setting
//! decides how its direct subordinates take part:
//!
//! - `Simultaneous`: the subordinate joins the timeline that is current at
//!   that point of the walk ([`CascadeStep::Join`])
//! - `Trailing`: the subordinate gets its own animator, chained after
//!   everything planned so far ([`CascadeStep::Follow`])
//!
//! A subordinate that is not visible on screen is skipped but its own
//! subordinates are still visited.

use rustc_hash::FxHashSet;
use tether_core::{Picture, Rect};

use crate::config::CascadeMode;
use crate::registry::{ElementId, HierarchyRegistry};

/// Snapshot drawn under the frames of earlier animators
#[derive(Clone, Debug)]
pub struct Placeholder {
    pub rect: Rect,
    pub picture: Picture,
}

#[derive(Clone, Debug)]
pub enum CascadeStep {
    /// Add `rect` as another destination of the current timeline
    Join { element: ElementId, rect: Rect },
    /// Play `frames` into `rect` after the current timeline ends
    Follow {
        element: ElementId,
        rect: Rect,
        frames: Vec<String>,
        duration_ms: u32,
        placeholder: Option<Placeholder>,
    },
}

impl CascadeStep {
    pub fn element(&self) -> ElementId {
        match self {
            CascadeStep::Join { element, .. } | CascadeStep::Follow { element, .. } => *element,
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            CascadeStep::Join { rect, .. } | CascadeStep::Follow { rect, .. } => *rect,
        }
    }
}

/// Ordered cascade below one vanishing element
#[derive(Clone, Debug, Default)]
pub struct CascadePlan {
    steps: Vec<CascadeStep>,
}

impl CascadePlan {
    pub fn steps(&self) -> &[CascadeStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<CascadeStep> {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Elements in playback order
    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.steps.iter().map(CascadeStep::element)
    }
}

/// Cascade mode for the subordinates of `id`, if it cascades at all
fn cascade_mode(registry: &HierarchyRegistry, id: ElementId) -> Option<CascadeMode> {
    let config = registry.config(id)?;
    let marked = registry.mark(id).map(|m| !m.is_empty()).unwrap_or(false);
    (config.cascade.enabled && marked).then_some(config.cascade.mode)
}

/// Walk the subordinates of `root`
pub fn plan_cascade(registry: &HierarchyRegistry, root: ElementId) -> CascadePlan {
    let mut plan = CascadePlan::default();
    let mut visited = FxHashSet::default();
    visited.insert(root);

    let mut stack: Vec<(ElementId, CascadeMode)> = Vec::new();
    push_children(registry, root, &mut stack);

    while let Some((id, mode)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(step) = plan_step(registry, id, mode) {
            tracing::trace!(element = ?id, ?mode, "cascade: planned");
            plan.steps.push(step);
        }
        push_children(registry, id, &mut stack);
    }

    tracing::debug!(root = ?root, steps = plan.steps.len(), "cascade: plan built");
    plan
}

fn push_children(
    registry: &HierarchyRegistry,
    id: ElementId,
    stack: &mut Vec<(ElementId, CascadeMode)>,
) {
    let Some(mode) = cascade_mode(registry, id) else {
        return;
    };
    // Reversed so the lowest sort is popped first
    for child in registry.sorted_subordinates(id).into_iter().rev() {
        stack.push((child, mode));
    }
}

fn plan_step(registry: &HierarchyRegistry, id: ElementId, mode: CascadeMode) -> Option<CascadeStep> {
    let host = registry.host(id)?;
    let config = registry.config(id)?;
    host.visible_rect()?;

    let screen = host.screen_rect();
    let rect = Rect::square(screen.center(), config.disappear.size);
    match mode {
        CascadeMode::Simultaneous => Some(CascadeStep::Join { element: id, rect }),
        CascadeMode::Trailing => {
            if !config.disappear.is_usable() {
                return None;
            }
            let placeholder = host.visible_snapshot().map(|picture| Placeholder {
                rect: screen,
                picture,
            });
            Some(CascadeStep::Follow {
                element: id,
                rect,
                frames: config.disappear.frames.clone(),
                duration_ms: config.disappear.duration_ms,
                placeholder,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DragConfig;
    use crate::headless::HeadlessElement;
    use crate::host::{HostElement, ScopeId};
    use std::rc::{Rc, Weak};

    const SCOPE: ScopeId = ScopeId(1);

    fn frames() -> Vec<String> {
        vec!["a.png".into(), "b.png".into()]
    }

    fn add(
        registry: &mut HierarchyRegistry,
        hosts: &mut Vec<Rc<HeadlessElement>>,
        x: f32,
        config: DragConfig,
    ) -> ElementId {
        let host = HeadlessElement::shared(Rect::new(x, 0.0, 20.0, 20.0));
        let id = registry
            .insert(SCOPE, Rc::downgrade(&host) as Weak<dyn HostElement>, config)
            .unwrap();
        hosts.push(host);
        id
    }

    #[test]
    fn test_trailing_follows_sort_order() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let root = add(
            &mut registry,
            &mut hosts,
            0.0,
            DragConfig::default()
                .with_mark("root")
                .with_cascade(CascadeMode::Trailing)
                .with_disappear(frames(), 300, 40.0),
        );
        let subs: Vec<_> = [2, 0, 1]
            .iter()
            .enumerate()
            .map(|(i, sort)| {
                add(
                    &mut registry,
                    &mut hosts,
                    100.0 * (i + 1) as f32,
                    DragConfig::default()
                        .with_leader_mark("root")
                        .with_sort(*sort)
                        .with_disappear(frames(), 300, 40.0),
                )
            })
            .collect();

        let plan = plan_cascade(&registry, root);
        assert_eq!(plan.elements().collect::<Vec<_>>(), vec![subs[1], subs[2], subs[0]]);
        assert!(plan
            .steps()
            .iter()
            .all(|s| matches!(s, CascadeStep::Follow { placeholder: Some(_), .. })));
        assert_eq!(plan.steps()[0].rect(), Rect::square(tether_core::Point::new(210.0, 10.0), 40.0));
    }

    #[test]
    fn test_simultaneous_joins_current_timeline() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let root = add(
            &mut registry,
            &mut hosts,
            0.0,
            DragConfig::default().with_mark("root").with_cascade(CascadeMode::Simultaneous),
        );
        for i in 0..3 {
            add(
                &mut registry,
                &mut hosts,
                50.0 * i as f32,
                DragConfig::default().with_leader_mark("root"),
            );
        }

        let plan = plan_cascade(&registry, root);
        assert_eq!(plan.len(), 3);
        assert!(plan.steps().iter().all(|s| matches!(s, CascadeStep::Join { .. })));
    }

    #[test]
    fn test_hidden_subordinate_is_skipped_but_visited() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let root = add(
            &mut registry,
            &mut hosts,
            0.0,
            DragConfig::default().with_mark("root").with_cascade(CascadeMode::Simultaneous),
        );
        let hidden = add(
            &mut registry,
            &mut hosts,
            50.0,
            DragConfig::default()
                .with_mark("mid")
                .with_leader_mark("root")
                .with_cascade(CascadeMode::Simultaneous),
        );
        let leaf = add(
            &mut registry,
            &mut hosts,
            100.0,
            DragConfig::default().with_leader_mark("mid"),
        );
        hosts[1].set_on_screen(false);

        let plan = plan_cascade(&registry, root);
        let elements: Vec<_> = plan.elements().collect();
        assert!(!elements.contains(&hidden));
        assert_eq!(elements, vec![leaf]);
    }

    #[test]
    fn test_depth_first_pre_order() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let trailing = |config: DragConfig| {
            config
                .with_cascade(CascadeMode::Trailing)
                .with_disappear(frames(), 100, 40.0)
        };
        let root = add(&mut registry, &mut hosts, 0.0, trailing(DragConfig::default().with_mark("r")));
        let a = add(
            &mut registry,
            &mut hosts,
            10.0,
            trailing(DragConfig::default().with_mark("a").with_leader_mark("r").with_sort(0)),
        );
        let b = add(
            &mut registry,
            &mut hosts,
            20.0,
            trailing(DragConfig::default().with_leader_mark("r").with_sort(1)),
        );
        let a1 = add(
            &mut registry,
            &mut hosts,
            30.0,
            trailing(DragConfig::default().with_leader_mark("a")),
        );

        let plan = plan_cascade(&registry, root);
        assert_eq!(plan.elements().collect::<Vec<_>>(), vec![a, a1, b]);
    }

    #[test]
    fn test_disabled_cascade_is_empty() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let root = add(&mut registry, &mut hosts, 0.0, DragConfig::default().with_mark("root"));
        add(
            &mut registry,
            &mut hosts,
            50.0,
            DragConfig::default().with_leader_mark("root"),
        );

        assert!(plan_cascade(&registry, root).is_empty());
    }

    #[test]
    fn test_trailing_without_frames_is_skipped() {
        let mut registry = HierarchyRegistry::new();
        let mut hosts = Vec::new();
        let root = add(
            &mut registry,
            &mut hosts,
            0.0,
            DragConfig::default().with_mark("root").with_cascade(CascadeMode::Trailing),
        );
        add(
            &mut registry,
            &mut hosts,
            50.0,
            DragConfig::default().with_leader_mark("root"),
        );

        assert!(plan_cascade(&registry, root).is_empty());
    }
}
