//! Tether
//!
//! Drag-and-release engine for badge-like elements. While an element is
//! dragged, a single shared overlay draws a frozen copy of it (the ghost)
//! joined to its resting place by a shrinking rubber band. On release the
//! element springs back, or, if it was pulled far enough, vanishes with a
//! frame-sequence animation that can cascade to the elements that follow it.
//!
//! # Architecture
//!
//! - [`DragEngine`]: context object receiving the host's pointer events
//! - [`DragSession`]: geometry and release classification of one gesture
//! - [`OverlaySurface`] / [`OverlayCoordinator`]: the single render target and
//!   its ownership
//! - [`HierarchyRegistry`]: marks, leaders and subordinates
//! - [`plan_cascade`]: flattens a leader's subordinate tree before playback
//! - [`animation`]: damping, disappear and animator-set playback
//! - [`headless`]: in-memory host used by tests and `tether-sim`
//!
//! Everything runs on the host's UI thread: shared state is `Rc`/`RefCell`
//! and nothing here is `Send`.

pub mod animation;
pub mod cascade;
pub mod config;
pub mod coordinator;
pub mod element;
pub mod engine;
pub mod error;
pub mod headless;
pub mod host;
pub mod overlay;
pub mod registry;
pub mod session;


pub use cascade::{plan_cascade, CascadePlan, CascadeStep, Placeholder};
pub use config::{
    CascadeConfig, CascadeMode, DampingConfig, DisappearConfig, DragConfig, DragParams,
    ElementPreset, TetherConfig,
};
pub use coordinator::OverlayCoordinator;
pub use element::{DirtyFlag, GhostElement, LinkElement, VisualElement};
pub use engine::DragEngine;
pub use error::{DragError, Result};
pub use host::{HostElement, HostWindow, ScopeId, SurfaceCanvas, WindowId};
pub use overlay::{OverlayHandle, OverlaySurface};
pub use registry::{ElementId, HierarchyRegistry};
pub use session::{DragSession, DragUpdate, Release, ReleaseOutcome, SessionState};

pub use tether_core::{Color, Point, Rect, Size};
pub use tether_image::{FileFrameLoader, FrameCache, FrameLoader, MemoryFrameLoader};
