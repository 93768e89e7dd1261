//! Draggable element configuration
//!
//! Configs are plain serde structs so hosts can keep them in TOML next to
//! their other assets:
//!
//! ```toml
//! [defaults]
//! max_distance = 200.0
//! recoverable_distance = 120.0
//! link_color = 0xFF3B30
//!
//! [defaults.disappear]
//! frames = ["pop_0.png", "pop_1.png", "pop_2.png"]
//! duration_ms = 300
//! size = 48.0
//!
//! [[presets]]
//! name = "inbox"
//! mark = "inbox"
//! cascade = { enabled = true, mode = "trailing" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tether_core::{Color, Size};

use crate::error::{DragError, Result};

/// Shatter frame sequence played when an element vanishes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisappearConfig {
    /// Frame names, resolved by the engine's frame loader
    pub frames: Vec<String>,
    /// Total playback time
    pub duration_ms: u32,
    /// Side of the square the frames are drawn into
    pub size: f32,
}

impl Default for DisappearConfig {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            duration_ms: 300,
            size: 48.0,
        }
    }
}

impl DisappearConfig {
    /// Whether a disappear animation can be built from this config
    pub fn is_usable(&self) -> bool {
        !self.frames.is_empty() && self.duration_ms > 0 && self.size > 0.0
    }
}

/// Damped return to the anchor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingConfig {
    pub duration_ms: u32,
    /// Number of overshoots before settling
    pub bounce_count: u32,
}

impl Default for DampingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            bounce_count: 2,
        }
    }
}

impl DampingConfig {
    pub fn is_usable(&self) -> bool {
        self.duration_ms > 0 && self.bounce_count > 0
    }
}

/// How subordinates vanish together with their leader
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// All subordinates share the leader's frame pass
    #[default]
    Simultaneous,
    /// Subordinates vanish one after another, in sort order
    Trailing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub enabled: bool,
    pub mode: CascadeMode,
}

/// Per-element drag configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub drag_enabled: bool,
    /// Distance past which the link snaps
    pub max_distance: f32,
    /// Anchor radius at `max_distance`; derived from `max_radius` when unset
    pub min_radius: Option<f32>,
    /// Anchor radius at rest; half the element's smaller side when unset
    pub max_radius: Option<f32>,
    /// Releases closer than this (after snapping) restore the element
    pub recoverable_distance: f32,
    pub link_color: Color,
    pub disappear: DisappearConfig,
    pub damping: DampingConfig,
    pub cascade: CascadeConfig,
    pub mark: Option<String>,
    pub leader_mark: Option<String>,
    pub sort: i32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            drag_enabled: true,
            max_distance: 200.0,
            min_radius: None,
            max_radius: None,
            recoverable_distance: 120.0,
            link_color: Color::from_hex(0xFF3B30),
            disappear: DisappearConfig::default(),
            damping: DampingConfig::default(),
            cascade: CascadeConfig::default(),
            mark: None,
            leader_mark: None,
            sort: 0,
        }
    }
}

/// Calibrated thresholds for one drag gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragParams {
    pub max_distance: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub recoverable_distance: f32,
}

impl DragConfig {
    /// Reject configuration mistakes
    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.min_radius {
            if value <= 0.0 {
                return Err(DragError::InvalidRadius {
                    name: "min_radius",
                    value,
                });
            }
        }
        if let Some(value) = self.max_radius {
            if value <= 0.0 {
                return Err(DragError::InvalidRadius {
                    name: "max_radius",
                    value,
                });
            }
        }
        if !(self.max_distance > 0.0) {
            return Err(DragError::InvalidDistance {
                name: "max_distance",
                value: self.max_distance,
            });
        }
        if self.recoverable_distance < 0.0 {
            return Err(DragError::InvalidDistance {
                name: "recoverable_distance",
                value: self.recoverable_distance,
            });
        }
        if self.sort < 0 {
            return Err(DragError::NegativeSort(self.sort));
        }
        Ok(())
    }

    /// Resolve the thresholds for an element of the given size
    ///
    /// - `max_radius` defaults to half the smaller side
    /// - `min_radius` falls back to 40% of `max_radius` when unset or not smaller
    /// - `recoverable_distance` never exceeds `max_distance`
    ///
    /// With `max_radius` unset an empty `element` yields zero radii;
    /// [`DragEngine::pointer_down`](crate::DragEngine::pointer_down) never
    /// starts a drag for one.
    pub fn drag_params(&self, element: Size) -> DragParams {
        let max_radius = self
            .max_radius
            .unwrap_or_else(|| element.width.min(element.height).max(0.0) / 2.0);
        let min_radius = match self.min_radius {
            Some(min) if min < max_radius => min,
            _ => max_radius * 0.4,
        };
        DragParams {
            max_distance: self.max_distance,
            min_radius,
            max_radius,
            recoverable_distance: self.recoverable_distance.min(self.max_distance),
        }
    }

    pub fn with_mark(mut self, mark: impl Into<String>) -> Self {
        self.mark = Some(mark.into());
        self
    }

    pub fn with_leader_mark(mut self, leader: impl Into<String>) -> Self {
        self.leader_mark = Some(leader.into());
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_cascade(mut self, mode: CascadeMode) -> Self {
        self.cascade = CascadeConfig {
            enabled: true,
            mode,
        };
        self
    }

    pub fn with_disappear(mut self, frames: Vec<String>, duration_ms: u32, size: f32) -> Self {
        self.disappear = DisappearConfig {
            frames,
            duration_ms,
            size,
        };
        self
    }

    pub fn with_damping(mut self, duration_ms: u32, bounce_count: u32) -> Self {
        self.damping = DampingConfig {
            duration_ms,
            bounce_count,
        };
        self
    }

    pub fn with_radii(mut self, min_radius: f32, max_radius: f32) -> Self {
        self.min_radius = Some(min_radius);
        self.max_radius = Some(max_radius);
        self
    }

    pub fn with_distances(mut self, max_distance: f32, recoverable_distance: f32) -> Self {
        self.max_distance = max_distance;
        self.recoverable_distance = recoverable_distance;
        self
    }
}

/// A named element configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementPreset {
    pub name: String,
    #[serde(flatten)]
    pub config: DragConfig,
}

/// File-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Directory frame names are resolved against
    pub frames_dir: Option<PathBuf>,
    /// Config for elements without a preset
    pub defaults: DragConfig,
    pub presets: Vec<ElementPreset>,
}

impl TetherConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TetherConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&source)?;
        // Relative frame directories are relative to the config file
        if let (Some(dir), Some(parent)) = (config.frames_dir.as_ref(), path.parent()) {
            if dir.is_relative() {
                config.frames_dir = Some(parent.join(dir));
            }
        }
        tracing::debug!(path = %path.display(), presets = config.presets.len(), "TetherConfig: loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.defaults.validate()?;
        for preset in &self.presets {
            preset.config.validate()?;
        }
        Ok(())
    }

    /// Config for a named preset, falling back to the defaults
    pub fn element(&self, name: &str) -> &DragConfig {
        self.preset(name).unwrap_or(&self.defaults)
    }

    pub fn preset(&self, name: &str) -> Option<&DragConfig> {
        self.presets
            .iter()
            .find(|preset| preset.name == name)
            .map(|preset| &preset.config)
    }
}
