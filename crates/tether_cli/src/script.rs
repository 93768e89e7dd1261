//! Gesture scripts
//!
//! A script places elements on a headless window and lists the pointer
//! events and clock waits to replay:
//!
//! ```toml
//! [window]
//! size = { width = 1080.0, height = 1920.0 }
//!
//! [[elements]]
//! name = "inbox"
//! preset = "inbox"
//! center = { x = 100.0, y = 100.0 }
//!
//! [[steps]]
//! action = "down"
//! element = "inbox"
//! x = 100.0
//! y = 100.0
//!
//! [[steps]]
//! action = "settle"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tether_core::{Point, Size};

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub window: WindowSpec,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    /// Screen position of the window root
    pub origin: Point,
    pub size: Size,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            size: Size::new(1080.0, 1920.0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ElementSpec {
    pub name: String,
    /// Preset from the config file; the config defaults when absent
    #[serde(default)]
    pub preset: Option<String>,
    pub center: Point,
    #[serde(default = "default_element_size")]
    pub size: Size,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub scope: u64,
}

fn default_element_size() -> Size {
    Size::new(24.0, 24.0)
}

fn default_visible() -> bool {
    true
}

/// One scripted event
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Down { element: String, x: f32, y: f32 },
    Move { element: String, x: f32, y: f32 },
    Up { element: String, x: f32, y: f32 },
    Cancel { element: String },
    /// Play the disappear animation without a gesture
    Disappear { element: String },
    /// Cancel the element's running animation
    Stop { element: String },
    /// Take the element off screen
    Hide { element: String },
    /// Advance the clock
    Wait { ms: u32 },
    /// Advance the clock until no animation is running
    Settle,
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Down { .. } => "down",
            Step::Move { .. } => "move",
            Step::Up { .. } => "up",
            Step::Cancel { .. } => "cancel",
            Step::Disappear { .. } => "disappear",
            Step::Stop { .. } => "stop",
            Step::Hide { .. } => "hide",
            Step::Wait { .. } => "wait",
            Step::Settle => "settle",
        }
    }

    pub fn element(&self) -> Option<&str> {
        match self {
            Step::Down { element, .. }
            | Step::Move { element, .. }
            | Step::Up { element, .. }
            | Step::Cancel { element }
            | Step::Disappear { element }
            | Step::Stop { element }
            | Step::Hide { element } => Some(element.as_str()),
            Step::Wait { .. } | Step::Settle => None,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script: Script = toml::from_str(&content)
            .with_context(|| format!("Failed to parse script {}", path.display()))?;
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script: Script = toml::from_str(
            r#"
            [[elements]]
            name = "badge"
            center = { x = 10.0, y = 20.0 }

            [[steps]]
            action = "down"
            element = "badge"
            x = 10.0
            y = 20.0

            [[steps]]
            action = "wait"
            ms = 100

            [[steps]]
            action = "settle"
            "#,
        )
        .unwrap();

        assert_eq!(script.elements.len(), 1);
        assert!(script.elements[0].visible);
        assert_eq!(script.elements[0].size, Size::new(24.0, 24.0));
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0].element(), Some("badge"));
        assert!(matches!(script.steps[1], Step::Wait { ms: 100 }));
        assert_eq!(script.steps[2].action(), "settle");
        assert_eq!(script.window.size, Size::new(1080.0, 1920.0));
    }
}
