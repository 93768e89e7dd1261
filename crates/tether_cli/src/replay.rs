//! Headless replay of a gesture script

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tether::headless::{HeadlessElement, HeadlessWindow};
use tether::{DragEngine, ElementId, HostElement, ScopeId, TetherConfig};
use tether_core::{DrawCommand, Point, Rect};
use tether_image::{FileFrameLoader, FrameLoader, ImageData, MemoryFrameLoader};

use crate::script::{Script, Step};

/// Upper bound for `settle`, in frames
const MAX_SETTLE_FRAMES: u32 = 10_000;

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub element: Option<String>,
    /// The engine accepted the event
    pub accepted: bool,
    pub state: Option<String>,
    pub frames_posted: usize,
    pub images_drawn: usize,
    pub clock_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ElementReport {
    pub name: String,
    pub state: String,
    pub content_visible: bool,
    pub drag_completes: u32,
    pub disappear_completes: u32,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub elements: Vec<ElementReport>,
    pub total_frames: usize,
    pub frame_decodes: u64,
}

struct Element {
    name: String,
    id: ElementId,
    host: Rc<HeadlessElement>,
}

/// Frame loader for a config: its frame directory, or solid placeholder
/// frames when there is none (or `synthetic` is set)
pub fn frame_loader(config: &TetherConfig, synthetic: bool) -> Box<dyn FrameLoader> {
    match (&config.frames_dir, synthetic) {
        (Some(dir), false) => Box::new(FileFrameLoader::new(dir.clone())),
        _ => {
            let mut loader = MemoryFrameLoader::new();
            for name in frame_names(config) {
                loader.insert(name, ImageData::solid(16, 16, [255, 59, 48, 255]));
            }
            Box::new(loader)
        }
    }
}

fn frame_names(config: &TetherConfig) -> Vec<String> {
    let mut names = config.defaults.disappear.frames.clone();
    for preset in &config.presets {
        for frame in &preset.config.disappear.frames {
            if !names.contains(frame) {
                names.push(frame.clone());
            }
        }
    }
    names
}

pub struct Replay {
    engine: DragEngine,
    window: HeadlessWindow,
    elements: Vec<Element>,
    frame: Duration,
    clock: Duration,
}

impl Replay {
    pub fn new(
        config: &TetherConfig,
        script: &Script,
        loader: Box<dyn FrameLoader>,
        fps: u32,
    ) -> Result<Self> {
        let window = HeadlessWindow::new(1)
            .with_origin(script.window.origin)
            .with_size(script.window.size);
        let mut engine = DragEngine::new(move |frame: &str| loader.load(frame));
        engine.scheduler_mut().set_target_fps(fps.max(1));
        let frame = engine.scheduler().frame_duration();

        let mut elements = Vec::new();
        for spec in &script.elements {
            let drag_config = match &spec.preset {
                Some(preset) => config
                    .preset(preset)
                    .ok_or_else(|| anyhow!("Unknown preset '{}' for element '{}'", preset, spec.name))?,
                None => &config.defaults,
            };
            let host = HeadlessElement::shared(Rect::from_center(spec.center, spec.size));
            host.set_on_screen(spec.visible);
            let id = engine
                .register(
                    ScopeId(spec.scope),
                    Rc::downgrade(&host) as Weak<dyn HostElement>,
                    drag_config.clone(),
                )
                .with_context(|| format!("Failed to register element '{}'", spec.name))?;
            elements.push(Element {
                name: spec.name.clone(),
                id,
                host,
            });
        }

        Ok(Self {
            engine,
            window,
            elements,
            frame,
            clock: Duration::ZERO,
        })
    }

    fn element(&self, name: &str) -> Result<&Element> {
        self.elements
            .iter()
            .find(|element| element.name == name)
            .ok_or_else(|| anyhow!("Unknown element '{}'", name))
    }

    fn advance(&mut self) -> bool {
        self.clock += self.frame;
        self.engine.advance(self.frame)
    }

    /// The host makes the overlay surface ready as soon as it is attached
    fn ready_surface(&mut self) {
        self.engine.notify_surface_created();
        self.engine.notify_surface_changed(self.window.size());
    }

    fn apply(&mut self, step: &Step) -> Result<bool> {
        let accepted = match step {
            Step::Down { element, x, y } => {
                let id = self.element(element)?.id;
                let accepted = self.engine.pointer_down(id, &self.window, Point::new(*x, *y));
                if accepted {
                    self.ready_surface();
                }
                accepted
            }
            Step::Move { element, x, y } => {
                let id = self.element(element)?.id;
                self.engine.pointer_move(id, Point::new(*x, *y))
            }
            Step::Up { element, x, y } => {
                let id = self.element(element)?.id;
                self.engine.pointer_up(id, Point::new(*x, *y))
            }
            Step::Cancel { element } => {
                let id = self.element(element)?.id;
                self.engine.pointer_cancel(id)
            }
            Step::Disappear { element } => {
                let id = self.element(element)?.id;
                let accepted = self.engine.play_disappear(id, &self.window);
                if accepted {
                    self.ready_surface();
                }
                accepted
            }
            Step::Stop { element } => {
                let id = self.element(element)?.id;
                self.engine.cancel_animation(id)
            }
            Step::Hide { element } => {
                self.element(element)?.host.set_on_screen(false);
                true
            }
            Step::Wait { ms } => {
                let frames = (Duration::from_millis(u64::from(*ms)).as_secs_f64()
                    / self.frame.as_secs_f64())
                .ceil() as u32;
                for _ in 0..frames {
                    self.advance();
                }
                true
            }
            Step::Settle => {
                let mut frames = 0;
                while self.advance() {
                    frames += 1;
                    if frames >= MAX_SETTLE_FRAMES {
                        tracing::warn!(frames, "settle: animation still running, giving up");
                        return Ok(false);
                    }
                }
                true
            }
        };
        Ok(accepted)
    }

    /// Replay every step of `script`
    pub fn run(mut self, script: &Script) -> Result<Report> {
        let mut steps = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let before = self.window.frame_count();
            let accepted = self
                .apply(step)
                .with_context(|| format!("Step {} ({})", index, step.action()))?;
            let posted = self.window.frames().split_off(before);
            let images_drawn = posted
                .iter()
                .flatten()
                .filter(|command| matches!(command, DrawCommand::DrawImage { .. }))
                .count();
            let state = step
                .element()
                .and_then(|name| self.element(name).ok())
                .map(|element| format!("{:?}", self.engine.state(element.id)));
            tracing::debug!(index, action = step.action(), accepted, "step applied");

            steps.push(StepReport {
                index,
                action: step.action(),
                element: step.element().map(str::to_owned),
                accepted,
                state,
                frames_posted: posted.len(),
                images_drawn,
                clock_ms: self.clock.as_millis() as u64,
            });
        }

        let elements = self
            .elements
            .iter()
            .map(|element| ElementReport {
                name: element.name.clone(),
                state: format!("{:?}", self.engine.state(element.id)),
                content_visible: element.host.is_content_visible(),
                drag_completes: element.host.drag_completes(),
                disappear_completes: element.host.disappear_completes(),
            })
            .collect();

        Ok(Report {
            steps,
            elements,
            total_frames: self.window.frame_count(),
            frame_decodes: self.engine.cache().decode_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [defaults]
        max_distance = 200.0
        recoverable_distance = 150.0
        min_radius = 10.0
        max_radius = 50.0

        [defaults.disappear]
        frames = ["pop_0", "pop_1", "pop_2"]
        duration_ms = 90
        size = 40.0

        [[presets]]
        name = "inbox"
        mark = "inbox"
        cascade = { enabled = true, mode = "trailing" }

        [presets.disappear]
        frames = ["pop_0", "pop_1", "pop_2"]
        duration_ms = 90
        size = 40.0

        [[presets]]
        name = "mail"
        leader_mark = "inbox"
    "#;

    const SCRIPT: &str = r#"
        [[elements]]
        name = "inbox"
        preset = "inbox"
        center = { x = 100.0, y = 100.0 }

        [[elements]]
        name = "mail"
        preset = "mail"
        center = { x = 300.0, y = 400.0 }

        [[steps]]
        action = "down"
        element = "inbox"
        x = 100.0
        y = 100.0

        [[steps]]
        action = "move"
        element = "inbox"
        x = 320.0
        y = 100.0

        [[steps]]
        action = "up"
        element = "inbox"
        x = 350.0
        y = 100.0

        [[steps]]
        action = "settle"
    "#;

    #[test]
    fn test_replay_vanish_with_cascade() {
        let config = TetherConfig::from_toml_str(CONFIG).unwrap();
        let script: Script = toml::from_str(SCRIPT).unwrap();
        let loader = frame_loader(&config, false);
        let report = Replay::new(&config, &script, loader, 60)
            .unwrap()
            .run(&script)
            .unwrap();

        assert!(report.steps.iter().all(|step| step.accepted));
        assert_eq!(report.steps[2].state.as_deref(), Some("Vanishing"));
        assert_eq!(report.steps[3].state, None);
        assert!(report.steps[3].images_drawn > 0);

        let inbox = &report.elements[0];
        assert_eq!(inbox.state, "Idle");
        assert_eq!(inbox.drag_completes, 1);
        assert_eq!(inbox.disappear_completes, 1);
        assert_eq!(report.elements[1].disappear_completes, 1);
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let config = TetherConfig::default();
        let script: Script = toml::from_str(
            r#"
            [[elements]]
            name = "x"
            preset = "missing"
            center = { x = 0.0, y = 0.0 }
            "#,
        )
        .unwrap();
        let loader = frame_loader(&config, true);
        assert!(Replay::new(&config, &script, loader, 60).is_err());
    }
}
