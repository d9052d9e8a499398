//! Scripted collaborators for exercising the games without a screen.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anyhow::Result;

use crate::{
    automation::{self, Automation},
    img::frame::Frame,
    input::{Direction, InputDevice, Key},
    landmark::Landmark,
    roi::{GameWindow, Region},
    vision::Vision,
};

/// What the fake screen currently shows, in screen coordinates.
#[derive(Default)]
pub struct Scene {
    landmarks: HashMap<Landmark, Region>,
    numbers: Vec<(Region, i64)>,
}

impl Scene {
    pub fn show(&mut self, landmark: Landmark, at: Region) {
        self.landmarks.insert(landmark, at);
    }

    pub fn clear(&mut self) {
        self.landmarks.clear();
        self.numbers.clear();
    }

    /// A number readable from any area starting inside `at`.
    pub fn print(&mut self, at: Region, value: i64) {
        self.numbers.retain(|(region, _)| *region != at);
        self.numbers.push((at, value));
    }
}

pub type SharedScene = Rc<RefCell<Scene>>;

pub struct ScriptedVision {
    scene: SharedScene,
}

impl Vision for ScriptedVision {
    fn locate(&mut self, _frame: &Frame, landmark: Landmark, area: Region) -> Option<Region> {
        let scene = self.scene.borrow();
        let at = scene.landmarks.get(&landmark)?;

        // blank frames have no size, so a whole-frame search spans everything
        if area.is_empty() || area.contains(at) {
            Some(*at)
        } else {
            None
        }
    }

    fn read_number(&mut self, _frame: &Frame, area: Region) -> Option<i64> {
        let scene = self.scene.borrow();

        scene
            .numbers
            .iter()
            .find(|(region, _)| region.contains(&Region { width: 0, height: 0, ..area }))
            .map(|(_, value)| *value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Move(i32, i32),
    Button(Direction),
    Click,
    Key(Key, Direction),
}

pub type SharedEvents = Rc<RefCell<Vec<InputEvent>>>;

pub struct RecordingInput {
    events: SharedEvents,
}

impl InputDevice for RecordingInput {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.events.borrow_mut().push(InputEvent::Move(x, y));
        Ok(())
    }

    fn button(&mut self, direction: Direction) -> Result<()> {
        self.events.borrow_mut().push(InputEvent::Button(direction));
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        self.events.borrow_mut().push(InputEvent::Click);
        Ok(())
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<()> {
        self.events.borrow_mut().push(InputEvent::Key(key, direction));
        Ok(())
    }
}

pub struct Harness {
    pub automation: Automation,
    pub scene: SharedScene,
    pub events: SharedEvents,
}

/// A scripted screen and a recording input device, with handles to drive
/// and inspect them.
pub fn collaborators() -> (ScriptedVision, RecordingInput, SharedScene, SharedEvents) {
    let scene = SharedScene::default();
    let events = SharedEvents::default();

    (
        ScriptedVision {
            scene: scene.clone(),
        },
        RecordingInput {
            events: events.clone(),
        },
        scene,
        events,
    )
}

/// An automation over a scripted screen that never sleeps, with the window
/// placed at `origin`.
pub fn harness(size: (i32, i32), origin: (i32, i32)) -> Harness {
    let (vision, input, scene, events) = collaborators();

    let mut window = GameWindow::new(size.0, size.1);
    window.set_position(origin.0, origin.1);

    Harness {
        automation: automation::new(window, Box::new(vision), Box::new(input), 0.0),
        scene,
        events,
    }
}

impl Harness {
    /// Shows `landmark` at a window-relative position.
    pub fn show(&self, landmark: Landmark, at: Region) {
        let screen = self.automation.window.to_screen(at);
        self.scene.borrow_mut().show(landmark, screen);
    }

    pub fn clear(&self) {
        self.scene.borrow_mut().clear();
    }

    pub fn take_events(&self) -> Vec<InputEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}
