use std::{thread, time::Duration};

use anyhow::Result;

use crate::{
    img::frame::Frame,
    input::{Direction, InputDevice, Key},
    landmark::Landmark,
    roi::{GameWindow, Region},
    vision::Vision,
};

/// Everything a game needs to look at the screen and act on it, scoped to
/// the game window.
pub struct Automation {
    pub window: GameWindow,
    vision: Box<dyn Vision>,
    input: Box<dyn InputDevice>,
    delay_scale: f64,
}

pub fn new(
    window: GameWindow,
    vision: Box<dyn Vision>,
    input: Box<dyn InputDevice>,
    delay_scale: f64,
) -> Automation {
    Automation {
        window,
        vision,
        input,
        delay_scale,
    }
}

impl Automation {
    /// Searches a window-relative area; the match comes back window-relative.
    pub fn locate(&mut self, frame: &Frame, landmark: Landmark, area: Region) -> Option<Region> {
        let screen_area = self.window.to_screen(area);

        self.vision
            .locate(frame, landmark, screen_area)
            .map(|found| self.window.to_window(found))
    }

    pub fn locate_center(
        &mut self,
        frame: &Frame,
        landmark: Landmark,
        area: Region,
    ) -> Option<(i32, i32)> {
        self.locate(frame, landmark, area).map(|found| found.center())
    }

    pub fn visible(&mut self, frame: &Frame, landmark: Landmark, area: Region) -> bool {
        self.locate(frame, landmark, area).is_some()
    }

    /// Searches the whole window.
    pub fn locate_in_window(&mut self, frame: &Frame, landmark: Landmark) -> Option<Region> {
        let bounds = self.window.bounds();
        self.locate(frame, landmark, bounds)
    }

    /// Searches the whole frame; the match is in screen coordinates.
    pub fn locate_on_screen(&mut self, frame: &Frame, landmark: Landmark) -> Option<Region> {
        self.vision.locate(frame, landmark, frame.bounds())
    }

    /// Reads a number from a screen area.
    pub fn read_number(&mut self, frame: &Frame, area: Region) -> Option<i64> {
        self.vision.read_number(frame, area)
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        debug!("game window at {},{}", x, y);
        self.window.set_position(x, y);
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let (sx, sy) = self.window.point_to_screen(x, y);
        self.input.move_to(sx, sy)
    }

    pub fn click(&mut self) -> Result<()> {
        self.input.click()
    }

    /// Moves to a window-relative point, lets the game notice, then clicks.
    pub fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
        self.move_to(x, y)?;
        self.settle(100);
        self.click()
    }

    pub fn mouse_down(&mut self) -> Result<()> {
        self.input.button(Direction::Down)
    }

    pub fn mouse_up(&mut self) -> Result<()> {
        self.input.button(Direction::Up)
    }

    pub fn key(&mut self, key: Key, direction: Direction) -> Result<()> {
        self.input.key(key, direction)
    }

    /// Blocks for `millis`, scaled by the configured delay scale.
    pub fn settle(&self, millis: u64) {
        let scaled = (millis as f64 * self.delay_scale) as u64;
        if scaled > 0 {
            thread::sleep(Duration::from_millis(scaled));
        }
    }
}
