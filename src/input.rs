use std::fmt;

use anyhow::{anyhow, Result};
use rustautogui::{MouseClick, RustAutoGui};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Right,
    Down,
    Left,
}

impl Key {
    pub fn name(&self) -> &'static str {
        match self {
            Key::Up => "up",
            Key::Right => "right",
            Key::Down => "down",
            Key::Left => "left",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Synthetic mouse and keyboard. Coordinates are absolute screen pixels.
pub trait InputDevice {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn button(&mut self, direction: Direction) -> Result<()>;
    fn click(&mut self) -> Result<()>;
    fn key(&mut self, key: Key, direction: Direction) -> Result<()>;
}

pub struct AutoGuiInput {
    gui: RustAutoGui,
}

pub fn new() -> Result<AutoGuiInput> {
    let gui = RustAutoGui::new(false).map_err(|e| anyhow!("initializing input: {:?}", e))?;

    Ok(AutoGuiInput { gui })
}

impl InputDevice for AutoGuiInput {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.gui
            .move_mouse_to_pos(x.max(0) as u32, y.max(0) as u32, 0.0)
            .map_err(|e| anyhow!("moving pointer to {},{}: {:?}", x, y, e))
    }

    fn button(&mut self, direction: Direction) -> Result<()> {
        let result = match direction {
            Direction::Down => self.gui.click_down(MouseClick::LEFT),
            Direction::Up => self.gui.click_up(MouseClick::LEFT),
        };

        result.map_err(|e| anyhow!("mouse button {:?}: {:?}", direction, e))
    }

    fn click(&mut self) -> Result<()> {
        self.gui
            .left_click()
            .map_err(|e| anyhow!("clicking: {:?}", e))
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<()> {
        let result = match direction {
            Direction::Down => self.gui.key_down(key.name()),
            Direction::Up => self.gui.key_up(key.name()),
        };

        result.map_err(|e| anyhow!("key {} {:?}: {:?}", key, direction, e))
    }
}
