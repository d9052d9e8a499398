use anyhow::Result;
use clap::ArgEnum;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    automation::Automation, explore::Policy, img::frame::Frame, landmark::Landmark,
    state::Observation,
};

pub mod coin_getter;
pub mod homerun;

#[derive(ArgEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SupportedGames {
    Homerun,
    CoinGetter,
}

/// Knobs shared by every game.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Processed frames between full state re-detections.
    pub adjust_interval: u32,
    /// Multiplier on every settle delay; 0 disables sleeping.
    pub delay_scale: f64,
    pub policy: Policy,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            adjust_interval: 200,
            delay_scale: 1.0,
            policy: Policy::Walk,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn rng(&self, stream: u64) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(stream)),
            None => SmallRng::from_os_rng(),
        }
    }
}

/// One automated game: a state machine over pixel evidence plus an action table.
pub trait Game {
    fn name(&self) -> &'static str;

    /// Templates this game needs loaded.
    fn landmarks(&self) -> &'static [Landmark];

    /// Width and height of the game window.
    fn window_size(&self) -> (i32, i32);

    /// Landmarks that pin down the window, with their offset from its origin,
    /// tried in order.
    fn anchors(&self) -> &'static [(Landmark, i32, i32)];

    fn reads_numbers(&self) -> bool {
        false
    }

    fn state_name(&self) -> &'static str;

    /// Finds the game window on screen and moves it there.
    fn detect_position(&mut self, automation: &mut Automation, frame: &Frame) -> Option<(i32, i32)> {
        for (landmark, offset_x, offset_y) in self.anchors() {
            if let Some(found) = automation.locate_on_screen(frame, *landmark) {
                let x = found.x - offset_x;
                let y = found.y - offset_y;
                automation.set_position(x, y);
                return Some((x, y));
            }
        }
        None
    }

    fn process(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation>;

    fn action_size(&self) -> usize;

    fn play(&mut self, automation: &mut Automation, action: usize) -> Result<()>;

    /// Lets go of any key or button `play` left pressed.
    fn release(&mut self, automation: &mut Automation) -> Result<()>;
}

pub fn new(game: SupportedGames, config: &GameConfig) -> Box<dyn Game> {
    match game {
        SupportedGames::Homerun => Box::new(homerun::new(config)),
        SupportedGames::CoinGetter => Box::new(coin_getter::new(config)),
    }
}
