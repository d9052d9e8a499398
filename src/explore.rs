use clap::ArgEnum;
use rand::Rng;

/// How `randomize_action` injects exploration noise.
#[derive(ArgEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Independent per frame: with probability p, any action.
    Uniform,
    /// Occasional runs of correlated actions drifting around a random position.
    Walk,
}

/// Chance divisor for starting a walk: a run starts with probability p / 15.
const WALK_TRIGGER_SCALE: f64 = 15.;
const WALK_MAX_RUN: u32 = 29;
const WALK_MAX_STEP: i64 = 5;

/// Exploration state carried across frames. Action tables are laid out as
/// `position * 2 + button`, so a walk perturbs the position and flips a coin
/// for the button.
#[derive(Clone, Debug)]
pub struct Exploration {
    policy: Policy,
    position: i64,
    remaining: u32,
}

impl Exploration {
    pub fn new(policy: Policy) -> Exploration {
        Exploration {
            policy,
            position: 0,
            remaining: 0,
        }
    }

    /// Frames left in the current walk.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Starts a walk of `run` frames at `position`.
    pub fn trigger(&mut self, position: i64, run: u32) {
        self.position = position;
        self.remaining += run;
    }

    pub fn randomize<R: Rng>(
        &mut self,
        action: usize,
        action_size: usize,
        probability: f64,
        rng: &mut R,
    ) -> usize {
        if action_size == 0 {
            return action;
        }

        match self.policy {
            Policy::Uniform => {
                if rng.random::<f64>() < probability {
                    return rng.random_range(0..action_size);
                }
                action
            }
            Policy::Walk => self.walk(action, action_size, probability, rng),
        }
    }

    fn walk<R: Rng>(
        &mut self,
        action: usize,
        action_size: usize,
        probability: f64,
        rng: &mut R,
    ) -> usize {
        let positions = (action_size / 2) as i64;
        if positions == 0 {
            return action;
        }

        if rng.random::<f64>() * WALK_TRIGGER_SCALE < probability {
            let run = rng.random_range(1..=WALK_MAX_RUN);
            let start = rng.random_range(0..positions);
            trace!("exploration walk of {} frames from {}", run, start);
            self.trigger(start, run);
        }

        if self.remaining == 0 {
            return action;
        }

        self.remaining -= 1;
        let position = self.position.clamp(0, positions - 1);
        let button = rng.random_range(0..2);
        self.position += rng.random_range(-WALK_MAX_STEP..=WALK_MAX_STEP);

        (position * 2 + button) as usize
    }
}
