/// What one processed frame tells the learner. `reward` is `None` while the
/// game is outside active play.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub reward: Option<f64>,
    pub terminal: bool,
}

impl Observation {
    pub fn none() -> Observation {
        Observation {
            reward: None,
            terminal: false,
        }
    }

    pub fn reward(reward: f64, terminal: bool) -> Observation {
        Observation {
            reward: Some(reward),
            terminal,
        }
    }

    pub fn is_observed(&self) -> bool {
        self.reward.is_some()
    }
}

/// Countdown that throttles full state re-detection to once per `interval`
/// processed frames. Starts expired.
#[derive(Clone, Debug)]
pub struct Refresh {
    remaining: i64,
    interval: i64,
}

impl Refresh {
    pub fn new(interval: u32) -> Refresh {
        Refresh {
            remaining: 0,
            interval: interval.max(1) as i64,
        }
    }

    /// Counts one frame; true when the state should be re-detected now.
    pub fn tick(&mut self) -> bool {
        self.remaining -= 1;
        if self.remaining <= 0 {
            self.remaining = self.interval;
            return true;
        }
        false
    }
}

/// Holds back repeated rewards while one scoring banner stays on screen.
#[derive(Clone, Debug, Default)]
pub struct PauseLatch {
    paused: bool,
}

impl PauseLatch {
    /// The reward to emit for a scoring frame, or `None` if this event was
    /// already counted.
    pub fn score(&mut self, reward: f64) -> Observation {
        if self.paused {
            return Observation::none();
        }
        self.paused = true;
        Observation::reward(reward, true)
    }

    pub fn clear(&mut self) {
        self.paused = false;
    }
}
