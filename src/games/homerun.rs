use anyhow::Result;
use rand::{rngs::SmallRng, Rng};

use crate::{
    automation::Automation,
    games::{Game, GameConfig},
    img::frame::Frame,
    input::Direction,
    landmark::Landmark,
    roi::Region,
    state::{Observation, PauseLatch, Refresh},
};

const WIDTH: i32 = 600;
const HEIGHT: i32 = 450;

const START_AREA: Region = area(270, 240, 60, 40);
const SELECT_TITLE_AREA: Region = area(10, 16, 60, 40);
const SELECT_AREA: Region = area(460, 406, 60, 40);
const END_AREA: Region = area(278, 208, 28, 20);

/// Checked in order; the first banner on screen decides the reward.
const SCORING: [(Landmark, Region, f64); 4] = [
    (Landmark::Homerun, area(284, 187, 28, 20), 100.),
    (Landmark::Hit, area(284, 201, 28, 20), -80.),
    (Landmark::Foul, area(284, 207, 28, 20), -90.),
    (Landmark::Strike, area(284, 187, 28, 20), -100.),
];

const STAGE_SLOTS: i32 = 8;
/// Where the result screen's "select" button sits when it can't be matched.
const RESULT_FALLBACK: (i32, i32) = (410, 425);
/// Pointer height while batting.
const SWING_Y: i32 = 300;

const fn area(x: i32, y: i32, width: i32, height: i32) -> Region {
    Region {
        x,
        y,
        width,
        height,
    }
}

fn stage_area(slot: i32) -> Region {
    area(70 + slot % 4 * 130, 180 + slot / 4 * 170, 80, 20)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Title,
    Select,
    Play,
    Result,
}

/// Pointer position across the strike zone, normalized to [-1, 1], and the
/// button state to hold there.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Swing {
    pub pointer_x: f32,
    pub button: Direction,
}

impl Swing {
    pub fn screen_x(&self) -> i32 {
        ((self.pointer_x + 1.) * WIDTH as f32 / 2.).round() as i32
    }
}

fn swings() -> Vec<Swing> {
    (0..100)
        .step_by(3)
        .flat_map(|offset| {
            let pointer_x = (offset + 260) as f32 / WIDTH as f32 * 2. - 1.;
            [Direction::Down, Direction::Up]
                .into_iter()
                .map(move |button| Swing { pointer_x, button })
        })
        .collect()
}

/// Pooh's homerun derby: pick a stage, then swing at pitches.
pub struct Homerun {
    state: State,
    latch: PauseLatch,
    refresh: Refresh,
    actions: Vec<Swing>,
    rng: SmallRng,
}

pub fn new(config: &GameConfig) -> Homerun {
    Homerun {
        state: State::Title,
        latch: PauseLatch::default(),
        refresh: Refresh::new(config.adjust_interval),
        actions: swings(),
        rng: config.rng(0),
    }
}

impl Homerun {
    pub fn state(&self) -> State {
        self.state
    }

    pub fn swing(&self, action: usize) -> Option<Swing> {
        self.actions.get(action).copied()
    }

    fn enter(&mut self, next: State) {
        if self.state != next {
            debug!("homerun\t{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Re-derives the state from whichever screen landmark is showing.
    pub fn adjust_state(&mut self, automation: &mut Automation, frame: &Frame) -> Option<State> {
        let detected = if automation.visible(frame, Landmark::Start, START_AREA) {
            State::Title
        } else if automation.visible(frame, Landmark::SelectTitle, SELECT_TITLE_AREA) {
            State::Select
        } else if automation.visible(frame, Landmark::Select, SELECT_AREA) {
            State::Result
        } else {
            return None;
        };

        self.enter(detected);
        Some(detected)
    }

    fn process_title(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        automation.move_to(0, 0)?;
        automation.settle(100);

        if let Some((x, y)) = automation.locate_center(frame, Landmark::Start, START_AREA) {
            automation.click_at(x, y)?;
            automation.settle(3000);
        }

        if automation.visible(frame, Landmark::SelectTitle, SELECT_TITLE_AREA) {
            self.enter(State::Select);
        }

        Ok(Observation::none())
    }

    fn process_select(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        automation.move_to(0, 0)?;
        automation.settle(100);

        // slot 0 is always taken when reached; every later slot is a coin flip
        for slot in (0..STAGE_SLOTS).rev() {
            if let Some((x, y)) = automation.locate_center(frame, Landmark::Stage, stage_area(slot)) {
                if slot == 0 || self.rng.random_bool(0.5) {
                    debug!("homerun\tstage {}", slot);
                    automation.click_at(x, y + 10)?;
                    automation.settle(2000);
                    break;
                }
            }
        }

        if !automation.visible(frame, Landmark::SelectTitle, SELECT_TITLE_AREA) {
            self.enter(State::Play);
        }

        Ok(Observation::none())
    }

    fn process_play(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        if automation.visible(frame, Landmark::End, END_AREA) {
            automation.mouse_up()?;
            self.latch.clear();
            self.enter(State::Result);
            return Ok(Observation::reward(0., true));
        }

        for (landmark, region, reward) in SCORING {
            if automation.visible(frame, landmark, region) {
                let observation = self.latch.score(reward);
                if observation.is_observed() {
                    info!("homerun\t{}\treward {}", landmark, reward);
                }
                return Ok(observation);
            }
        }

        self.latch.clear();
        Ok(Observation::reward(0., false))
    }

    fn process_result(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        automation.move_to(0, 0)?;
        automation.settle(100);

        let (x, y) = automation
            .locate_center(frame, Landmark::Select, SELECT_AREA)
            .unwrap_or(RESULT_FALLBACK);
        automation.click_at(x, y)?;
        automation.settle(3000);

        if automation.visible(frame, Landmark::SelectTitle, SELECT_TITLE_AREA) {
            self.enter(State::Select);
        }

        Ok(Observation::none())
    }
}

impl Game for Homerun {
    fn name(&self) -> &'static str {
        "homerun"
    }

    fn landmarks(&self) -> &'static [Landmark] {
        &[
            Landmark::Start,
            Landmark::Stage,
            Landmark::SelectTitle,
            Landmark::Select,
            Landmark::End,
            Landmark::Homerun,
            Landmark::Hit,
            Landmark::Foul,
            Landmark::Strike,
        ]
    }

    fn window_size(&self) -> (i32, i32) {
        (WIDTH, HEIGHT)
    }

    fn anchors(&self) -> &'static [(Landmark, i32, i32)] {
        &[(Landmark::Start, 288, 252), (Landmark::SelectTitle, 28, 24)]
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Title => "title",
            State::Select => "select",
            State::Play => "play",
            State::Result => "result",
        }
    }

    fn process(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        if self.refresh.tick() {
            self.adjust_state(automation, frame);
        }

        match self.state {
            State::Title => self.process_title(automation, frame),
            State::Select => self.process_select(automation, frame),
            State::Play => self.process_play(automation, frame),
            State::Result => self.process_result(automation, frame),
        }
    }

    fn action_size(&self) -> usize {
        self.actions.len()
    }

    fn play(&mut self, automation: &mut Automation, action: usize) -> Result<()> {
        let swing = match self.swing(action) {
            Some(swing) => swing,
            None => anyhow::bail!("action {} outside 0..{}", action, self.actions.len()),
        };

        automation.move_to(swing.screen_x(), SWING_Y)?;
        match swing.button {
            Direction::Down => automation.mouse_down(),
            Direction::Up => automation.mouse_up(),
        }
    }

    fn release(&mut self, automation: &mut Automation) -> Result<()> {
        automation.mouse_up()
    }
}
