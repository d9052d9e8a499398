use anyhow::{bail, Result};

use crate::{
    automation::Automation,
    games::{Game, GameConfig},
    img::frame::Frame,
    input::{Direction, Key},
    landmark::Landmark,
    roi::new_region,
    state::{Observation, Refresh},
};

const WIDTH: i32 = 550;
const HEIGHT: i32 = 447;

/// One hold unit, in milliseconds.
const KEY_UNIT_MS: u64 = 500;
const KEYS: [Option<Key>; 5] = [None, Some(Key::Up), Some(Key::Right), Some(Key::Down), Some(Key::Left)];
const HOLD_UNITS: [u64; 2] = [1, 2];

/// Counters are printed right of their icon.
const COUNTER_OFFSET_X: i32 = 15;
const COUNTER_WIDTH: i32 = 45;
const COUNTER_HEIGHT: i32 = 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Title,
    Play,
    Result,
}

/// A key to hold (or none) and for how many units.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Press {
    pub key: Option<Key>,
    pub units: u64,
}

fn presses() -> Vec<Press> {
    KEYS.iter()
        .flat_map(|key| HOLD_UNITS.iter().map(move |units| Press { key: *key, units: *units }))
        .collect()
}

/// Coin Getter: steer through a maze collecting coins, level by level.
pub struct CoinGetter {
    state: State,
    refresh: Refresh,
    actions: Vec<Press>,
    held: Option<Key>,
    coins: Option<i64>,
    level: i64,
}

pub fn new(config: &GameConfig) -> CoinGetter {
    CoinGetter {
        state: State::Title,
        refresh: Refresh::new(config.adjust_interval),
        actions: presses(),
        held: None,
        coins: None,
        level: 1,
    }
}

impl CoinGetter {
    pub fn state(&self) -> State {
        self.state
    }

    pub fn press(&self, action: usize) -> Option<Press> {
        self.actions.get(action).copied()
    }

    pub fn held(&self) -> Option<Key> {
        self.held
    }

    fn enter(&mut self, next: State) {
        if self.state != next {
            debug!("coin getter\t{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn adjust_state(&mut self, automation: &mut Automation, frame: &Frame) -> Option<State> {
        let detected = if automation.locate_in_window(frame, Landmark::Start).is_some() {
            State::Title
        } else if automation.locate_in_window(frame, Landmark::Restart).is_some() {
            State::Result
        } else if automation.locate_in_window(frame, Landmark::LeftTop).is_some() {
            State::Play
        } else {
            return None;
        };

        self.enter(detected);
        Some(detected)
    }

    fn release_key(&mut self, automation: &mut Automation) -> Result<()> {
        if let Some(key) = self.held.take() {
            automation.key(key, Direction::Up)?;
        }
        Ok(())
    }

    /// Reads the counter printed next to `icon`, wherever it is on screen.
    fn read_counter(&self, automation: &mut Automation, frame: &Frame, icon: Landmark) -> Option<i64> {
        let found = automation.locate_on_screen(frame, icon)?;
        let area = new_region(
            found.x + COUNTER_OFFSET_X,
            found.y,
            COUNTER_WIDTH,
            COUNTER_HEIGHT,
        );

        automation.read_number(frame, area)
    }

    fn process_title(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        // focus the game before looking for the button
        automation.move_to(0, 0)?;
        automation.click()?;
        automation.settle(100);

        if let Some(found) = automation.locate_in_window(frame, Landmark::Start) {
            let (x, y) = found.center();
            automation.click_at(x, y)?;
            self.enter(State::Play);
        }

        Ok(Observation::none())
    }

    fn process_play(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        let over = automation.locate_in_window(frame, Landmark::GameOver).is_some()
            || automation.locate_in_window(frame, Landmark::Restart).is_some();
        if over {
            info!("coin getter\tgame over");
            automation.settle(5000);
            self.release_key(automation)?;
            self.coins = None;
            self.level = 1;
            self.enter(State::Result);
            return Ok(Observation::reward(-100., true));
        }

        if automation.locate_in_window(frame, Landmark::Levelup).is_some() {
            info!("coin getter\tlevel up");
            automation.settle(3000);
            self.release_key(automation)?;
            // the counter will show the new level; that is the same event
            self.level += 1;
            self.coins = None;
            self.enter(State::Result);
            return Ok(Observation::reward(1000., true));
        }

        if let Some(level) = self.read_counter(automation, frame, Landmark::Level) {
            if level != self.level {
                info!("coin getter\tlevel {} -> {}", self.level, level);
                self.level = level;
                return Ok(Observation::reward(1000., true));
            }
        }

        if let Some(coins) = self.read_counter(automation, frame, Landmark::Coin) {
            let changed = self.coins.map_or(false, |previous| previous != coins);
            self.coins = Some(coins);

            if changed {
                info!("coin getter\tcoins {}", coins);
                return Ok(Observation::reward(100., true));
            }
            return Ok(Observation::reward(-1., false));
        }

        Ok(Observation::reward(0., false))
    }

    fn process_result(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        automation.move_to(0, 0)?;
        automation.settle(100);

        if let Some(found) = automation.locate_in_window(frame, Landmark::Restart) {
            let (x, y) = found.center();
            automation.click_at(x, y)?;
            automation.move_to(0, 0)?;
            self.enter(State::Play);
        }

        Ok(Observation::none())
    }
}

impl Game for CoinGetter {
    fn name(&self) -> &'static str {
        "coin getter"
    }

    fn landmarks(&self) -> &'static [Landmark] {
        &[
            Landmark::Start,
            Landmark::Restart,
            Landmark::LeftTop,
            Landmark::Coin,
            Landmark::Title,
            Landmark::GameOver,
            Landmark::Levelup,
            Landmark::Level,
        ]
    }

    fn window_size(&self) -> (i32, i32) {
        (WIDTH, HEIGHT)
    }

    fn anchors(&self) -> &'static [(Landmark, i32, i32)] {
        &[(Landmark::LeftTop, 0, 0), (Landmark::Title, 153, 49)]
    }

    fn reads_numbers(&self) -> bool {
        true
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Title => "title",
            State::Play => "play",
            State::Result => "result",
        }
    }

    fn process(&mut self, automation: &mut Automation, frame: &Frame) -> Result<Observation> {
        if self.refresh.tick() {
            self.adjust_state(automation, frame);
        }

        if self.state != State::Play {
            self.release_key(automation)?;
        }

        match self.state {
            State::Title => self.process_title(automation, frame),
            State::Play => self.process_play(automation, frame),
            State::Result => self.process_result(automation, frame),
        }
    }

    fn action_size(&self) -> usize {
        self.actions.len()
    }

    fn play(&mut self, automation: &mut Automation, action: usize) -> Result<()> {
        let press = match self.press(action) {
            Some(press) => press,
            None => bail!("action {} outside 0..{}", action, self.actions.len()),
        };

        let key = match press.key {
            Some(key) => key,
            None => return self.release_key(automation),
        };

        if self.held != Some(key) {
            self.release_key(automation)?;
            automation.key(key, Direction::Down)?;
            self.held = Some(key);
        }

        trace!("coin getter\t{} for {} units", key, press.units);
        automation.settle(press.units * KEY_UNIT_MS);

        Ok(())
    }

    fn release(&mut self, automation: &mut Automation) -> Result<()> {
        self.release_key(automation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::Region;
    use crate::testing::{harness, Harness, InputEvent};

    const ORIGIN: (i32, i32) = (40, 30);
    const COIN_ICON: Region = Region {
        x: 400,
        y: 10,
        width: 12,
        height: 12,
    };
    const LEVEL_ICON: Region = Region {
        x: 200,
        y: 10,
        width: 12,
        height: 12,
    };

    fn setup() -> (CoinGetter, Harness) {
        (
            new(&GameConfig::default()),
            harness((WIDTH, HEIGHT), ORIGIN),
        )
    }

    fn in_play() -> (CoinGetter, Harness) {
        let (mut game, mut h) = setup();
        h.show(Landmark::LeftTop, new_region(0, 0, 10, 10));
        game.process(&mut h.automation, &Frame::blank(0)).unwrap();
        assert_eq!(game.state(), State::Play);
        h.take_events();
        (game, h)
    }

    fn counter_area(icon: Region) -> Region {
        new_region(icon.x + COUNTER_OFFSET_X, icon.y, COUNTER_WIDTH, COUNTER_HEIGHT)
    }

    fn print(h: &Harness, icon: Region, value: i64) {
        let screen = h.automation.window.to_screen(counter_area(icon));
        h.scene.borrow_mut().print(screen, value);
    }

    #[test]
    fn action_table_is_unique() {
        let (game, _) = setup();

        assert_eq!(game.action_size(), 10);
        for a in 0..game.action_size() {
            for b in (a + 1)..game.action_size() {
                assert_ne!(game.press(a), game.press(b));
            }
        }

        assert_eq!(game.press(0), Some(Press { key: None, units: 1 }));
        assert_eq!(game.press(5), Some(Press { key: Some(Key::Right), units: 2 }));
        assert_eq!(game.press(9), Some(Press { key: Some(Key::Left), units: 2 }));
    }

    #[test]
    fn held_key_is_not_pressed_twice() {
        let (mut game, mut h) = setup();

        game.play(&mut h.automation, 2).unwrap();
        game.play(&mut h.automation, 2).unwrap();
        game.play(&mut h.automation, 3).unwrap();
        assert_eq!(h.take_events(), vec![InputEvent::Key(Key::Up, Direction::Down)]);
        assert_eq!(game.held(), Some(Key::Up));

        game.play(&mut h.automation, 4).unwrap();
        assert_eq!(
            h.take_events(),
            vec![
                InputEvent::Key(Key::Up, Direction::Up),
                InputEvent::Key(Key::Right, Direction::Down),
            ]
        );

        game.play(&mut h.automation, 0).unwrap();
        game.play(&mut h.automation, 1).unwrap();
        assert_eq!(h.take_events(), vec![InputEvent::Key(Key::Right, Direction::Up)]);
        assert_eq!(game.held(), None);

        assert!(game.play(&mut h.automation, 10).is_err());
    }

    #[test]
    fn release_lets_go_and_forgets_the_key() {
        let (mut game, mut h) = setup();
        game.play(&mut h.automation, 4).unwrap();
        h.take_events();

        game.release(&mut h.automation).unwrap();
        game.release(&mut h.automation).unwrap();
        assert_eq!(h.take_events(), vec![InputEvent::Key(Key::Right, Direction::Up)]);
        assert_eq!(game.held(), None);

        game.play(&mut h.automation, 4).unwrap();
        assert_eq!(h.take_events(), vec![InputEvent::Key(Key::Right, Direction::Down)]);
    }

    #[test]
    fn coin_changes_are_rewarded() {
        let (mut game, mut h) = in_play();
        h.show(Landmark::Coin, COIN_ICON);
        print(&h, COIN_ICON, 5);

        let baseline = game.process(&mut h.automation, &Frame::blank(1)).unwrap();
        let same = game.process(&mut h.automation, &Frame::blank(2)).unwrap();
        print(&h, COIN_ICON, 6);
        let collected = game.process(&mut h.automation, &Frame::blank(3)).unwrap();

        assert_eq!(baseline, Observation::reward(-1., false));
        assert_eq!(same, Observation::reward(-1., false));
        assert_eq!(collected, Observation::reward(100., true));
    }

    #[test]
    fn unreadable_counters_give_nothing() {
        let (mut game, mut h) = in_play();
        h.show(Landmark::Coin, COIN_ICON);
        h.show(Landmark::Level, LEVEL_ICON);

        let observation = game.process(&mut h.automation, &Frame::blank(1)).unwrap();

        assert_eq!(observation, Observation::reward(0., false));
    }

    #[test]
    fn level_change_is_rewarded_once() {
        let (mut game, mut h) = in_play();
        h.show(Landmark::Level, LEVEL_ICON);
        print(&h, LEVEL_ICON, 1);

        let same = game.process(&mut h.automation, &Frame::blank(1)).unwrap();
        print(&h, LEVEL_ICON, 2);
        let up = game.process(&mut h.automation, &Frame::blank(2)).unwrap();
        let after = game.process(&mut h.automation, &Frame::blank(3)).unwrap();

        assert_eq!(same, Observation::reward(0., false));
        assert_eq!(up, Observation::reward(1000., true));
        assert_eq!(after, Observation::reward(0., false));
    }

    #[test]
    fn game_over_releases_key_and_ends_episode() {
        let (mut game, mut h) = in_play();
        game.play(&mut h.automation, 6).unwrap();
        h.take_events();
        h.show(Landmark::GameOver, new_region(200, 200, 40, 20));

        let observation = game.process(&mut h.automation, &Frame::blank(1)).unwrap();

        assert_eq!(observation, Observation::reward(-100., true));
        assert_eq!(game.state(), State::Result);
        assert_eq!(h.take_events(), vec![InputEvent::Key(Key::Down, Direction::Up)]);
    }

    #[test]
    fn levelup_banner_is_not_counted_twice() {
        let (mut game, mut h) = in_play();
        h.show(Landmark::Levelup, new_region(200, 200, 40, 20));

        let banner = game.process(&mut h.automation, &Frame::blank(1)).unwrap();
        assert_eq!(banner, Observation::reward(1000., true));
        assert_eq!(game.state(), State::Result);

        h.clear();
        h.show(Landmark::Restart, new_region(250, 300, 40, 20));
        game.process(&mut h.automation, &Frame::blank(2)).unwrap();
        assert_eq!(game.state(), State::Play);

        h.clear();
        h.show(Landmark::Level, LEVEL_ICON);
        print(&h, LEVEL_ICON, 2);
        let next = game.process(&mut h.automation, &Frame::blank(3)).unwrap();
        assert_eq!(next, Observation::reward(0., false));
    }

    #[test]
    fn title_clicks_start() {
        let (mut game, mut h) = setup();
        h.show(Landmark::Start, new_region(250, 300, 40, 20));

        let observation = game.process(&mut h.automation, &Frame::blank(0)).unwrap();

        assert_eq!(observation, Observation::none());
        assert_eq!(game.state(), State::Play);
        assert_eq!(
            h.take_events(),
            vec![
                InputEvent::Move(ORIGIN.0, ORIGIN.1),
                InputEvent::Click,
                InputEvent::Move(ORIGIN.0 + 270, ORIGIN.1 + 310),
                InputEvent::Click,
            ]
        );
    }

    #[test]
    fn restart_on_screen_means_result() {
        let (mut game, mut h) = in_play();
        h.show(Landmark::Restart, new_region(250, 300, 40, 20));

        assert_eq!(
            game.adjust_state(&mut h.automation, &Frame::blank(1)),
            Some(State::Result)
        );
    }

    #[test]
    fn detect_position_uses_title_offset() {
        let (mut game, mut h) = setup();
        h.scene
            .borrow_mut()
            .show(Landmark::Title, new_region(353, 149, 100, 30));

        assert_eq!(
            game.detect_position(&mut h.automation, &Frame::blank(0)),
            Some((200, 100))
        );
    }
}
