use anyhow::Result;
use rand::rngs::SmallRng;

use crate::{
    automation::{self, Automation},
    explore::Exploration,
    games::{Game, GameConfig},
    img::frame::Frame,
    input::InputDevice,
    roi::GameWindow,
    state::Observation,
    vision::Vision,
};

/// A game wired to the screen, in the shape learners expect: observe a frame,
/// pick an action, play it.
pub struct Environment {
    game: Box<dyn Game>,
    automation: Automation,
    exploration: Exploration,
    rng: SmallRng,
}

impl Environment {
    pub fn new(
        game: Box<dyn Game>,
        vision: Box<dyn Vision>,
        input: Box<dyn InputDevice>,
        config: &GameConfig,
    ) -> Environment {
        let (width, height) = game.window_size();
        let automation =
            automation::new(GameWindow::new(width, height), vision, input, config.delay_scale);

        Environment {
            game,
            automation,
            exploration: Exploration::new(config.policy),
            rng: config.rng(1),
        }
    }

    pub fn game_name(&self) -> &'static str {
        self.game.name()
    }

    pub fn state_name(&self) -> &'static str {
        self.game.state_name()
    }

    pub fn window(&self) -> GameWindow {
        self.automation.window
    }

    /// Locates the game window in `frame`. Leaves the window where it was on a miss.
    pub fn detect_position(&mut self, frame: &Frame) -> Option<(i32, i32)> {
        self.game.detect_position(&mut self.automation, frame)
    }

    pub fn process(&mut self, frame: &Frame) -> Result<Observation> {
        self.game.process(&mut self.automation, frame)
    }

    pub fn action_size(&self) -> usize {
        self.game.action_size()
    }

    pub fn play(&mut self, action: usize) -> Result<()> {
        self.game.play(&mut self.automation, action)
    }

    /// Lets go of whatever the game is holding down. Call before giving up the
    /// screen, or the press outlives the process.
    pub fn release(&mut self) -> Result<()> {
        self.game.release(&mut self.automation)
    }

    /// Applies the exploration policy to `action`.
    pub fn randomize_action(&mut self, action: usize, probability: f64) -> usize {
        let size = self.game.action_size();
        self.exploration
            .randomize(action, size, probability, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        explore::Policy,
        games::{self, SupportedGames},
        landmark::Landmark,
        roi::new_region,
        input::{Direction, Key},
        testing::{self, InputEvent, SharedEvents, SharedScene},
    };

    fn environment(kind: SupportedGames) -> (Environment, SharedScene, SharedEvents) {
        let config = GameConfig {
            delay_scale: 0.,
            seed: Some(9),
            policy: Policy::Walk,
            ..GameConfig::default()
        };
        let (vision, input, scene, events) = testing::collaborators();
        let env = Environment::new(
            games::new(kind, &config),
            Box::new(vision),
            Box::new(input),
            &config,
        );

        (env, scene, events)
    }

    #[test]
    fn action_size_matches_playable_range() {
        for kind in [SupportedGames::Homerun, SupportedGames::CoinGetter] {
            let (mut env, _scene, _events) = environment(kind);
            let size = env.action_size();

            for action in 0..size {
                env.play(action).unwrap();
            }
            assert!(env.play(size).is_err());

            for _ in 0..500 {
                assert!(env.randomize_action(0, 1.) < size);
            }
        }
    }

    #[test]
    fn detects_window_then_reports_observations() {
        let (mut env, scene, _events) = environment(SupportedGames::Homerun);
        scene
            .borrow_mut()
            .show(Landmark::Start, new_region(388, 352, 30, 15));

        assert_eq!(env.detect_position(&Frame::blank(0)), Some((100, 100)));
        assert_eq!(env.window().origin(), (100, 100));

        let observation = env.process(&Frame::blank(1)).unwrap();
        assert_eq!(observation, Observation::none());
        assert_eq!(env.state_name(), "title");
    }

    #[test]
    fn missing_window_keeps_previous_position() {
        let (mut env, _scene, _events) = environment(SupportedGames::CoinGetter);

        assert_eq!(env.detect_position(&Frame::blank(0)), None);
        assert_eq!(env.window().origin(), (0, 0));
        assert_eq!(env.game_name(), "coin getter");
    }

    #[test]
    fn release_lets_go_of_a_held_key() {
        let (mut env, _scene, events) = environment(SupportedGames::CoinGetter);

        env.play(6).unwrap();
        env.release().unwrap();
        env.release().unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                InputEvent::Key(Key::Down, Direction::Down),
                InputEvent::Key(Key::Down, Direction::Up),
            ]
        );
    }

    #[test]
    fn release_lifts_the_bat() {
        let (mut env, _scene, events) = environment(SupportedGames::Homerun);

        env.play(0).unwrap();
        events.borrow_mut().clear();
        env.release().unwrap();

        assert_eq!(*events.borrow(), vec![InputEvent::Button(Direction::Up)]);
    }
}
