use std::{fmt, thread};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flume::{bounded, Receiver, Sender, TrySendError};
use opencv::{
    core::Scalar,
    highgui::{imshow, poll_key},
    imgproc::rectangle,
};

use crate::{
    env::Environment,
    games,
    img::{self, frame::Frame},
    input,
    roi::Region,
    vision::{self, TemplateVision},
    Config,
};

/// Frames with the window outline to draw on them.
type PreviewFrame = (Frame, Region);

pub struct Pipeline {
    frame_receiver: Receiver<Frame>,
    /// Set while a preview thread is showing frames.
    preview_sender: Option<Sender<PreviewFrame>>,
    config: Config,
}

/// The pipeline and the sending end of its frame channel. The channel holds a
/// single frame so the player always works on a recent screen.
pub fn new(config: Config) -> (Pipeline, Sender<Frame>) {
    let (frame_sender, frame_receiver) = bounded::<Frame>(1);

    let pipe = Pipeline {
        frame_receiver,
        preview_sender: None,
        config,
    };

    (pipe, frame_sender)
}

/// Templates for the configured game, plus the digit recognizer when the
/// game reads counters.
pub fn make_vision(config: &Config) -> Result<TemplateVision> {
    let game = games::new(config.game, &config.game_config());
    let templates = img::load_templates(&config.images, game.landmarks())?;

    let recognizer = if game.reads_numbers() {
        match img::make_text_recognizer(&config.ocr_model, &config.ocr_vocabulary, config.ocr_cuda) {
            Ok(recognizer) => Some(recognizer),
            Err(error) => {
                warn!("no text recognizer, counters will read as empty: {:#}", error);
                None
            }
        }
    } else {
        None
    };

    Ok(vision::new(
        templates,
        config.threshold,
        recognizer,
        config.ocr_threshold,
    ))
}

/// Running totals for one episode, closed by a terminal observation.
#[derive(Clone, Debug)]
pub struct Episode {
    pub number: u64,
    pub steps: u64,
    pub reward: f64,
    pub started: DateTime<Utc>,
}

impl Episode {
    pub fn new(number: u64) -> Episode {
        Episode {
            number,
            steps: 0,
            reward: 0.,
            started: Utc::now(),
        }
    }

    pub fn record(&mut self, reward: f64) {
        self.steps += 1;
        self.reward += reward;
    }

    pub fn next(&self) -> Episode {
        Episode::new(self.number + 1)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub frames: u64,
    pub episodes: u64,
    pub total_reward: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames\t{} episodes\ttotal reward {}",
            self.frames, self.episodes, self.total_reward
        )
    }
}

impl Pipeline {
    /// Shows processed frames in a window. Like the frame channel, the preview
    /// holds one frame and skips the rest while the window is busy.
    pub fn start_preview_thread(&mut self) {
        let (sender, receiver) = bounded::<PreviewFrame>(1);
        self.preview_sender = Some(sender);

        thread::spawn(move || {
            while let Ok((frame, window)) = receiver.recv() {
                if let Err(error) = show_frame(frame, window) {
                    warn!("preview failed: {}", error);
                    break;
                }
            }
        });
    }

    /// Runs the player on its own thread until the frame channel closes or
    /// `max_frames` is reached.
    pub fn start_agent(self, vision: TemplateVision) -> thread::JoinHandle<Result<Summary>> {
        thread::spawn(move || self.run_agent(vision))
    }

    fn run_agent(mut self, vision: TemplateVision) -> Result<Summary> {
        let game_config = self.config.game_config();
        let mut env = Environment::new(
            games::new(self.config.game, &game_config),
            Box::new(vision),
            Box::new(input::new()?),
            &game_config,
        );

        let played = self.play_frames(&mut env);

        if let Err(error) = env.release() {
            warn!("releasing held input failed: {:#}", error);
        }

        played
    }

    fn play_frames(&mut self, env: &mut Environment) -> Result<Summary> {
        info!(
            "playing {} with {} actions",
            env.game_name(),
            env.action_size()
        );

        let mut summary = Summary::default();
        let mut located = false;
        let mut action = 0;
        let mut episode = Episode::new(1);

        let frames = self.frame_receiver.clone();
        for frame in frames.iter() {
            if let Some(max) = self.config.max_frames {
                if summary.frames >= max {
                    info!("reached {} frames", max);
                    break;
                }
            }

            if !located {
                match env.detect_position(&frame) {
                    Some((x, y)) => {
                        info!("frame {}\tgame window at {},{}", frame.num, x, y);
                        located = true;
                    }
                    None => {
                        debug!("frame {}\tgame window not found", frame.num);
                        continue;
                    }
                }
            }

            let observation = env.process(&frame)?;
            summary.frames += 1;

            self.preview(&frame, env.window().region());

            let reward = match observation.reward {
                Some(reward) => reward,
                None => {
                    trace!("frame {}\t{}", frame.num, env.state_name());
                    continue;
                }
            };

            episode.record(reward);
            summary.total_reward += reward;

            if observation.terminal {
                self.close_episode(&episode, &frame);
                summary.episodes += 1;
                episode = episode.next();
            }

            action = env.randomize_action(action, self.config.exploration);
            env.play(action)?;
        }

        Ok(summary)
    }

    fn preview(&mut self, frame: &Frame, window: Region) {
        let sender = match &self.preview_sender {
            Some(sender) => sender,
            None => return,
        };

        match sender.try_send((frame.clone(), window)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!("frame {}\tpreview busy, skipped", frame.num);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("preview window closed, no longer showing frames");
                self.preview_sender = None;
            }
        }
    }

    fn close_episode(&self, episode: &Episode, frame: &Frame) {
        let duration = frame.captured_at - episode.started;

        info!(
            "episode {}\treward {}\tsteps {}\tduration {}",
            episode.number,
            episode.reward,
            episode.steps,
            format!("{}ms", duration.num_milliseconds()),
        );

        if let Some(dir) = &self.config.dump_dir {
            let path = dir.join(format!("{:06}-episode-{}.png", frame.num, episode.number));
            match frame.dump(&path) {
                Ok(true) => debug!("frame {}\tdumped to {}", frame.num, path.display()),
                Ok(false) => warn!("frame {}\tnot written to {}", frame.num, path.display()),
                Err(error) => warn!("frame {}\tdump failed: {}", frame.num, error),
            }
        }
    }
}

fn show_frame(frame: Frame, window: Region) -> Result<()> {
    trace!("frame {}\tshowing frame", frame.num);

    let mut mat = frame.mat;
    rectangle(
        &mut mat,
        window.to_rect(),
        Scalar::new(0., 255., 0.0, 1.0),
        1,
        0,
        0,
    )
    .context("outlining game window")?;

    imshow("frames", &mat)?;
    poll_key()?;

    Ok(())
}
